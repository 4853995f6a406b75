//! Host bridge integration tests
//!
//! The host seeds `env`, registers natives and reads back what scripts
//! leave in `globals`, with the standard library installed.

use std::cell::RefCell;
use std::rc::Rc;

use integration_tests::capturing_runtime;
use thorn_bytecode::{Opcode, PrototypeBuilder};
use thorn_types::{ErrorKind, Value};
use thorn_vm::Runtime;

/// Test: a scene description built from host constants
#[test]
fn test_script_builds_scene_from_env_constants() {
    let mut runtime = Runtime::new();
    runtime.env.insert("CAMERA".to_string(), Value::from(3.0));

    // entities = { { type = CAMERA, name = "cam" } }
    let mut b = PrototypeBuilder::new(8, 0).with_source("scene.thn");
    let entities = b.string("entities");
    let type_key = b.string("type");
    let camera = b.string("CAMERA");
    let name_key = b.string("name");
    let cam = b.string("cam");
    b.emit_arg(Opcode::CreateArray, 1);
    b.emit_arg(Opcode::CreateArray, 2);
    b.emit_arg(Opcode::PushConstant, type_key);
    b.emit_arg(Opcode::GetGlobal, camera);
    b.emit_arg(Opcode::PushConstant, name_key);
    b.emit_arg(Opcode::PushConstant, cam);
    b.emit_arg(Opcode::SetMap, 1);
    b.emit_args(Opcode::SetList, 0, 1);
    b.emit_arg(Opcode::SetGlobal, entities);
    b.emit(Opcode::EndCode);
    runtime.do_bytes(&b.build().to_bytes().unwrap(), "scene.thn").unwrap();

    let entities = runtime.globals.get("entities").and_then(Value::as_table).cloned().unwrap();
    let first = entities.borrow().get_index(1);
    let entity = first.as_table().unwrap().borrow();
    assert_eq!(entity.get_field("type"), Value::from(3.0));
    assert_eq!(entity.get_field("name"), Value::from("cam"));
    assert!(runtime.globals.get("CAMERA").is_none());
}

/// Test: a native receives the table a script passes it
#[test]
fn test_native_receives_script_table() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let mut runtime = Runtime::new();
    runtime.register_native("spawn", move |args| {
        let name = args
            .first()
            .and_then(Value::as_table)
            .map(|t| t.borrow().get_field("name"))
            .unwrap_or_default();
        log.borrow_mut().push(name.to_string());
        Ok(Value::from(1.0))
    });

    // return spawn({ name = "ship" })
    let mut b = PrototypeBuilder::new(6, 0);
    let spawn = b.string("spawn");
    let name_key = b.string("name");
    let ship = b.string("ship");
    b.emit_arg(Opcode::GetGlobal, spawn);
    b.emit_arg(Opcode::CreateArray, 1);
    b.emit_arg(Opcode::PushConstant, name_key);
    b.emit_arg(Opcode::PushConstant, ship);
    b.emit_arg(Opcode::SetMap, 0);
    b.emit_args(Opcode::Call, 1, 1);
    b.emit_arg(Opcode::RetCode, 0);

    let result = runtime.do_bytes(&b.build().to_bytes().unwrap(), "spawn").unwrap();
    assert_eq!(result, Value::from(1.0));
    assert_eq!(*seen.borrow(), vec!["ship".to_string()]);
}

/// Test: `format` through the interpreter
#[test]
fn test_format_from_script() {
    let (mut runtime, _) = capturing_runtime();
    let mut b = PrototypeBuilder::new(6, 0);
    let format = b.string("format");
    let template = b.string("%s=%d");
    let x = b.string("x");
    b.emit_arg(Opcode::GetGlobal, format);
    b.emit_arg(Opcode::PushConstant, template);
    b.emit_arg(Opcode::PushConstant, x);
    b.emit_arg(Opcode::PushNumber, 4);
    b.emit_args(Opcode::Call, 1, 3);
    b.emit_arg(Opcode::RetCode, 0);

    let result = runtime.do_bytes(&b.build().to_bytes().unwrap(), "fmt").unwrap();
    assert_eq!(result, Value::from("x=4"));
}

/// Test: table library functions mutate script tables
#[test]
fn test_tinsert_and_getn() {
    // t = {}; tinsert(t, 5); tinsert(t, 6); return getn(t)
    let (mut runtime, _) = capturing_runtime();
    let mut b = PrototypeBuilder::new(6, 0);
    let t = b.string("t");
    let tinsert = b.string("tinsert");
    let getn = b.string("getn");
    b.emit_arg(Opcode::CreateArray, 0);
    b.emit_arg(Opcode::SetGlobal, t);
    for value in [5, 6] {
        b.emit_arg(Opcode::GetGlobal, tinsert);
        b.emit_arg(Opcode::GetGlobal, t);
        b.emit_arg(Opcode::PushNumber, value);
        b.emit_args(Opcode::Call, 0, 2);
    }
    b.emit_arg(Opcode::GetGlobal, getn);
    b.emit_arg(Opcode::GetGlobal, t);
    b.emit_args(Opcode::Call, 1, 1);
    b.emit_arg(Opcode::RetCode, 0);

    let result = runtime.do_bytes(&b.build().to_bytes().unwrap(), "tables").unwrap();
    assert_eq!(result, Value::from(2.0));
}

/// Test: print output stays with the runtime that produced it
#[test]
fn test_output_isolated_between_runtimes() {
    let program = |text: &str| {
        let mut b = PrototypeBuilder::new(4, 0);
        let print = b.string("print");
        let k = b.string(text);
        b.emit_arg(Opcode::GetGlobal, print);
        b.emit_arg(Opcode::PushConstant, k);
        b.emit_args(Opcode::Call, 0, 1);
        b.emit(Opcode::EndCode);
        b.build().to_bytes().unwrap()
    };
    let (mut first, first_out) = capturing_runtime();
    let (mut second, second_out) = capturing_runtime();
    first.do_bytes(&program("one"), "a").unwrap();
    second.do_bytes(&program("two"), "b").unwrap();
    assert_eq!(*first_out.borrow(), "one\n");
    assert_eq!(*second_out.borrow(), "two\n");
}

/// Test: a library error carries the calling frame
#[test]
fn test_builtin_error_has_traceback() {
    let (mut runtime, _) = capturing_runtime();
    let mut b = PrototypeBuilder::new(4, 0).with_source("math.thn");
    let sqrt = b.string("sqrt");
    let bad = b.string("x");
    b.emit_arg(Opcode::SetLine, 4);
    b.emit_arg(Opcode::GetGlobal, sqrt);
    b.emit_arg(Opcode::PushConstant, bad);
    b.emit_args(Opcode::Call, 1, 1);
    b.emit_arg(Opcode::RetCode, 0);

    let err = runtime.do_bytes(&b.build().to_bytes().unwrap(), "math.thn").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(
        err.message,
        "bad argument #1 to 'sqrt' (number expected, got string)"
    );
    assert_eq!(err.stack.len(), 1);
    assert_eq!(err.stack[0].line, 4);
    assert_eq!(err.stack[0].source, "math.thn");
}
