//! Integration tests for the runtime
//!
//! Whole programs assembled with `PrototypeBuilder`, run through the host
//! entry points together with the standard library.

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use thorn_bytecode::{Opcode, Prototype, PrototypeBuilder, MULT_RET};
use thorn_types::{ErrorKind, ThornResult, Value};
use thorn_vm::{Compiler, Limits, Runtime};

/// `f(n)`: returns 0 when n == 0, otherwise f(n - 1)
fn countdown() -> Prototype {
    let mut f = PrototypeBuilder::new(4, 1)
        .with_source("countdown")
        .with_line_defined(1);
    let name = f.string("f");
    f.emit_arg(Opcode::PushLocal, 0);
    f.emit_arg(Opcode::PushNumber, 0);
    f.emit(Opcode::EqOp);
    let recurse = f.emit_jump(Opcode::IffJmp);
    f.emit_arg(Opcode::PushNumber, 0);
    f.emit_arg(Opcode::RetCode, 1);
    f.patch_jump(recurse);
    f.emit_arg(Opcode::GetGlobal, name);
    f.emit_arg(Opcode::PushLocal, 0);
    f.emit_arg(Opcode::PushNumber, 1);
    f.emit(Opcode::SubOp);
    f.emit_args(Opcode::Call, 1, 1);
    f.emit_arg(Opcode::RetCode, 1);
    f.build()
}

/// Main chunk that defines `f` and returns `f(n)`
fn countdown_program(n: usize) -> Rc<Prototype> {
    let mut b = PrototypeBuilder::new(4, 0).with_source("countdown");
    let f = b.function(countdown());
    let name = b.string("f");
    b.emit_args(Opcode::Closure, f, 0);
    b.emit_arg(Opcode::SetGlobal, name);
    b.emit_arg(Opcode::GetGlobal, name);
    b.emit_arg(Opcode::PushNumber, n);
    b.emit_args(Opcode::Call, 1, 1);
    b.emit_arg(Opcode::RetCode, 0);
    Rc::new(b.build())
}

#[test]
fn test_one_plus_two() {
    let mut b = PrototypeBuilder::new(2, 0);
    b.emit_arg(Opcode::PushNumber, 1);
    b.emit_arg(Opcode::PushNumber, 2);
    b.emit(Opcode::AddOp);
    b.emit_arg(Opcode::RetCode, 0);
    let result = Runtime::new().execute(Rc::new(b.build())).unwrap();
    assert_eq!(result, Value::from(3.0));
}

#[test]
fn test_map_literal_field() {
    // t = {x = 10, y = "a"}; return t.y
    let mut b = PrototypeBuilder::new(6, 0);
    let x = b.string("x");
    let y = b.string("y");
    let a = b.string("a");
    let t = b.string("t");
    b.emit_arg(Opcode::CreateArray, 2);
    b.emit_arg(Opcode::PushConstant, x);
    b.emit_arg(Opcode::PushNumber, 10);
    b.emit_arg(Opcode::PushConstant, y);
    b.emit_arg(Opcode::PushConstant, a);
    b.emit_arg(Opcode::SetMap, 1);
    b.emit_arg(Opcode::SetGlobal, t);
    b.emit_arg(Opcode::GetGlobal, t);
    b.emit_arg(Opcode::GetDotted, y);
    b.emit_arg(Opcode::RetCode, 0);

    let mut runtime = Runtime::new();
    assert_eq!(runtime.execute(Rc::new(b.build())).unwrap(), Value::from("a"));
    let table = runtime.globals.get("t").and_then(Value::as_table).cloned().unwrap();
    assert_eq!(table.borrow().get(&Value::from("x")).unwrap(), Value::from(10.0));
}

#[test]
fn test_globals_persist_between_invocations() {
    let mut runtime = Runtime::new();

    let mut set = PrototypeBuilder::new(2, 0);
    let k = set.string("counter");
    set.emit_arg(Opcode::PushNumber, 41);
    set.emit_arg(Opcode::SetGlobal, k);
    runtime.execute(Rc::new(set.build())).unwrap();

    let mut bump = PrototypeBuilder::new(2, 0);
    let k = bump.string("counter");
    bump.emit_arg(Opcode::GetGlobal, k);
    bump.emit_arg(Opcode::PushNumber, 1);
    bump.emit(Opcode::AddOp);
    bump.emit_arg(Opcode::RetCode, 0);
    assert_eq!(runtime.execute(Rc::new(bump.build())).unwrap(), Value::from(42.0));
}

#[test]
fn test_env_binding_is_not_overwritten_by_script() {
    let mut runtime = Runtime::new();
    runtime.env.insert("x".to_string(), Value::from(1.0));

    // x = 2; return x
    let mut b = PrototypeBuilder::new(2, 0);
    let k = b.string("x");
    b.emit_arg(Opcode::PushNumber, 2);
    b.emit_arg(Opcode::SetGlobal, k);
    b.emit_arg(Opcode::GetGlobal, k);
    b.emit_arg(Opcode::RetCode, 0);

    assert_eq!(runtime.execute(Rc::new(b.build())).unwrap(), Value::from(1.0));
    assert_eq!(runtime.globals.get("x"), Some(&Value::from(2.0)));
}

#[test]
fn test_infinite_loop_hits_instruction_limit() {
    let mut b = PrototypeBuilder::new(2, 0);
    let top = b.position();
    b.emit_arg(Opcode::PushNumber, 1);
    b.emit_jump_back(Opcode::IftUpJmp, top);

    let mut runtime = Runtime::new().with_limits(Limits {
        max_instructions: 1000,
        ..Limits::default()
    });
    let err = runtime.execute(Rc::new(b.build())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitsExceeded);
    assert!(err.message.contains("1000"), "{}", err.message);
}

#[test]
fn test_default_instruction_limit() {
    let mut b = PrototypeBuilder::new(2, 0);
    let top = b.position();
    b.emit_arg(Opcode::PushNumber, 1);
    b.emit_jump_back(Opcode::IftUpJmp, top);
    let err = Runtime::new().execute(Rc::new(b.build())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitsExceeded);
}

#[test]
fn test_recursion_within_depth_limit() {
    // main is depth 1, f(n) reaches depth n + 2
    let mut runtime = Runtime::new();
    assert_eq!(runtime.execute(countdown_program(23)).unwrap(), Value::from(0.0));
}

#[test]
fn test_recursion_past_depth_limit() {
    let mut runtime = Runtime::new();
    let err = runtime.execute(countdown_program(24)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitsExceeded);
    // every active script frame is recorded
    assert_eq!(err.stack.len(), 25);

    // the runtime is still usable afterwards
    assert_eq!(runtime.execute(countdown_program(3)).unwrap(), Value::from(0.0));
}

#[test]
fn test_unbounded_recursion_hits_depth_limit() {
    // function f() return f() end
    let mut f = PrototypeBuilder::new(2, 0).with_line_defined(1);
    let name = f.string("f");
    f.emit_arg(Opcode::GetGlobal, name);
    f.emit_args(Opcode::TailCall, 0, 0);

    let mut b = PrototypeBuilder::new(2, 0);
    let k = b.function(f.build());
    let name = b.string("f");
    b.emit_args(Opcode::Closure, k, 0);
    b.emit_arg(Opcode::SetGlobal, name);
    b.emit_arg(Opcode::GetGlobal, name);
    b.emit_args(Opcode::Call, 1, 0);
    b.emit_arg(Opcode::RetCode, 0);

    let err = Runtime::new().execute(Rc::new(b.build())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitsExceeded);
}

#[test]
fn test_call_function_gets_fresh_budget() {
    let mut runtime = Runtime::new().with_limits(Limits {
        max_instructions: 200,
        ..Limits::default()
    });
    runtime.execute(countdown_program(0)).unwrap();
    let f = runtime.get_global("f");
    // each call to countdown(10) stays well under 200 instructions
    for _ in 0..5 {
        let result = runtime.call_function(&f, vec![Value::from(10.0)]).unwrap();
        assert_eq!(result, Value::from(0.0));
    }
    // a single call that needs more than the budget still fails
    let err = runtime.call_function(&f, vec![Value::from(20.0)]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitsExceeded);
}

#[test]
fn test_call_function_depth_starts_at_one() {
    let mut runtime = Runtime::new();
    runtime.execute(countdown_program(0)).unwrap();
    let f = runtime.get_global("f");
    assert!(runtime.call_function(&f, vec![Value::from(24.0)]).is_ok());
    let err = runtime.call_function(&f, vec![Value::from(25.0)]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitsExceeded);
}

#[test]
fn test_upvalues_capture_by_value() {
    // local n = 5; f = function() return %n end; n = 6; return f()
    let mut inner = PrototypeBuilder::new(2, 0).with_line_defined(1);
    inner.emit_arg(Opcode::PushUpValue, 0);
    inner.emit_arg(Opcode::RetCode, 0);

    let mut b = PrototypeBuilder::new(4, 0);
    let k = b.function(inner.build());
    let f = b.string("f");
    b.emit_arg(Opcode::PushNumber, 5);
    b.emit_arg(Opcode::PushLocal, 0);
    b.emit_args(Opcode::Closure, k, 1);
    b.emit_arg(Opcode::SetGlobal, f);
    b.emit_arg(Opcode::PushNumber, 6);
    b.emit_arg(Opcode::SetLocal, 0);
    b.emit_arg(Opcode::GetGlobal, f);
    b.emit_args(Opcode::Call, 1, 0);
    b.emit_arg(Opcode::RetCode, 1);

    let result = Runtime::new().execute(Rc::new(b.build())).unwrap();
    assert_eq!(result, Value::from(5.0));
}

#[test]
fn test_error_traceback_lists_frames() {
    // line 5: function g() line 6: return nil + 1 end
    let mut g = PrototypeBuilder::new(2, 0)
        .with_source("mission")
        .with_line_defined(5);
    g.emit_arg(Opcode::SetLine, 6);
    g.emit_arg(Opcode::PushNil, 0);
    g.emit_arg(Opcode::PushNumber, 1);
    g.emit(Opcode::AddOp);
    g.emit_arg(Opcode::RetCode, 0);

    let mut b = PrototypeBuilder::new(2, 0).with_source("mission");
    let k = b.function(g.build());
    b.emit_arg(Opcode::SetLine, 2);
    b.emit_args(Opcode::Closure, k, 0);
    b.emit_args(Opcode::Call, 0, 0);
    b.emit(Opcode::EndCode);

    let err = Runtime::new().execute(Rc::new(b.build())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCast);
    assert_eq!(err.stack.len(), 2);
    assert_eq!(err.stack[0].line_defined, 5);
    assert_eq!(err.stack[0].line, 6);
    assert_eq!(err.stack[1].line_defined, 0);
    assert_eq!(err.stack[1].line, 2);

    let text = err.traceback();
    assert!(text.contains("in function <mission:5>"), "{}", text);
    assert!(text.contains("mission:2: in main chunk"), "{}", text);
}

#[test]
fn test_host_error_propagates_from_native() {
    let mut runtime = Runtime::new();
    runtime.register_native("fail", |_| {
        Err(thorn_types::ThornError::type_error("host refused"))
    });
    let mut b = PrototypeBuilder::new(2, 0);
    let k = b.string("fail");
    b.emit_arg(Opcode::GetGlobal, k);
    b.emit_args(Opcode::Call, 0, 0);
    b.emit(Opcode::EndCode);

    let err = runtime.execute(Rc::new(b.build())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.message, "host refused");
    assert_eq!(err.stack.len(), 1);
}

#[test]
fn test_print_goes_to_stdout_callback() {
    let captured = Rc::new(RefCell::new(String::new()));
    let sink = captured.clone();
    let mut runtime = Runtime::new();
    runtime.set_builtins();
    runtime.on_stdout(move |text| sink.borrow_mut().push_str(text));

    let mut b = PrototypeBuilder::new(4, 0);
    let print = b.string("print");
    let hi = b.string("hi");
    b.emit_arg(Opcode::GetGlobal, print);
    b.emit_arg(Opcode::PushConstant, hi);
    b.emit_arg(Opcode::PushNumber, 3);
    b.emit_args(Opcode::Call, 0, 2);
    b.emit(Opcode::EndCode);

    runtime.execute(Rc::new(b.build())).unwrap();
    assert_eq!(*captured.borrow(), "hi\t3\n");
}

#[test]
fn test_builtins_reachable_from_script() {
    // return strupper(strsub("thorn", 2, 3))
    let mut runtime = Runtime::new();
    runtime.set_builtins();

    let mut b = PrototypeBuilder::new(6, 0);
    let upper = b.string("strupper");
    let sub = b.string("strsub");
    let word = b.string("thorn");
    b.emit_arg(Opcode::GetGlobal, upper);
    b.emit_arg(Opcode::GetGlobal, sub);
    b.emit_arg(Opcode::PushConstant, word);
    b.emit_arg(Opcode::PushNumber, 2);
    b.emit_arg(Opcode::PushNumber, 3);
    b.emit_args(Opcode::Call, MULT_RET, 3);
    b.emit_args(Opcode::Call, 1, 1);
    b.emit_arg(Opcode::RetCode, 0);

    assert_eq!(runtime.execute(Rc::new(b.build())).unwrap(), Value::from("HO"));
}

#[test]
fn test_seeded_runs_are_deterministic() {
    // randomseed(7); return random(100), random(100)
    let program = || {
        let mut b = PrototypeBuilder::new(6, 0);
        let seed = b.string("randomseed");
        let random = b.string("random");
        b.emit_arg(Opcode::GetGlobal, seed);
        b.emit_arg(Opcode::PushNumber, 7);
        b.emit_args(Opcode::Call, 0, 1);
        for _ in 0..2 {
            b.emit_arg(Opcode::GetGlobal, random);
            b.emit_arg(Opcode::PushNumber, 100);
            b.emit_args(Opcode::Call, 1, 1);
        }
        b.emit_arg(Opcode::RetCode, 0);
        Rc::new(b.build())
    };
    let run = || {
        let mut runtime = Runtime::new();
        runtime.set_builtins();
        runtime.execute(program()).unwrap()
    };
    assert_eq!(run(), run());
}

struct EchoCompiler;

impl Compiler for EchoCompiler {
    // every source compiles to `return <source text>`
    fn compile(&self, source: &str, name: &str) -> ThornResult<Vec<u8>> {
        let mut b = PrototypeBuilder::new(2, 0).with_source(name);
        let k = b.string(source);
        b.emit_arg(Opcode::PushConstant, k);
        b.emit_arg(Opcode::RetCode, 0);
        Ok(b.build().to_bytes()?)
    }
}

#[test]
fn test_do_stream_binary_chunk() {
    let mut b = PrototypeBuilder::new(2, 0);
    b.emit_arg(Opcode::PushNumber, 12);
    b.emit_arg(Opcode::RetCode, 0);
    let bytes = b.build().to_bytes().unwrap();

    let mut runtime = Runtime::new();
    let result = runtime.do_stream(Cursor::new(bytes), "chunk").unwrap();
    assert_eq!(result, Value::from(12.0));
}

#[test]
fn test_do_stream_source_uses_compiler() {
    let mut runtime = Runtime::new().with_compiler(Box::new(EchoCompiler));
    let result = runtime.do_stream(Cursor::new("print(1)"), "script").unwrap();
    assert_eq!(result, Value::from("print(1)"));
    let result = runtime.do_string("x = 1", "inline").unwrap();
    assert_eq!(result, Value::from("x = 1"));
}

#[test]
fn test_do_stream_source_without_compiler() {
    let mut runtime = Runtime::new();
    let err = runtime.do_stream(Cursor::new("print(1)"), "script").unwrap_err();
    assert_eq!(err.kind, ErrorKind::CompileError);
}

#[test]
fn test_do_bytes_rejects_truncated_chunk() {
    let mut b = PrototypeBuilder::new(2, 0);
    b.emit_arg(Opcode::PushNumber, 12);
    b.emit_arg(Opcode::RetCode, 0);
    let bytes = b.build().to_bytes().unwrap();

    let err = Runtime::new()
        .do_bytes(&bytes[..bytes.len() - 3], "chunk")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::VmFault);
}
