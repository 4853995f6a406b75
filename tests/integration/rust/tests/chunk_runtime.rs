//! Chunk serialization to runtime integration tests
//!
//! Programs are assembled, written to the binary chunk format, loaded back
//! and run, so every test crosses the bytecode/VM boundary.

use thorn_bytecode::{disassemble, Opcode, Prototype, PrototypeBuilder};
use thorn_types::{ErrorKind, Value};
use thorn_vm::Runtime;

/// `function add(a, b) return a + b end; return add(40, 2)`
fn adder() -> Prototype {
    let mut add = PrototypeBuilder::new(4, 2)
        .with_source("adder")
        .with_line_defined(1);
    add.emit_arg(Opcode::PushLocal, 0);
    add.emit_arg(Opcode::PushLocal, 1);
    add.emit(Opcode::AddOp);
    add.emit_arg(Opcode::RetCode, 2);

    let mut main = PrototypeBuilder::new(4, 0).with_source("adder");
    let f = main.function(add.build());
    let name = main.string("add");
    main.emit_args(Opcode::Closure, f, 0);
    main.emit_arg(Opcode::SetGlobal, name);
    main.emit_arg(Opcode::GetGlobal, name);
    main.emit_arg(Opcode::PushNumber, 40);
    main.emit_arg(Opcode::PushNumber, 2);
    main.emit_args(Opcode::Call, 1, 2);
    main.emit_arg(Opcode::RetCode, 0);
    main.build()
}

/// Test: nested functions survive a serialization round trip
#[test]
fn test_nested_function_from_bytes() {
    let bytes = adder().to_bytes().unwrap();
    let mut runtime = Runtime::new();
    let result = runtime.do_bytes(&bytes, "adder").unwrap();
    assert_eq!(result, Value::from(42.0));
    assert!(runtime.globals.get("add").is_some_and(Value::is_callable));
}

/// Test: a loaded function can be called again from the host
#[test]
fn test_call_loaded_function_from_host() {
    let mut runtime = Runtime::new();
    runtime.do_bytes(&adder().to_bytes().unwrap(), "adder").unwrap();
    let add = runtime.get_global("add");
    let result = runtime
        .call_function(&add, vec![Value::from("1.5"), Value::from(2.0)])
        .unwrap();
    assert_eq!(result, Value::from(3.5));
}

/// Test: the loaded chunk disassembles with its nested function
#[test]
fn test_disassemble_loaded_chunk() {
    let loaded = Prototype::from_bytes(&adder().to_bytes().unwrap()).unwrap();
    let listing = disassemble(&loaded);
    assert!(listing.contains("CLOSURE"), "{}", listing);
    assert!(listing.contains("ADDOP"), "{}", listing);
    assert!(listing.contains("\"add\""), "{}", listing);
}

/// Test: verification rejects a global access through a number constant
#[test]
fn test_verify_rejects_wrong_constant_kind() {
    let mut b = PrototypeBuilder::new(2, 0);
    let k = b.number(1.0);
    b.emit_arg(Opcode::GetGlobal, k);
    b.emit_arg(Opcode::RetCode, 0);
    let bytes = b.build().to_bytes().unwrap();

    let err = Runtime::new().do_bytes(&bytes, "bad").unwrap_err();
    assert_eq!(err.kind, ErrorKind::VmFault);
}

/// Test: verification rejects a jump into the middle of an instruction
#[test]
fn test_verify_rejects_misaligned_jump() {
    // JMP +1 lands inside the two-byte PUSHNUMBER
    let proto = Prototype::new(vec![2, 0, 50, 1, 7, 3, 1, 0], vec![]);
    let err = Runtime::new().do_bytes(&proto.to_bytes().unwrap(), "bad").unwrap_err();
    assert_eq!(err.kind, ErrorKind::VmFault);
}

/// Test: a chunk with an unknown version is refused
#[test]
fn test_unsupported_version() {
    let mut bytes = adder().to_bytes().unwrap();
    bytes[4] = 0x40;
    let err = Runtime::new().do_bytes(&bytes, "adder").unwrap_err();
    assert_eq!(err.kind, ErrorKind::VmFault);
    assert!(err.message.contains("version"), "{}", err.message);
}

/// Test: the same chunk run twice in separate runtimes gives the same result
#[test]
fn test_runs_are_independent() {
    let bytes = adder().to_bytes().unwrap();
    let mut first = Runtime::new();
    let mut second = Runtime::new();
    assert_eq!(
        first.do_bytes(&bytes, "adder").unwrap(),
        second.do_bytes(&bytes, "adder").unwrap()
    );
    first.set_global("add", Value::Nil);
    assert!(second.get_global("add").is_callable());
}
