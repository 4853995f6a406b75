//! End-to-end CLI tests
//!
//! Chunk files on disk driven through argument parsing and the runner,
//! the way the `thorn` binary does it.

use std::fs;

use clap::Parser as ClapParser;
use tempfile::TempDir;
use thorn_bytecode::{Opcode, PrototypeBuilder};
use thorn_cli::{Cli, CliError, Runner};

fn run(args: &[&str]) -> Result<String, CliError> {
    let cli = Cli::try_parse_from(args).unwrap();
    let limits = cli.resolve_limits()?;
    Runner::new(limits)
        .with_builtins(!cli.no_builtins)
        .with_disassemble(cli.disassemble)
        .with_dump_globals(cli.dump_globals)
        .run_file(&cli.file)
}

/// `duration = 12.5; name = strupper("intro"); events = { 1, 2, 3 }`
fn write_scene(dir: &TempDir) -> String {
    let mut b = PrototypeBuilder::new(8, 0).with_source("intro.thn");
    let duration = b.string("duration");
    let half = b.number(12.5);
    let name = b.string("name");
    let upper = b.string("strupper");
    let intro = b.string("intro");
    let events = b.string("events");
    b.emit_arg(Opcode::PushConstant, half);
    b.emit_arg(Opcode::SetGlobal, duration);
    b.emit_arg(Opcode::GetGlobal, upper);
    b.emit_arg(Opcode::PushConstant, intro);
    b.emit_args(Opcode::Call, 1, 1);
    b.emit_arg(Opcode::SetGlobal, name);
    b.emit_arg(Opcode::CreateArray, 3);
    b.emit_arg(Opcode::PushNumber, 1);
    b.emit_arg(Opcode::PushNumber, 2);
    b.emit_arg(Opcode::PushNumber, 3);
    b.emit_args(Opcode::SetList, 0, 3);
    b.emit_arg(Opcode::SetGlobal, events);
    b.emit(Opcode::EndCode);

    let path = dir.path().join("intro.thn");
    fs::write(&path, b.build().to_bytes().unwrap()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_e2e_dump_globals() {
    let dir = TempDir::new().unwrap();
    let path = write_scene(&dir);
    let out = run(&["thorn", "--dump-globals", &path]).unwrap();
    assert_eq!(
        out,
        "duration = 12.5\nname = \"INTRO\"\nevents = { 1, 2, 3 }\n"
    );
}

#[test]
fn test_e2e_disassemble() {
    let dir = TempDir::new().unwrap();
    let path = write_scene(&dir);
    let out = run(&["thorn", "--disassemble", &path]).unwrap();
    assert!(out.starts_with("function <intro.thn:0> main"), "{}", out);
    assert!(out.contains("\"strupper\""), "{}", out);
}

#[test]
fn test_e2e_no_builtins_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_scene(&dir);
    let err = run(&["thorn", "--no-builtins", &path]).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("stack traceback:"), "{}", text);
}

#[test]
fn test_e2e_instruction_flag() {
    let dir = TempDir::new().unwrap();
    let path = write_scene(&dir);
    assert!(run(&["thorn", "--max-instructions", "13", &path]).is_ok());
    let err = run(&["thorn", "--max-instructions", "12", &path]).unwrap_err();
    assert!(err.to_string().contains("max instructions"), "{}", err);
}
