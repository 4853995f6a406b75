//! Human-readable listing of a prototype and its nested functions

use std::fmt::Write;

use crate::instruction::Instruction;
use crate::opcode::{Opcode, Operands};
use crate::prototype::{Constant, ParamShape, Prototype};

/// Render `proto` and every nested prototype as text
pub fn disassemble(proto: &Prototype) -> String {
    let mut out = String::new();
    write_function(&mut out, proto, "main");
    out
}

fn write_function(out: &mut String, proto: &Prototype, label: &str) {
    let params = match proto.param_shape() {
        Ok(ParamShape::Fixed(n)) => n.to_string(),
        Ok(ParamShape::Variadic(n)) => format!("{}+", n),
        Err(_) => String::from("?"),
    };
    let _ = writeln!(
        out,
        "function <{}:{}> {} (stack {}, params {}, {} bytes, {} constants)",
        proto.source,
        proto.line_defined,
        label,
        proto.stack_size().unwrap_or(0),
        params,
        proto.code.len(),
        proto.constants.len()
    );

    for inst in proto.instructions() {
        match inst {
            Ok(inst) => write_instruction(out, proto, &inst),
            Err(e) => {
                let _ = writeln!(out, "    <{}>", e);
                break;
            }
        }
    }

    for (index, constant) in proto.constants.iter().enumerate() {
        if let Constant::Prototype(nested) = constant {
            out.push('\n');
            write_function(out, nested, &format!("k{}", index));
        }
    }
}

fn write_instruction(out: &mut String, proto: &Prototype, inst: &Instruction) {
    let operands = match inst.operands {
        Operands::None => String::new(),
        Operands::Byte | Operands::Word => inst.arg1.to_string(),
        Operands::ByteByte | Operands::WordByte => format!("{} {}", inst.arg1, inst.arg2),
    };
    let _ = write!(out, "    {:>5}  {:<14}{:<10}", inst.offset, inst.opcode.mnemonic(), operands);

    if let Some(target) = inst.jump_target() {
        let _ = write!(out, "; to {}", target);
    } else if inst.opcode.uses_constant() {
        match proto.constant(inst.arg1) {
            Some(Constant::Number(n)) => {
                let _ = write!(out, "; {}", n);
            }
            Some(Constant::String(s)) => {
                let _ = write!(out, "; {:?}", s);
            }
            Some(Constant::Prototype(_)) => {
                let _ = write!(out, "; function k{}", inst.arg1);
            }
            None => out.push_str("; <bad constant>"),
        }
    } else if inst.opcode == Opcode::PushNumberNeg {
        let _ = write!(out, "; -{}", inst.arg1);
    }
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}
