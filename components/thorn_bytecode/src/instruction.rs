//! Decoded instruction representation
//!
//! Decoding turns the raw byte at the program counter into a canonical
//! [`Opcode`] and reads the operand bytes its table entry declares.

use crate::error::BytecodeError;
use crate::opcode::{lookup, Opcode, Operands};

/// A single decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Canonical opcode
    pub opcode: Opcode,
    /// First operand (0 when absent)
    pub arg1: usize,
    /// Second operand (0 when absent)
    pub arg2: usize,
    /// Byte offset of the instruction (of its `LongArg` prefix, if any)
    pub offset: usize,
    /// Byte offset of the following instruction
    pub next: usize,
    /// Operand shape of the raw encoding actually present
    pub operands: Operands,
}

impl Instruction {
    /// Decode the instruction starting at `offset`.
    ///
    /// A `LongArg` prefix is folded into the instruction it precedes: the
    /// prefix value shifted left by 16 bits is added to its first operand.
    /// At most one prefix is allowed, so `arg1` always fits in 32 bits.
    pub fn decode(code: &[u8], offset: usize) -> Result<Self, BytecodeError> {
        let first = Self::decode_single(code, offset)?;
        if first.opcode != Opcode::LongArg {
            return Ok(first);
        }
        let inst = Self::decode_single(code, first.next)?;
        if inst.opcode == Opcode::LongArg {
            return Err(BytecodeError::ChainedLongArg {
                offset: first.next,
            });
        }
        Ok(Instruction {
            arg1: inst.arg1 + (first.arg1 << 16),
            offset,
            ..inst
        })
    }

    fn decode_single(code: &[u8], offset: usize) -> Result<Self, BytecodeError> {
        let raw = *code.get(offset).ok_or(BytecodeError::Truncated { offset })?;
        let info = lookup(raw).ok_or(BytecodeError::UnknownOpcode {
            opcode: raw,
            offset,
        })?;
        let start = offset + 1;
        let operand_bytes = code
            .get(start..start + info.operands.width())
            .ok_or(BytecodeError::Truncated { offset: start })?;
        let word = |b: &[u8]| ((b[0] as usize) << 8) | b[1] as usize;
        let (arg1, arg2) = match info.operands {
            Operands::None => (0, 0),
            Operands::Byte => (operand_bytes[0] as usize, 0),
            Operands::ByteByte => (operand_bytes[0] as usize, operand_bytes[1] as usize),
            Operands::Word => (word(operand_bytes), 0),
            Operands::WordByte => (word(operand_bytes), operand_bytes[2] as usize),
        };
        Ok(Instruction {
            opcode: info.opcode,
            arg1,
            arg2,
            offset,
            next: start + info.operands.width(),
            operands: info.operands,
        })
    }

    /// Absolute target of a jump instruction, `None` for anything else.
    ///
    /// Offsets are relative to the byte following the instruction.
    pub fn jump_target(&self) -> Option<isize> {
        if self.opcode.is_forward_jump() {
            Some(self.next as isize + self.arg1 as isize)
        } else if self.opcode.is_backward_jump() {
            Some(self.next as isize - self.arg1 as isize)
        } else {
            None
        }
    }
}

/// Sequential decoder over a code body
///
/// Yields decoded instructions until the end of the code or the first error.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    code: &'a [u8],
    pc: usize,
    failed: bool,
}

impl<'a> Decoder<'a> {
    /// Start decoding `code` at `start`
    pub fn new(code: &'a [u8], start: usize) -> Self {
        Self {
            code,
            pc: start,
            failed: false,
        }
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<Instruction, BytecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.code.len() {
            return None;
        }
        match Instruction::decode(self.code, self.pc) {
            Ok(inst) => {
                self.pc = inst.next;
                Some(Ok(inst))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
