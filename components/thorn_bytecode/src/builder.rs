//! Prototype assembler
//!
//! Hosts and tests use [`PrototypeBuilder`] to produce bytecode without a
//! compiler. The builder picks the narrow or wide encoding of each opcode
//! from the operand value and emits `LongArg` prefixes when needed.

use std::rc::Rc;

use crate::opcode::{Opcode, Operands, ZERO_VARARG};
use crate::prototype::{Constant, LocalVar, Prototype};

/// Placeholder for a forward jump whose target is not known yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a forward jump must be patched"]
pub struct JumpLabel {
    operand_at: usize,
}

/// Incremental builder for a [`Prototype`]
///
/// # Panics
///
/// The `emit*` methods panic when asked for an encoding that does not
/// exist (an operand on an opcode that takes none, a second operand above
/// 255, a narrow-only opcode with an operand above 255). These are
/// assembler programming errors, not runtime conditions.
#[derive(Debug, Clone)]
pub struct PrototypeBuilder {
    code: Vec<u8>,
    constants: Vec<Constant>,
    source: String,
    line_defined: u32,
    locals: Vec<LocalVar>,
}

impl PrototypeBuilder {
    /// Start a function with a fixed parameter count
    pub fn new(stack_size: u8, params: u8) -> Self {
        assert!(params < ZERO_VARARG, "fixed parameter count must be below 64");
        Self {
            code: vec![stack_size, params],
            constants: Vec::new(),
            source: String::from("?"),
            line_defined: 0,
            locals: Vec::new(),
        }
    }

    /// Start a variadic function with `fixed` named parameters
    pub fn variadic(stack_size: u8, fixed: u8) -> Self {
        let mut builder = Self::new(stack_size, 0);
        builder.code[1] = ZERO_VARARG + fixed;
        builder
    }

    /// Set the chunk name
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the definition line
    pub fn with_line_defined(mut self, line: u32) -> Self {
        self.line_defined = line;
        self
    }

    /// Record a local variable name
    pub fn add_local(&mut self, name: impl Into<String>, line: u32) {
        self.locals.push(LocalVar {
            name: name.into(),
            line,
        });
    }

    /// Add a constant and return its index
    pub fn add_constant(&mut self, constant: Constant) -> usize {
        self.constants.push(constant);
        self.constants.len() - 1
    }

    /// Index of a string constant, reusing an existing entry
    pub fn string(&mut self, s: &str) -> usize {
        let existing = self
            .constants
            .iter()
            .position(|c| c.as_str().map(|v| &**v == s).unwrap_or(false));
        match existing {
            Some(idx) => idx,
            None => self.add_constant(Constant::String(Rc::from(s))),
        }
    }

    /// Index of a number constant, reusing an existing entry
    pub fn number(&mut self, n: f64) -> usize {
        let existing = self
            .constants
            .iter()
            .position(|c| matches!(c, Constant::Number(v) if v.to_bits() == n.to_bits()));
        match existing {
            Some(idx) => idx,
            None => self.add_constant(Constant::Number(n)),
        }
    }

    /// Add a nested function and return its constant index
    pub fn function(&mut self, proto: Prototype) -> usize {
        self.add_constant(Constant::Prototype(Rc::new(proto)))
    }

    /// Current byte offset (where the next instruction goes)
    pub fn position(&self) -> usize {
        self.code.len()
    }

    /// Emit an opcode without operands
    pub fn emit(&mut self, op: Opcode) -> &mut Self {
        let encodings = op.encodings();
        let raw = encodings
            .narrow
            .filter(|_| encodings.wide.is_none())
            .unwrap_or_else(|| panic!("{} takes an operand", op));
        assert_eq!(
            crate::opcode::OPCODE_TABLE[raw as usize].operands,
            Operands::None,
            "{} takes an operand",
            op
        );
        self.code.push(raw);
        self
    }

    /// Emit an opcode with one operand
    pub fn emit_arg(&mut self, op: Opcode, a: usize) -> &mut Self {
        self.emit_first(op, a);
        self
    }

    /// Emit an opcode with two operands
    pub fn emit_args(&mut self, op: Opcode, a: usize, b: usize) -> &mut Self {
        assert!(b <= u8::MAX as usize, "second operand of {} exceeds 255", op);
        self.emit_first(op, a);
        self.code.push(b as u8);
        self
    }

    /// Emit the wide form of a forward jump with a placeholder offset
    pub fn emit_jump(&mut self, op: Opcode) -> JumpLabel {
        assert!(op.is_forward_jump(), "{} is not a forward jump", op);
        let raw = op.encodings().wide.unwrap_or_else(|| unreachable!());
        self.code.push(raw);
        let operand_at = self.code.len();
        self.code.extend_from_slice(&[0, 0]);
        JumpLabel { operand_at }
    }

    /// Point a forward jump at the current position
    pub fn patch_jump(&mut self, label: JumpLabel) {
        let offset = self.code.len() - (label.operand_at + 2);
        assert!(offset <= u16::MAX as usize, "forward jump too long");
        self.code[label.operand_at] = (offset >> 8) as u8;
        self.code[label.operand_at + 1] = offset as u8;
    }

    /// Emit a backward jump to an earlier instruction offset
    pub fn emit_jump_back(&mut self, op: Opcode, target: usize) -> &mut Self {
        assert!(op.is_backward_jump(), "{} is not a backward jump", op);
        let encodings = op.encodings();
        let pos = self.code.len();
        let narrow_offset = pos + 2 - target;
        match encodings.narrow {
            Some(raw) if narrow_offset <= u8::MAX as usize => {
                self.code.push(raw);
                self.code.push(narrow_offset as u8);
            }
            _ => {
                let offset = pos + 3 - target;
                assert!(offset <= u16::MAX as usize, "backward jump too long");
                let raw = encodings.wide.unwrap_or_else(|| unreachable!());
                self.code.push(raw);
                self.code.push((offset >> 8) as u8);
                self.code.push(offset as u8);
            }
        }
        self
    }

    fn emit_first(&mut self, op: Opcode, a: usize) {
        assert!(a <= u32::MAX as usize, "operand {} of {} exceeds 32 bits", a, op);
        let high = a >> 16;
        let low = a & 0xFFFF;
        if high > 0 {
            self.emit_first(Opcode::LongArg, high);
        }
        let encodings = op.encodings();
        match (encodings.narrow, encodings.wide) {
            (Some(raw), _) if low <= u8::MAX as usize && self.has_operand(raw) => {
                self.code.push(raw);
                self.code.push(low as u8);
            }
            (_, Some(raw)) => {
                self.code.push(raw);
                self.code.push((low >> 8) as u8);
                self.code.push(low as u8);
            }
            _ => panic!("{} cannot encode operand {}", op, a),
        }
    }

    fn has_operand(&self, raw: u8) -> bool {
        crate::opcode::OPCODE_TABLE[raw as usize].operands != Operands::None
    }

    /// Finish the prototype
    pub fn build(self) -> Prototype {
        Prototype {
            code: self.code,
            constants: self.constants,
            source: self.source,
            line_defined: self.line_defined,
            locals: self.locals,
        }
    }
}
