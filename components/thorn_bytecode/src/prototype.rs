//! Compiled function prototypes
//!
//! A [`Prototype`] is the immutable output of the compiler: a code body, a
//! constant pool and some debug information. Prototypes are shared by
//! reference between every closure built from them.

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::BytecodeError;
use crate::instruction::{Decoder, Instruction};
use crate::opcode::{Opcode, ZERO_VARARG};

/// Byte offset of the first instruction; bytes 0 and 1 are the preamble.
pub const CODE_START: usize = 2;

/// Deepest chain of nested function constants accepted by the loader and
/// by [`Prototype::verify`].
pub const MAX_NESTING: usize = 200;

/// Constant pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Numeric literal
    Number(f64),
    /// String literal, also used for global and field names
    String(Rc<str>),
    /// Nested function
    Prototype(Rc<Prototype>),
}

impl Constant {
    /// Kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Constant::Number(_) => "number",
            Constant::String(_) => "string",
            Constant::Prototype(_) => "function",
        }
    }

    /// The string payload, if this is a string constant
    pub fn as_str(&self) -> Option<&Rc<str>> {
        match self {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }

    /// The nested prototype, if this is a function constant
    pub fn as_prototype(&self) -> Option<&Rc<Prototype>> {
        match self {
            Constant::Prototype(p) => Some(p),
            _ => None,
        }
    }
}

/// Local variable debug record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
    /// Variable name
    pub name: String,
    /// Line where the variable comes into scope
    pub line: u32,
}

/// How a function receives its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// Exactly this many parameters; extras are dropped, missing are nil
    Fixed(usize),
    /// This many fixed parameters followed by a table of the rest
    Variadic(usize),
}

/// Immutable compiled-function descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    /// Code body, starting with the stack size and parameter bytes
    pub code: Vec<u8>,
    /// Constant pool
    pub constants: Vec<Constant>,
    /// Chunk name the function was compiled from
    pub source: String,
    /// Line of the function definition (0 for a main chunk)
    pub line_defined: u32,
    /// Local variable debug records
    pub locals: Vec<LocalVar>,
}

impl Prototype {
    /// Create a prototype from raw parts
    pub fn new(code: Vec<u8>, constants: Vec<Constant>) -> Self {
        Self {
            code,
            constants,
            source: String::from("?"),
            line_defined: 0,
            locals: Vec::new(),
        }
    }

    /// Declared stack size (local slots plus temporaries)
    pub fn stack_size(&self) -> Result<usize, BytecodeError> {
        self.code
            .first()
            .map(|b| *b as usize)
            .ok_or(BytecodeError::PreambleTooShort)
    }

    /// Parameter descriptor from the preamble
    pub fn param_shape(&self) -> Result<ParamShape, BytecodeError> {
        let raw = *self.code.get(1).ok_or(BytecodeError::PreambleTooShort)?;
        Ok(if raw >= ZERO_VARARG {
            ParamShape::Variadic((raw - ZERO_VARARG) as usize)
        } else {
            ParamShape::Fixed(raw as usize)
        })
    }

    /// Constant at `index`
    pub fn constant(&self, index: usize) -> Option<&Constant> {
        self.constants.get(index)
    }

    /// Nested prototypes in constant-pool order
    pub fn nested(&self) -> impl Iterator<Item = &Rc<Prototype>> {
        self.constants.iter().filter_map(Constant::as_prototype)
    }

    /// Decode the instructions of this prototype's body
    pub fn instructions(&self) -> Decoder<'_> {
        Decoder::new(&self.code, CODE_START.min(self.code.len()))
    }

    /// Structural bounds check of this prototype and all nested ones.
    ///
    /// Every opcode must decode, constant operands must be in range and of
    /// the kind their instruction reads, and every jump must land on an
    /// instruction boundary or at the end of the code. Nesting deeper than
    /// [`MAX_NESTING`] is rejected.
    pub fn verify(&self) -> Result<(), BytecodeError> {
        self.verify_at(1)
    }

    fn verify_at(&self, depth: usize) -> Result<(), BytecodeError> {
        if depth > MAX_NESTING {
            return Err(BytecodeError::NestingTooDeep { limit: MAX_NESTING });
        }
        if self.code.len() < CODE_START {
            return Err(BytecodeError::PreambleTooShort);
        }

        let mut boundaries = HashSet::new();
        let mut jumps = Vec::new();
        for inst in self.instructions() {
            let inst = inst?;
            boundaries.insert(inst.offset);
            self.verify_constant(&inst)?;
            if let Some(target) = inst.jump_target() {
                jumps.push((inst.offset, target));
            }
        }
        boundaries.insert(self.code.len());

        for (offset, target) in jumps {
            let valid = target >= CODE_START as isize && boundaries.contains(&(target as usize));
            if !valid {
                return Err(BytecodeError::JumpOutOfRange { offset, target });
            }
        }

        for nested in self.nested() {
            nested.verify_at(depth + 1)?;
        }
        Ok(())
    }

    fn verify_constant(&self, inst: &Instruction) -> Result<(), BytecodeError> {
        if !inst.opcode.uses_constant() {
            return Ok(());
        }
        let index = inst.arg1;
        let constant = self
            .constants
            .get(index)
            .ok_or(BytecodeError::ConstantOutOfRange {
                index,
                len: self.constants.len(),
                offset: inst.offset,
            })?;
        let expected = match inst.opcode {
            Opcode::GetGlobal | Opcode::SetGlobal | Opcode::GetDotted | Opcode::PushSelf => {
                Some("string")
            }
            Opcode::Closure => Some("function"),
            _ => None,
        };
        match expected {
            Some(kind) if constant.kind() != kind => Err(BytecodeError::ConstantKind {
                index,
                expected: kind,
                offset: inst.offset,
            }),
            _ => Ok(()),
        }
    }
}
