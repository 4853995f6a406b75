//! Bytecode layer of the Thorn scripting runtime
//!
//! This crate defines the opcode table, instruction decoding, compiled
//! function prototypes, the binary chunk format and a small assembler.
//!
//! # Features
//!
//! - Stack-based bytecode with narrow and wide operand encodings
//! - `LongArg` operand prefixes folded at decode time
//! - Structural verification of prototypes before execution
//! - Binary chunk serialization
//! - Disassembly
//!
//! # Example
//!
//! ```
//! use thorn_bytecode::{Opcode, Prototype, PrototypeBuilder};
//!
//! let mut builder = PrototypeBuilder::new(1, 0);
//! builder.emit_arg(Opcode::PushNumber, 42);
//! builder.emit_arg(Opcode::RetCode, 0);
//! builder.emit(Opcode::EndCode);
//! let proto = builder.build();
//! proto.verify().unwrap();
//!
//! let bytes = proto.to_bytes().unwrap();
//! let restored = Prototype::from_bytes(&bytes).unwrap();
//! assert_eq!(restored, proto);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod chunk;
pub mod disasm;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod prototype;

// Re-export main types at crate root
pub use builder::{JumpLabel, PrototypeBuilder};
pub use chunk::has_chunk_signature;
pub use disasm::disassemble;
pub use error::BytecodeError;
pub use instruction::{Decoder, Instruction};
pub use opcode::{Opcode, Operands, FIELDS_PER_FLUSH, MULT_RET, ZERO_VARARG};
pub use prototype::{Constant, LocalVar, ParamShape, Prototype, CODE_START, MAX_NESTING};
