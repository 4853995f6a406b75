//! Bytecode interpreter for Thorn scripts
//!
//! This crate provides:
//! - A bounds-checked per-call [`Stack`]
//! - The call protocol (argument flattening, parameter adjustment,
//!   multi-result delivery)
//! - The fetch-decode-execute loop with call-depth and instruction limits
//! - [`Runtime`], the host bridge embedders use to load and call scripts
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use thorn_bytecode::{Opcode, PrototypeBuilder};
//! use thorn_types::Value;
//! use thorn_vm::Runtime;
//!
//! // return 1 + 2
//! let mut b = PrototypeBuilder::new(2, 0);
//! b.emit_arg(Opcode::PushNumber, 1);
//! b.emit_arg(Opcode::PushNumber, 2);
//! b.emit(Opcode::AddOp);
//! b.emit_arg(Opcode::RetCode, 0);
//!
//! let mut runtime = Runtime::new();
//! let result = runtime.execute(Rc::new(b.build())).unwrap();
//! assert_eq!(result, Value::from(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call;
pub mod call_frame;
pub mod dispatch;
pub mod limits;
pub mod operators;
pub mod runtime;
pub mod stack;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use dispatch::Dispatcher;
pub use limits::Limits;
pub use runtime::{Compiler, Runtime};
pub use stack::Stack;
