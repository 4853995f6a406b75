//! Thorn command-line runner
//!
//! Loads a compiled chunk, runs it in a fresh [`thorn_vm::Runtime`] and
//! renders the result, the global namespace or a disassembly listing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod runner;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runner::{render, Runner};
