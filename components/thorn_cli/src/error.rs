//! Error types for the CLI

use std::path::PathBuf;

use thiserror::Error;
use thorn_bytecode::BytecodeError;
use thorn_types::ThornError;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Script failed; displays the message with its traceback
    #[error("{}", .0.traceback())]
    Script(#[from] ThornError),

    /// Chunk could not be decoded
    #[error("bad chunk: {0}")]
    Bytecode(#[from] BytecodeError),

    /// File could not be read
    #[error("could not read '{}': {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Limits file is not valid JSON for `Limits`
    #[error("invalid limits file '{}': {source}", path.display())]
    Limits {
        /// Limits file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// `--disassemble` given a file without the chunk signature
    #[error("'{}' is not a compiled chunk", .0.display())]
    NotAChunk(PathBuf),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
