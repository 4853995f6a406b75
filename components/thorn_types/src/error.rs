//! Script error types.
//!
//! Every fault raised while loading or running a script is a [`ThornError`].
//! Errors are never recovered inside the interpreter; they unwind to the
//! host entry point, collecting a traceback on the way.

use std::fmt;
use std::io;

use thiserror::Error;
use thorn_bytecode::BytecodeError;

use crate::{SourcePosition, StackFrame};

/// The kind of script error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Call depth or instruction budget exhausted
    LimitsExceeded,
    /// Operation applied to a value of the wrong kind
    TypeError,
    /// Operand could not be coerced to a number
    InvalidCast,
    /// Malformed bytecode or broken interpreter invariant
    VmFault,
    /// Source text could not be compiled
    CompileError,
    /// Reading the program failed
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::LimitsExceeded => "limits exceeded",
            ErrorKind::TypeError => "type error",
            ErrorKind::InvalidCast => "invalid cast",
            ErrorKind::VmFault => "vm fault",
            ErrorKind::CompileError => "compile error",
            ErrorKind::IoError => "io error",
        })
    }
}

/// A script error with message and traceback.
///
/// # Examples
///
/// ```
/// use thorn_types::{ErrorKind, ThornError};
///
/// let error = ThornError::type_error("attempt to index a number value");
/// assert_eq!(error.kind, ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "type error: attempt to index a number value");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ThornError {
    /// The kind of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Script frames the error unwound through, innermost first
    pub stack: Vec<StackFrame>,
    /// Where the error was raised, when known
    pub source_position: Option<SourcePosition>,
}

impl ThornError {
    /// Create an error without position information
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
            source_position: None,
        }
    }

    /// Call depth or instruction budget exhausted
    pub fn limits(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LimitsExceeded, message)
    }

    /// Wrong value kind
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Failed numeric coercion
    pub fn invalid_cast(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCast, message)
    }

    /// Malformed bytecode or interpreter invariant violation
    pub fn vm_fault(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VmFault, message)
    }

    /// Compilation failure
    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompileError, message)
    }

    /// Input failure
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoError, message)
    }

    /// Append a traceback frame.
    ///
    /// The first frame appended also becomes the error's source position.
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        if self.source_position.is_none() {
            self.source_position = Some(SourcePosition {
                source: frame.source.clone(),
                line: frame.line,
            });
        }
        self.stack.push(frame);
        self
    }

    /// Message followed by one traceback line per frame
    pub fn traceback(&self) -> String {
        let mut out = match &self.source_position {
            Some(pos) => format!("{}: {}", pos, self),
            None => self.to_string(),
        };
        if !self.stack.is_empty() {
            out.push_str("\nstack traceback:");
            for frame in &self.stack {
                out.push_str("\n\t");
                out.push_str(&frame.to_string());
            }
        }
        out
    }
}

impl From<BytecodeError> for ThornError {
    fn from(err: BytecodeError) -> Self {
        ThornError::vm_fault(err.to_string())
    }
}

impl From<io::Error> for ThornError {
    fn from(err: io::Error) -> Self {
        ThornError::io(err.to_string())
    }
}

/// Result alias used throughout the runtime
pub type ThornResult<T> = Result<T, ThornError>;
