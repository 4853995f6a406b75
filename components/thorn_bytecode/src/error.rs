//! Errors raised while decoding, loading or verifying bytecode

use thiserror::Error;

/// Structural bytecode failure
///
/// Every variant indicates malformed or hostile input; none of them is
/// recoverable at the instruction level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    /// Raw opcode byte not present in the opcode table
    #[error("unrecognized opcode {opcode} at offset {offset}")]
    UnknownOpcode {
        /// Raw byte
        opcode: u8,
        /// Byte offset of the opcode
        offset: usize,
    },
    /// Operand bytes or chunk data run past the end of the input
    #[error("truncated bytecode at offset {offset}")]
    Truncated {
        /// Offset at which more bytes were expected
        offset: usize,
    },
    /// Code shorter than the two-byte stack/parameter preamble
    #[error("function code is missing its stack size and parameter preamble")]
    PreambleTooShort,
    /// Input does not start with the binary chunk signature
    #[error("missing binary chunk signature")]
    BadSignature,
    /// Chunk version byte not understood by this loader
    #[error("unsupported chunk version {0:#04x}")]
    UnsupportedVersion(u8),
    /// Number size or test number does not match
    #[error("chunk number format does not match this runtime")]
    NumberFormatMismatch,
    /// Unexpected tag byte inside a chunk
    #[error("unexpected tag {tag:#04x} at offset {offset}")]
    UnexpectedTag {
        /// Tag byte found
        tag: u8,
        /// Offset of the tag
        offset: usize,
    },
    /// String data is not valid UTF-8
    #[error("string constant is not valid UTF-8")]
    InvalidUtf8,
    /// Constant index beyond the constant pool
    #[error("constant index {index} out of range ({len} constants) at offset {offset}")]
    ConstantOutOfRange {
        /// Index found in the instruction
        index: usize,
        /// Size of the pool
        len: usize,
        /// Offset of the instruction
        offset: usize,
    },
    /// Constant has the wrong kind for the instruction using it
    #[error("constant {index} is not a {expected} (offset {offset})")]
    ConstantKind {
        /// Index found in the instruction
        index: usize,
        /// Kind the instruction needs
        expected: &'static str,
        /// Offset of the instruction
        offset: usize,
    },
    /// Jump target outside the code or inside another instruction
    #[error("jump at offset {offset} targets {target}, which is not an instruction boundary")]
    JumpOutOfRange {
        /// Offset of the jump
        offset: usize,
        /// Computed target (may be negative)
        target: isize,
    },
    /// A `LongArg` prefix followed by another `LongArg`
    #[error("chained LONGARG prefix at offset {offset}")]
    ChainedLongArg {
        /// Offset of the second prefix
        offset: usize,
    },
    /// Function constants nested deeper than the loader allows
    #[error("function nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// Maximum accepted depth
        limit: usize,
    },
    /// A field does not fit in its on-disk width
    #[error("{field} value {value} does not fit in the chunk format")]
    FieldOverflow {
        /// Name of the field
        field: &'static str,
        /// Value that was too large
        value: usize,
    },
}
