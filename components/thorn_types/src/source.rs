//! Source positions and traceback frames for script errors.

use std::fmt;

/// A line in a named chunk.
///
/// # Examples
///
/// ```
/// use thorn_types::SourcePosition;
///
/// let pos = SourcePosition {
///     source: "mission.lua".to_string(),
///     line: 12,
/// };
///
/// assert_eq!(pos.to_string(), "mission.lua:12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    /// Chunk name
    pub source: String,
    /// Line number (0 when no line information was recorded)
    pub line: u32,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// One script function active when an error unwound through it.
///
/// Frames are appended innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Chunk the function was compiled from
    pub source: String,
    /// Line of the function definition (0 for a main chunk)
    pub line_defined: u32,
    /// Last line recorded by `SetLine` in this frame
    pub line: u32,
    /// Byte offset of the instruction being executed
    pub pc: usize,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line_defined == 0 {
            write!(f, "{}:{}: in main chunk (pc {})", self.source, self.line, self.pc)
        } else {
            write!(
                f,
                "{}:{}: in function <{}:{}> (pc {})",
                self.source, self.line, self.source, self.line_defined, self.pc
            )
        }
    }
}
