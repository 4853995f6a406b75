//! Execution resource limits

use serde::{Deserialize, Serialize};

/// Bounds applied to every top-level invocation
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Deepest allowed nesting of script calls
    pub max_call_depth: usize,
    /// Instruction dispatches allowed per top-level invocation
    pub max_instructions: u64,
}

impl Limits {
    /// Default call depth bound
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 25;
    /// Default instruction budget
    pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 1_000_000;
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            max_instructions: Self::DEFAULT_MAX_INSTRUCTIONS,
        }
    }
}
