//! Call frame for one script function invocation

use std::rc::Rc;

use thorn_types::{Closure, StackFrame};

use crate::stack::Stack;

/// State of one running script function
#[derive(Debug)]
pub struct CallFrame {
    /// Function being executed
    pub closure: Rc<Closure>,
    /// Locals followed by temporaries
    pub stack: Stack,
    /// Offset of the next instruction
    pub pc: usize,
    /// Offset of the instruction being executed
    pub current: usize,
    /// Last line recorded by `SetLine`
    pub line: u32,
    /// Nesting depth (1 for a top-level invocation)
    pub depth: usize,
}

impl CallFrame {
    /// Create a frame with the given stack capacity, positioned at `start`
    pub fn new(closure: Rc<Closure>, capacity: usize, start: usize, depth: usize) -> Self {
        Self {
            closure,
            stack: Stack::new(capacity),
            pc: start,
            current: start,
            line: 0,
            depth,
        }
    }

    /// Traceback entry describing where this frame stopped
    pub fn stack_frame(&self) -> StackFrame {
        let proto = &self.closure.proto;
        StackFrame {
            source: proto.source.clone(),
            line_defined: proto.line_defined,
            line: self.line,
            pc: self.current,
        }
    }
}
