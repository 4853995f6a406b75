//! Per-call operand and local storage
//!
//! A frame's stack is sized once when the frame is created. Every access
//! is bounds checked; a violation means corrupt bytecode or a VM bug and
//! surfaces as a VM fault.

use thorn_types::{ThornError, ThornResult, Value};

/// LIFO value buffer with indexed access to local slots
#[derive(Debug, Clone)]
pub struct Stack {
    values: Vec<Value>,
    capacity: usize,
}

impl Stack {
    /// Create an empty stack holding at most `capacity` values
    pub fn new(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of values on the stack
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of values
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push a value
    pub fn push(&mut self, value: Value) -> ThornResult<()> {
        if self.values.len() >= self.capacity {
            return Err(ThornError::vm_fault(format!(
                "stack overflow (capacity {})",
                self.capacity
            )));
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop the top value
    pub fn pop(&mut self) -> ThornResult<Value> {
        self.values
            .pop()
            .ok_or_else(|| ThornError::vm_fault("pop from empty stack"))
    }

    /// Pop the top `n` values, returned bottom-first
    pub fn pop_n(&mut self, n: usize) -> ThornResult<Vec<Value>> {
        let start = self.values.len().checked_sub(n).ok_or_else(|| {
            ThornError::vm_fault(format!(
                "pop of {} values from stack of {}",
                n,
                self.values.len()
            ))
        })?;
        Ok(self.values.split_off(start))
    }

    /// Drop the top `n` values
    pub fn discard(&mut self, n: usize) -> ThornResult<()> {
        self.pop_n(n).map(drop)
    }

    /// The top value
    pub fn peek(&self) -> ThornResult<&Value> {
        self.values
            .last()
            .ok_or_else(|| ThornError::vm_fault("peek at empty stack"))
    }

    /// Value at slot `index`
    pub fn get(&self, index: usize) -> ThornResult<&Value> {
        self.values.get(index).ok_or_else(|| self.out_of_range(index))
    }

    /// Overwrite slot `index`
    pub fn set(&mut self, index: usize, value: Value) -> ThornResult<()> {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.out_of_range(index)),
        }
    }

    /// Slots `base..` as a slice
    pub fn above(&self, base: usize) -> ThornResult<&[Value]> {
        self.values.get(base..).ok_or_else(|| self.out_of_range(base))
    }

    fn out_of_range(&self, index: usize) -> ThornError {
        ThornError::vm_fault(format!(
            "stack index {} out of range (size {})",
            index,
            self.values.len()
        ))
    }
}
