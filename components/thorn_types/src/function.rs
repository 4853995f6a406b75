//! Callable values: script closures and host functions.

use std::fmt;
use std::rc::Rc;

use thorn_bytecode::Prototype;

use crate::{ThornResult, Value};

/// A prototype paired with the upvalues captured when it was created.
///
/// Upvalues are copies taken at closure-creation time; later assignments
/// to the enclosing locals are not visible through them.
#[derive(Debug)]
pub struct Closure {
    /// Shared compiled function
    pub proto: Rc<Prototype>,
    /// Captured values, indexed by `PushUpValue`
    pub upvalues: Vec<Value>,
}

impl Closure {
    /// Pair a prototype with captured values
    pub fn new(proto: Rc<Prototype>, upvalues: Vec<Value>) -> Self {
        Self { proto, upvalues }
    }

    /// A closure without upvalues, as used for a main chunk
    pub fn main(proto: Rc<Prototype>) -> Self {
        Self::new(proto, Vec::new())
    }
}

/// Signature of host functions callable from scripts
pub type NativeFn = dyn Fn(&[Value]) -> ThornResult<Value>;

/// A named host function.
///
/// Cloning shares the underlying function; equality is identity.
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    /// Wrap a host function
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> ThornResult<Value> + 'static,
    {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// Name the function was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> ThornResult<Value> {
        (self.func)(args)
    }

    /// Whether both handles refer to the same function
    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeFunction").field(&self.name).finish()
    }
}
