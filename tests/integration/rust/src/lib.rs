//! Integration test suite for the Thorn runtime
//!
//! Cross-crate scenarios: chunks built and serialized by `thorn_bytecode`,
//! loaded and run by `thorn_vm` with `thorn_builtins` installed, and
//! driven end to end through `thorn_cli`.

use std::cell::RefCell;
use std::rc::Rc;

use thorn_vm::Runtime;

/// Re-export components for test convenience
pub mod components {
    pub use thorn_builtins;
    pub use thorn_bytecode;
    pub use thorn_cli;
    pub use thorn_types;
    pub use thorn_vm;
}

/// Runtime with the standard library whose output is captured
pub fn capturing_runtime() -> (Runtime, Rc<RefCell<String>>) {
    let output = Rc::new(RefCell::new(String::new()));
    let sink = output.clone();
    let mut runtime = Runtime::new();
    runtime.set_builtins();
    runtime.on_stdout(move |text| sink.borrow_mut().push_str(text));
    (runtime, output)
}
