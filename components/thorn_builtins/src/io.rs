//! Output library: `print`, `write`

use std::rc::Rc;

use thorn_types::{Namespace, Value};

use crate::args::register;
use crate::state::LibraryState;

/// Script output through the runtime's writer
pub struct IoLib;

impl IoLib {
    /// Text `print` emits: arguments separated by tabs, then a newline
    pub fn print_line(args: &[Value]) -> String {
        let mut line = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\t");
        line.push('\n');
        line
    }

    /// Text `write` emits: arguments back to back
    pub fn write_text(args: &[Value]) -> String {
        args.iter().map(ToString::to_string).collect()
    }

    /// Install into `env`
    pub fn install(env: &mut Namespace, state: &Rc<LibraryState>) {
        let out = state.clone();
        register(env, "print", move |args| {
            out.write(&Self::print_line(args));
            Ok(Value::Nil)
        });
        let out = state.clone();
        register(env, "write", move |args| {
            out.write(&Self::write_text(args));
            Ok(Value::Nil)
        });
    }
}
