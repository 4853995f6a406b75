//! Standard library for the Thorn runtime
//!
//! Library functions are installed flat into a runtime's environment
//! namespace, grouped by module:
//! - base: `tostring`, `tonumber`, `type`
//! - io: `print`, `write`
//! - math: `abs`, `ceil`, `floor`, `sqrt`, `sin`, `cos`, `tan`, `min`,
//!   `max`, `mod`, `random`, `randomseed`, `PI`
//! - string: `strlen`, `strsub`, `strlower`, `strupper`, `strrep`,
//!   `strfind`, `format`
//! - table: `getn`, `tinsert`, `tremove`
//! - os: `clock`, `date`
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use thorn_builtins::{install, LibraryState};
//! use thorn_types::{Namespace, Value};
//!
//! let mut env = Namespace::new();
//! install(&mut env, &Rc::new(LibraryState::new()));
//!
//! let Some(Value::NativeFunction(strupper)) = env.get("strupper") else {
//!     panic!("strupper missing");
//! };
//! let result = strupper.call(&[Value::from("thorn")]).unwrap();
//! assert_eq!(result, Value::from("THORN"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod base;
pub mod format;
pub mod io;
pub mod math;
pub mod os;
pub mod state;
pub mod string;
pub mod table;

use std::rc::Rc;

use thorn_types::Namespace;
use tracing::debug;

pub use base::BaseLib;
pub use io::IoLib;
pub use math::MathLib;
pub use os::OsLib;
pub use state::{LibraryState, OutputWriter};
pub use string::StringLib;
pub use table::TableLib;

/// Install every library module into `env`
pub fn install(env: &mut Namespace, state: &Rc<LibraryState>) {
    let before = env.len();
    BaseLib::install(env);
    IoLib::install(env, state);
    MathLib::install(env, state);
    StringLib::install(env);
    TableLib::install(env);
    OsLib::install(env, state);
    debug!(count = env.len() - before, "installed builtins");
}
