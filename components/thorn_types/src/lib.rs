//! Core value types and error handling for the Thorn runtime.
//!
//! # Overview
//!
//! - [`Value`] - Dynamic script values (numbers, strings, tables, functions)
//! - [`Table`] - Array + string-keyed map storage
//! - [`Closure`] / [`NativeFunction`] - Script and host callables
//! - [`ThornError`] - Script errors with tracebacks
//! - [`ErrorKind`] - Error taxonomy
//! - [`SourcePosition`] / [`StackFrame`] - Traceback information
//!
//! # Examples
//!
//! ```
//! use thorn_types::{ErrorKind, Table, ThornError, Value};
//!
//! let list = Value::from(Table::from_values(vec![Value::from(1.0), Value::from(2.0)]));
//! assert_eq!(list.type_name(), "table");
//!
//! let error = ThornError::invalid_cast("cannot convert 'abc' to a number");
//! assert_eq!(error.kind, ErrorKind::InvalidCast);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod number;
mod source;
mod table;
mod value;

use indexmap::IndexMap;

pub use error::{ErrorKind, ThornError, ThornResult};
pub use function::{Closure, NativeFn, NativeFunction};
pub use number::{format_number, parse_number};
pub use source::{SourcePosition, StackFrame};
pub use table::{Table, ARRAY_PART_THRESHOLD, MAX_ARRAY_INDEX};
pub use value::{TableRef, Value};

/// Name -> value map used for the `Env` and `Globals` namespaces
pub type Namespace = IndexMap<String, Value>;
