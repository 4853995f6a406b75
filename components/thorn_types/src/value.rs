//! Dynamic script values.
//!
//! Scripts have one number type (64-bit float) and no booleans: "true" is
//! the number `1.0` and "false" is [`Value::Nil`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::function::{Closure, NativeFunction};
use crate::number::{format_number, parse_number};
use crate::table::Table;

/// Shared, mutable table handle
pub type TableRef = Rc<RefCell<Table>>;

/// Represents any script value.
///
/// # Examples
///
/// ```
/// use thorn_types::Value;
///
/// let n = Value::from(3.0);
/// assert!(n.is_truthy());
/// assert_eq!(n.type_name(), "number");
/// assert!(!Value::Nil.is_truthy());
/// assert_eq!(Value::truth(true), Value::Number(1.0));
/// assert_eq!(Value::truth(false), Value::Nil);
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value; also "false"
    #[default]
    Nil,
    /// 64-bit float
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Reference to a table
    Table(TableRef),
    /// Script function
    Closure(Rc<Closure>),
    /// Host function
    NativeFunction(NativeFunction),
    /// Multiple return values in transit from a call to its caller
    Tuple(Rc<[Value]>),
}

impl Value {
    /// The canonical "true" value
    pub const TRUE: Value = Value::Number(1.0);

    /// Encode a condition: `1.0` for true, Nil for false
    pub fn truth(condition: bool) -> Value {
        if condition {
            Value::TRUE
        } else {
            Value::Nil
        }
    }

    /// Wrap a table in a fresh shared handle
    pub fn table(table: Table) -> Value {
        Value::Table(Rc::new(RefCell::new(table)))
    }

    /// Build a multi-result value.
    ///
    /// Zero values become Nil and a single value is returned as itself.
    pub fn tuple(mut values: Vec<Value>) -> Value {
        match values.len() {
            0 => Value::Nil,
            1 => values.pop().unwrap_or_default(),
            _ => Value::Tuple(values.into()),
        }
    }

    /// Everything except Nil is truthy
    pub fn is_truthy(&self) -> bool {
        !self.is_nil()
    }

    /// Whether this is Nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Name reported by the `type` builtin
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Closure(_) | Value::NativeFunction(_) => "function",
            Value::Tuple(values) => values.first().map_or("nil", Value::type_name),
        }
    }

    /// Numeric coercion: numbers as-is, numeric strings parsed
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s),
            Value::Tuple(values) => values.first().and_then(Value::to_number),
            _ => None,
        }
    }

    /// String payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Table handle, if this is a table
    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Collapse a tuple to its first element (Nil when empty).
    ///
    /// Applied to every value before it is stored anywhere.
    pub fn first(self) -> Value {
        match self {
            Value::Tuple(values) => values.first().cloned().unwrap_or_default(),
            other => other,
        }
    }

    /// Whether this value can be called
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::NativeFunction(_))
    }
}

/// Equality as seen by `==`: numbers by IEEE value, strings by content,
/// tables and functions by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a.ptr_eq(b),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

/// Textual form used by `tostring`, `print` and concatenation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            Value::Closure(c) => write!(f, "function: {:p}", Rc::as_ptr(c)),
            Value::NativeFunction(n) => write!(f, "function: builtin {}", n.name()),
            Value::Tuple(values) => match values.first() {
                Some(v) => fmt::Display::fmt(v, f),
                None => f.write_str("nil"),
            },
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::table(t)
    }
}

impl From<NativeFunction> for Value {
    fn from(f: NativeFunction) -> Self {
        Value::NativeFunction(f)
    }
}
