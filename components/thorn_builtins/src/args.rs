//! Argument checking shared by the library functions

use thorn_types::{Namespace, NativeFunction, TableRef, ThornError, ThornResult, Value};

/// Argument `index` (0-based), Nil when absent
pub fn arg(args: &[Value], index: usize) -> &Value {
    const NIL: &Value = &Value::Nil;
    args.get(index).unwrap_or(NIL)
}

/// "bad argument #n to 'name' (...)" error; `index` is 0-based
pub fn bad_argument(index: usize, name: &str, detail: &str) -> ThornError {
    ThornError::type_error(format!(
        "bad argument #{} to '{}' ({})",
        index + 1,
        name,
        detail
    ))
}

fn expected(index: usize, name: &str, kind: &str, got: &Value) -> ThornError {
    let detail = if got.is_nil() {
        format!("{} expected, got no value", kind)
    } else {
        format!("{} expected, got {}", kind, got.type_name())
    };
    bad_argument(index, name, &detail)
}

/// Required number (numeric strings coerce)
pub fn check_number(args: &[Value], index: usize, name: &str) -> ThornResult<f64> {
    let value = arg(args, index);
    value
        .to_number()
        .ok_or_else(|| expected(index, name, "number", value))
}

/// Optional number with a default for Nil
pub fn opt_number(args: &[Value], index: usize, name: &str, default: f64) -> ThornResult<f64> {
    if arg(args, index).is_nil() {
        Ok(default)
    } else {
        check_number(args, index, name)
    }
}

/// Required string (numbers coerce to their textual form)
pub fn check_string(args: &[Value], index: usize, name: &str) -> ThornResult<String> {
    match arg(args, index) {
        Value::String(s) => Ok(s.to_string()),
        Value::Number(n) => Ok(thorn_types::format_number(*n)),
        other => Err(expected(index, name, "string", other)),
    }
}

/// Required table
pub fn check_table(args: &[Value], index: usize, name: &str) -> ThornResult<TableRef> {
    match arg(args, index) {
        Value::Table(t) => Ok(t.clone()),
        other => Err(expected(index, name, "table", other)),
    }
}

/// Convert a script number to a 1-based position, rejecting fractions
pub fn check_position(args: &[Value], index: usize, name: &str) -> ThornResult<i64> {
    let n = check_number(args, index, name)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(bad_argument(index, name, "integer expected"));
    }
    Ok(n as i64)
}

/// Install a host function under `name`
pub fn register<F>(env: &mut Namespace, name: &str, func: F)
where
    F: Fn(&[Value]) -> ThornResult<Value> + 'static,
{
    env.insert(
        name.to_string(),
        Value::NativeFunction(NativeFunction::new(name, func)),
    );
}
