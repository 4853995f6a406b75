//! Call protocol: argument collection, parameter adjustment and result
//! delivery between caller and callee stacks.

use thorn_bytecode::{ParamShape, MULT_RET};
use thorn_types::{Table, ThornResult, Value};

use crate::stack::Stack;

/// Pop `n_args` arguments and the callee beneath them.
///
/// A Tuple in the last argument position is expanded in place; Tuples
/// anywhere else are collapsed to their first value.
pub fn take_call(stack: &mut Stack, n_args: usize) -> ThornResult<(Value, Vec<Value>)> {
    let args = flatten(stack.pop_n(n_args)?);
    let callee = stack.pop()?.first();
    Ok((callee, args))
}

/// Expand a trailing Tuple and collapse any other
pub fn flatten(mut values: Vec<Value>) -> Vec<Value> {
    let tail = match values.last() {
        Some(Value::Tuple(_)) => values.pop(),
        _ => None,
    };
    let mut out: Vec<Value> = values.into_iter().map(Value::first).collect();
    if let Some(Value::Tuple(rest)) = tail {
        out.extend(rest.iter().cloned().map(Value::first));
    }
    out
}

/// Fit incoming arguments to the callee's parameter list.
///
/// Missing parameters become Nil and extras are dropped. A variadic
/// callee gets one more slot: a table of the extras with field `n`.
pub fn adjust_args(shape: ParamShape, mut args: Vec<Value>) -> Vec<Value> {
    match shape {
        ParamShape::Fixed(n) => {
            args.resize(n, Value::Nil);
            args
        }
        ParamShape::Variadic(n) => {
            let extra = if args.len() > n {
                args.split_off(n)
            } else {
                Vec::new()
            };
            args.resize(n, Value::Nil);
            let count = extra.len();
            let mut rest = Table::from_values(extra);
            rest.set_field("n", Value::Number(count as f64));
            args.push(Value::table(rest));
            args
        }
    }
}

/// Deliver a call result to the caller's stack.
///
/// `MULT_RET` keeps the result in one slot as-is; otherwise exactly
/// `n_results` slots are filled, padding with Nil.
pub fn push_results(stack: &mut Stack, result: Value, n_results: usize) -> ThornResult<()> {
    if n_results == MULT_RET {
        return stack.push(result);
    }
    let values: Vec<Value> = match result {
        Value::Tuple(values) => values.to_vec(),
        single => vec![single],
    };
    for i in 0..n_results {
        stack.push(values.get(i).cloned().unwrap_or_default())?;
    }
    Ok(())
}

/// Result of returning the slots from `base` to the top
pub fn return_values(stack: &Stack, base: usize) -> ThornResult<Value> {
    Ok(Value::tuple(flatten(stack.above(base)?.to_vec())))
}
