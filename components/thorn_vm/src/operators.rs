//! Arithmetic, concatenation, comparison and equality on script values
//!
//! Results that represent a condition are encoded as `1.0` (true) or Nil
//! (false).

use std::cmp::Ordering;

use thorn_types::{ThornError, ThornResult, Value};

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arith {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
}

/// Ordering operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// An operand reduced to something orderable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparable<'a> {
    /// Numeric operand
    Number(f64),
    /// String operand
    Text(&'a str),
}

impl<'a> Comparable<'a> {
    /// Reduce a pair of operands: two strings compare as text, anything
    /// else must coerce to numbers
    pub fn pair(a: &'a Value, b: &'a Value) -> Option<(Self, Self)> {
        if let (Value::String(x), Value::String(y)) = (a, b) {
            return Some((Comparable::Text(x), Comparable::Text(y)));
        }
        Some((
            Comparable::Number(a.to_number()?),
            Comparable::Number(b.to_number()?),
        ))
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Number(x), Comparable::Number(y)) => x.partial_cmp(y),
            (Comparable::Text(x), Comparable::Text(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }
}

fn operand(value: &Value) -> ThornResult<f64> {
    value.to_number().ok_or_else(|| {
        ThornError::invalid_cast(format!(
            "attempt to perform arithmetic on a {} value",
            value.type_name()
        ))
    })
}

/// Apply an arithmetic operator after numeric coercion of both operands
pub fn arith(op: Arith, a: &Value, b: &Value) -> ThornResult<Value> {
    let x = operand(a)?;
    let y = operand(b)?;
    Ok(Value::Number(match op {
        Arith::Add => x + y,
        Arith::Sub => x - y,
        Arith::Mul => x * y,
        Arith::Div => x / y,
        Arith::Pow => x.powf(y),
    }))
}

/// Unary minus
pub fn negate(a: &Value) -> ThornResult<Value> {
    Ok(Value::Number(-operand(a)?))
}

/// `not`: true for Nil, false for everything else
pub fn not(a: &Value) -> Value {
    Value::truth(a.is_nil())
}

/// `..` over the textual forms of both operands
pub fn concat(a: &Value, b: &Value) -> Value {
    Value::from(format!("{}{}", a, b))
}

/// `==` (or `~=` when `negate` is set)
pub fn equals(a: &Value, b: &Value, negate: bool) -> Value {
    Value::truth((a == b) != negate)
}

/// Ordering comparison
pub fn compare(op: Compare, a: &Value, b: &Value) -> ThornResult<Value> {
    let (x, y) = Comparable::pair(a, b).ok_or_else(|| {
        ThornError::type_error(format!(
            "attempt to compare {} with {}",
            a.type_name(),
            b.type_name()
        ))
    })?;
    let ordering = x.partial_cmp(&y);
    let holds = match op {
        Compare::Lt => ordering == Some(Ordering::Less),
        Compare::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        Compare::Gt => ordering == Some(Ordering::Greater),
        Compare::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    };
    Ok(Value::truth(holds))
}
