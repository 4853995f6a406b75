//! Base library: `tostring`, `tonumber`, `type`

use thorn_types::{Namespace, ThornResult, Value};

use crate::args::{arg, bad_argument, check_number, register};

/// Conversions and type inspection
pub struct BaseLib;

impl BaseLib {
    /// `tostring(v)`
    pub fn tostring(args: &[Value]) -> ThornResult<Value> {
        Ok(Value::from(arg(args, 0).to_string()))
    }

    /// `tonumber(v [, base])`, Nil when `v` does not convert
    pub fn tonumber(args: &[Value]) -> ThornResult<Value> {
        let value = arg(args, 0);
        if arg(args, 1).is_nil() {
            return Ok(value.to_number().map_or(Value::Nil, Value::Number));
        }

        let base = check_number(args, 1, "tonumber")?;
        if base.fract() != 0.0 || !(2.0..=36.0).contains(&base) {
            return Err(bad_argument(1, "tonumber", "base out of range"));
        }
        let text = match value {
            Value::String(s) => s.to_string(),
            Value::Number(n) => thorn_types::format_number(*n),
            _ => return Ok(Value::Nil),
        };
        Ok(parse_radix(text.trim(), base as u32).map_or(Value::Nil, Value::Number))
    }

    /// `type(v)`
    pub fn type_of(args: &[Value]) -> ThornResult<Value> {
        Ok(Value::from(arg(args, 0).type_name()))
    }

    /// Install into `env`
    pub fn install(env: &mut Namespace) {
        register(env, "tostring", Self::tostring);
        register(env, "tonumber", Self::tonumber);
        register(env, "type", Self::type_of);
    }
}

fn parse_radix(text: &str, radix: u32) -> Option<f64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() {
        return None;
    }
    let mut acc = 0.0f64;
    for c in digits.chars() {
        acc = acc * radix as f64 + c.to_digit(radix)? as f64;
    }
    Some(if negative { -acc } else { acc })
}
