//! String library
//!
//! Positions are 1-based byte offsets; negative positions count from the
//! end. Substrings that split a UTF-8 sequence are decoded lossily.

use thorn_types::{Namespace, ThornResult, Value};

use crate::args::{arg, bad_argument, check_number, check_position, check_string, register};
use crate::format;

/// Longest string `strrep` will build
pub const MAX_STRING_LEN: usize = 1 << 24;

/// String functions
pub struct StringLib;

impl StringLib {
    /// strlen(s)
    pub fn strlen(args: &[Value]) -> ThornResult<Value> {
        let s = check_string(args, 0, "strlen")?;
        Ok(Value::Number(s.len() as f64))
    }

    /// strsub(s [, i [, j]])
    pub fn strsub(args: &[Value]) -> ThornResult<Value> {
        let s = check_string(args, 0, "strsub")?;
        let len = s.len() as i64;
        let i = Self::opt_position(args, 1, "strsub", 1)?;
        let j = Self::opt_position(args, 2, "strsub", -1)?;

        let start = Self::absolute(i, len).max(1);
        let end = Self::absolute(j, len).min(len);
        if start > end {
            return Ok(Value::from(""));
        }
        let bytes = &s.as_bytes()[(start - 1) as usize..end as usize];
        Ok(Value::from(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// strlower(s)
    pub fn strlower(args: &[Value]) -> ThornResult<Value> {
        Ok(Value::from(check_string(args, 0, "strlower")?.to_lowercase()))
    }

    /// strupper(s)
    pub fn strupper(args: &[Value]) -> ThornResult<Value> {
        Ok(Value::from(check_string(args, 0, "strupper")?.to_uppercase()))
    }

    /// strrep(s, n)
    pub fn strrep(args: &[Value]) -> ThornResult<Value> {
        let s = check_string(args, 0, "strrep")?;
        let n = check_number(args, 1, "strrep")?;
        let count = if n > 0.0 { n as usize } else { 0 };
        if s.is_empty() || count == 0 {
            return Ok(Value::from(""));
        }
        match s.len().checked_mul(count) {
            Some(total) if total <= MAX_STRING_LEN => Ok(Value::from(s.repeat(count))),
            _ => Err(bad_argument(1, "strrep", "resulting string too large")),
        }
    }

    /// strfind(s, sub [, init]): plain search returning start and end, or Nil
    pub fn strfind(args: &[Value]) -> ThornResult<Value> {
        let s = check_string(args, 0, "strfind")?;
        let needle = check_string(args, 1, "strfind")?;
        let len = s.len() as i64;
        let init = Self::absolute(Self::opt_position(args, 2, "strfind", 1)?, len).max(1);
        if init > len + 1 {
            return Ok(Value::Nil);
        }

        let from = (init - 1) as usize;
        let found = s.as_bytes()[from..]
            .windows(needle.len().max(1))
            .position(|w| needle.is_empty() || w == needle.as_bytes());
        let at = match found {
            Some(offset) => from + offset,
            None if needle.is_empty() => from,
            None => return Ok(Value::Nil),
        };
        let start = at as f64 + 1.0;
        let end = (at + needle.len()) as f64;
        Ok(Value::tuple(vec![Value::Number(start), Value::Number(end)]))
    }

    /// format(fmt, ...)
    pub fn format(args: &[Value]) -> ThornResult<Value> {
        let template = check_string(args, 0, "format")?;
        Ok(Value::from(format::format(&template, args)?))
    }

    fn opt_position(args: &[Value], index: usize, name: &str, default: i64) -> ThornResult<i64> {
        if arg(args, index).is_nil() {
            Ok(default)
        } else {
            check_position(args, index, name)
        }
    }

    fn absolute(pos: i64, len: i64) -> i64 {
        if pos < 0 {
            len + pos + 1
        } else {
            pos
        }
    }

    /// Install into `env`
    pub fn install(env: &mut Namespace) {
        register(env, "strlen", Self::strlen);
        register(env, "strsub", Self::strsub);
        register(env, "strlower", Self::strlower);
        register(env, "strupper", Self::strupper);
        register(env, "strrep", Self::strrep);
        register(env, "strfind", Self::strfind);
        register(env, "format", Self::format);
    }
}
