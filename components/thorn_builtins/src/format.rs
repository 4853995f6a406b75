//! printf-style formatting behind the `format` builtin
//!
//! Supports `%d %i %u %c %o %x %X %e %E %f %g %G %q %s %%` with the
//! `- + space # 0` flags, a field width and a precision. Length modifiers
//! (`h`, `l`) are accepted and ignored.

use std::iter::Peekable;
use std::str::Chars;

use thorn_types::{ThornError, ThornResult, Value};

use crate::args::{bad_argument, check_number};

const NAME: &str = "format";

/// Largest field width or precision a conversion may ask for
pub const MAX_FIELD: usize = 99;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

/// Format `args[1..]` according to the format string in `args[0]`
pub fn format(template: &str, args: &[Value]) -> ThornResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    // args[0] is the template itself
    let mut next_arg = 1;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let spec = parse_spec(&mut chars)?;
        let conversion = chars
            .next()
            .ok_or_else(|| ThornError::type_error("invalid format string to 'format' (ends with '%')"))?;

        let index = next_arg;
        next_arg += 1;
        if index >= args.len() {
            return Err(bad_argument(index, NAME, "no value"));
        }

        let piece = match conversion {
            'd' | 'i' => {
                let n = integer(args, index)?;
                signed(n, &spec)
            }
            'u' => unsigned(integer(args, index)? as u64, 10, "", &spec),
            'o' => {
                let n = integer(args, index)? as u64;
                let prefix = if spec.alt && n != 0 { "0" } else { "" };
                unsigned(n, 8, prefix, &spec)
            }
            'x' | 'X' => {
                let n = integer(args, index)? as u64;
                let prefix = match (spec.alt && n != 0, conversion) {
                    (true, 'x') => "0x",
                    (true, _) => "0X",
                    _ => "",
                };
                let text = unsigned(n, 16, prefix, &spec);
                if conversion == 'X' {
                    text.to_uppercase()
                } else {
                    text
                }
            }
            'c' => {
                let code = integer(args, index)?;
                let ch = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| bad_argument(index, NAME, "invalid character code"))?;
                pad(String::new(), ch.to_string(), &spec, false)
            }
            'e' | 'E' | 'f' | 'g' | 'G' => {
                let x = check_number(args, index, NAME)?;
                float(x, conversion, &spec)
            }
            's' => {
                let mut text = args[index].to_string();
                if let Some(p) = spec.precision {
                    text = text.chars().take(p).collect();
                }
                pad(String::new(), text, &spec, false)
            }
            'q' => quote(&args[index].to_string()),
            other => {
                return Err(ThornError::type_error(format!(
                    "invalid option '%{}' to 'format'",
                    other
                )))
            }
        };
        out.push_str(&piece);
    }
    Ok(out)
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> ThornResult<Spec> {
    let mut spec = Spec::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.left = true,
            '+' => spec.plus = true,
            ' ' => spec.space = true,
            '#' => spec.alt = true,
            '0' => spec.zero = true,
            _ => break,
        }
        chars.next();
    }
    spec.width = digits(chars)?.unwrap_or(0);
    if chars.peek() == Some(&'.') {
        chars.next();
        spec.precision = Some(digits(chars)?.unwrap_or(0));
    }
    while matches!(chars.peek(), Some('h') | Some('l')) {
        chars.next();
    }
    Ok(spec)
}

fn digits(chars: &mut Peekable<Chars<'_>>) -> ThornResult<Option<usize>> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        let next = value.unwrap_or(0) * 10 + d as usize;
        if next > MAX_FIELD {
            return Err(ThornError::type_error(
                "invalid format (width or precision too long)",
            ));
        }
        value = Some(next);
        chars.next();
    }
    Ok(value)
}

fn integer(args: &[Value], index: usize) -> ThornResult<i64> {
    let n = check_number(args, index, NAME)?;
    if !n.is_finite() {
        return Err(bad_argument(index, NAME, "number has no integer representation"));
    }
    Ok(n.trunc() as i64)
}

fn sign_of(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

fn with_min_digits(body: String, spec: &Spec) -> String {
    match spec.precision {
        Some(0) if body == "0" => String::new(),
        Some(p) => format!("{:0>width$}", body, width = p),
        None => body,
    }
}

fn signed(n: i64, spec: &Spec) -> String {
    let body = with_min_digits(n.unsigned_abs().to_string(), spec);
    let zero_ok = spec.precision.is_none();
    pad(sign_of(n < 0, spec).to_string(), body, spec, zero_ok)
}

fn unsigned(n: u64, radix: u32, prefix: &str, spec: &Spec) -> String {
    let body = match radix {
        8 => format!("{:o}", n),
        16 => format!("{:x}", n),
        _ => n.to_string(),
    };
    let body = with_min_digits(body, spec);
    let zero_ok = spec.precision.is_none();
    pad(prefix.to_string(), body, spec, zero_ok)
}

fn float(x: f64, conversion: char, spec: &Spec) -> String {
    let upper = conversion.is_ascii_uppercase();
    let sign = sign_of(x.is_sign_negative() && !x.is_nan(), spec).to_string();
    if !x.is_finite() {
        let word = if x.is_nan() { "nan" } else { "inf" };
        let word = if upper { word.to_uppercase() } else { word.to_string() };
        return pad(sign, word, spec, false);
    }

    let precision = spec.precision.unwrap_or(6);
    let magnitude = x.abs();
    let body = match conversion.to_ascii_lowercase() {
        'f' => fixed(magnitude, precision, spec.alt),
        'e' => exponent(magnitude, precision, spec.alt),
        _ => general(magnitude, precision, spec.alt),
    };
    let body = if upper { body.to_uppercase() } else { body };
    pad(sign, body, spec, true)
}

fn fixed(x: f64, precision: usize, alt: bool) -> String {
    let mut text = format!("{:.*}", precision, x);
    if alt && precision == 0 {
        text.push('.');
    }
    text
}

fn exponent(x: f64, precision: usize, alt: bool) -> String {
    let text = format!("{:.*e}", precision, x);
    let (mantissa, exp) = text.split_once('e').unwrap_or((&text, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let mut mantissa = mantissa.to_string();
    if alt && precision == 0 {
        mantissa.push('.');
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

fn general(x: f64, precision: usize, alt: bool) -> String {
    let p = precision.max(1);
    // exponent after rounding to p significant digits
    let rounded = format!("{:.*e}", p - 1, x);
    let exp: i32 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let text = if exp < -4 || exp >= p as i32 {
        exponent(x, p - 1, alt)
    } else {
        fixed(x, (p as i32 - 1 - exp).max(0) as usize, alt)
    };
    if alt {
        return text;
    }
    strip_trailing_zeros(text)
}

fn strip_trailing_zeros(text: String) -> String {
    let (mantissa, suffix) = match text.find('e') {
        Some(at) => (&text[..at], &text[at..]),
        None => (text.as_str(), ""),
    };
    if !mantissa.contains('.') {
        return text;
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, suffix)
}

fn pad(prefix: String, body: String, spec: &Spec, zero_ok: bool) -> String {
    let len = prefix.chars().count() + body.chars().count();
    if len >= spec.width {
        return prefix + &body;
    }
    let fill = spec.width - len;
    if spec.left {
        format!("{}{}{}", prefix, body, " ".repeat(fill))
    } else if spec.zero && zero_ok {
        format!("{}{}{}", prefix, "0".repeat(fill), body)
    } else {
        format!("{}{}{}", " ".repeat(fill), prefix, body)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\\' | '\n' => {
                out.push('\\');
                out.push(c);
            }
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\000"),
            c if (c as u32) < 0x20 => {
                let code = c as u32;
                if chars.peek().map_or(false, char::is_ascii_digit) {
                    out.push_str(&format!("\\{:03}", code));
                } else {
                    out.push_str(&format!("\\{}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
