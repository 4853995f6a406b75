//! Textual conversion of script numbers.
//!
//! Integral values print without a fractional part; everything else uses
//! the shortest representation that round-trips.

/// Format a number the way scripts observe it through `tostring` and `..`.
///
/// # Examples
///
/// ```
/// use thorn_types::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(-0.5), "-0.5");
/// assert_eq!(format_number(f64::INFINITY), "inf");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return String::from("nan");
    }
    if n.is_infinite() {
        return String::from(if n > 0.0 { "inf" } else { "-inf" });
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return (n as i64).to_string();
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format_finite(n).to_string()
}

/// Parse a numeric string, as used by arithmetic coercion and `tonumber`.
///
/// Surrounding whitespace is ignored. Only plain decimal notation with an
/// optional exponent is accepted; words such as `inf` or `nan` are not.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let plain = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !plain || !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
