//! Type-directed conversion of domain values to SQL literals.

use crate::ast::Scalar;
use crate::error::{JoineryError, JoineryResult};
use crate::metadata::{DomainType, Escaper};

/// Render `value` as a literal of domain type `ty`.
///
/// Text-like types are escaped and single-quoted; Float goes through a
/// float cast; everything else, unknown types included, through an
/// integer cast.
pub fn coerce(ty: DomainType, value: &Scalar, escaper: &dyn Escaper) -> JoineryResult<String> {
    match ty {
        DomainType::String | DomainType::Json | DomainType::DateTime => {
            Ok(quote(escaper, &value.to_string()))
        }
        DomainType::Float => float_literal(float_cast(value)?),
        DomainType::Integer | DomainType::Timestamp | DomainType::Other => {
            Ok(int_cast(value).to_string())
        }
    }
}

/// Escape and single-quote `text`.
pub fn quote(escaper: &dyn Escaper, text: &str) -> String {
    format!("'{}'", escaper.escape_string(text))
}

/// Render a membership element: text (and date-times) quoted, numbers bare.
pub fn list_element(value: &Scalar, escaper: &dyn Escaper) -> JoineryResult<String> {
    match value {
        Scalar::Text(_) | Scalar::DateTime(_) => Ok(quote(escaper, &value.to_string())),
        Scalar::Float(f) => float_literal(*f),
        Scalar::Int(_) | Scalar::Bool(_) => Ok(value.to_string()),
    }
}

fn float_literal(f: f64) -> JoineryResult<String> {
    if !f.is_finite() {
        return Err(JoineryError::InvalidValue(format!(
            "float literal must be finite, got {}",
            f
        )));
    }
    Ok(f.to_string())
}

/// Loose integer cast.
pub fn int_cast(value: &Scalar) -> i64 {
    match value {
        Scalar::Bool(b) => i64::from(*b),
        Scalar::Int(n) => *n,
        // `as` truncates toward zero, saturates, and maps NaN to 0
        Scalar::Float(f) => *f as i64,
        Scalar::Text(s) => leading_int(s),
        Scalar::DateTime(dt) => dt.and_utc().timestamp(),
    }
}

/// Loose float cast; a comma decimal separator is accepted.
pub fn float_cast(value: &Scalar) -> JoineryResult<f64> {
    match value {
        Scalar::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Scalar::Int(n) => Ok(*n as f64),
        Scalar::Float(f) => Ok(*f),
        Scalar::Text(s) => Ok(leading_float(&s.replace(',', "."))),
        Scalar::DateTime(_) => Err(JoineryError::InvalidValue(
            "a date-time cannot be used as a Float".to_string(),
        )),
    }
}

/// Longest signed integer prefix of `s` after leading whitespace; 0 if none.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    match s[..end].parse::<i64>() {
        Ok(n) => n,
        Err(_) if bytes[0] == b'-' => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// Longest decimal prefix of `s` after leading whitespace; 0 if none.
fn leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || mantissa_digits > 0 {
            mantissa_digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}
