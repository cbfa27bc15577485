//! Padding, truncation and stripping rules for string and integer fields.

use crate::error::{Result, XfwError};
use crate::value::Value;

/// Side a padded field fills.
#[derive(Debug, Clone, Copy)]
enum Pad {
    Right(char),
    Left(char),
}

/// Render a string field value.
pub(super) fn render_string(width: usize, truncate: bool, value: Option<&Value>) -> Result<String> {
    let text = match value {
        None => "",
        Some(Value::Str(s)) => s.as_str(),
        Some(other) => return Err(XfwError::type_mismatch("string", other)),
    };
    fit(text, width, truncate, Pad::Right(' '))
}

/// Render an integer field value.
///
/// Strings are normalised on their digits, so fields wider than `i64` work.
/// Floats are only accepted when the field truncates, and lose their
/// fractional part.
pub(super) fn render_integer(width: usize, truncate: bool, value: Option<&Value>) -> Result<String> {
    let number = match value {
        None => "0".to_string(),
        Some(Value::Int(v)) => v.to_string(),
        Some(Value::Str(s)) => normalize_integer(s)?,
        Some(Value::Float(f)) if truncate => float_digits(*f)?,
        Some(other) => return Err(XfwError::type_mismatch("integer", other)),
    };
    fit(&number, width, truncate, Pad::Left('0'))
}

/// Decimal digits of the whole part of `value`.
fn float_digits(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(XfwError::InvalidInteger {
            text: value.to_string(),
        });
    }
    let whole = value.trunc();
    if whole == 0.0 {
        return Ok("0".to_string());
    }
    Ok(format!("{whole:.0}"))
}

/// Strip string padding.
pub(super) fn strip_string(text: &str) -> &str {
    text.trim_end_matches(' ')
}

/// Strip integer padding; an all-zero text keeps a single zero.
pub(super) fn strip_integer(text: &str) -> &str {
    match text.trim_start_matches('0') {
        "" => "0",
        stripped => stripped,
    }
}

/// Canonical integer text: surrounding blanks, a plus sign and leading
/// zeros removed.
pub(super) fn normalize_integer(text: &str) -> Result<String> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(XfwError::InvalidInteger {
            text: text.to_string(),
        });
    }
    let digits = strip_integer(digits);
    if negative && digits != "0" {
        Ok(format!("-{digits}"))
    } else {
        Ok(digits.to_string())
    }
}

/// Convert integer text to a value.
///
/// Numbers outside the `i64` range stay canonical text.
pub(super) fn parse_integer(text: &str) -> Result<Value> {
    let normalized = normalize_integer(text)?;
    Ok(match normalized.parse::<i64>() {
        Ok(number) => Value::Int(number),
        Err(_) => Value::Str(normalized),
    })
}

/// Pad `text` to exactly `width` bytes, or cut it when allowed.
fn fit(text: &str, width: usize, truncate: bool, pad: Pad) -> Result<String> {
    let text = if text.len() > width {
        if !truncate {
            return Err(XfwError::data_too_long(width, text));
        }
        &text[..char_floor(text, width)]
    } else {
        text
    };

    // A cut inside a multi-byte character leaves room that padding fills.
    let missing = width - text.len();
    let mut out = String::with_capacity(width);
    match pad {
        Pad::Right(fill) => {
            out.push_str(text);
            out.extend(std::iter::repeat_n(fill, missing));
        }
        Pad::Left(fill) => {
            out.extend(std::iter::repeat_n(fill, missing));
            out.push_str(text);
        }
    }
    Ok(out)
}

/// Largest char boundary not after `index`.
fn char_floor(text: &str, index: usize) -> usize {
    (0..=index)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0)
}
