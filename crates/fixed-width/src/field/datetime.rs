//! Date/time field support.
//!
//! A date/time field has no declared width: it is computed once by formatting
//! a sentinel date with the field's strftime-style format, which also rejects
//! formats the formatter does not understand.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, XfwError};

/// Any date will do, as long as every field of the format renders.
fn sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Width of text produced by `format`.
pub(super) fn format_width(format: &str) -> Result<usize> {
    let width = format_datetime(sentinel(), format)?.len();
    if width == 0 {
        return Err(XfwError::InvalidDateFormat {
            format: format.to_string(),
        });
    }
    Ok(width)
}

/// Format `value`, reporting unsupported specifiers instead of panicking.
pub(super) fn format_datetime(value: NaiveDateTime, format: &str) -> Result<String> {
    let invalid = || XfwError::InvalidDateFormat {
        format: format.to_string(),
    };
    let items = StrftimeItems::new(format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    let mut out = String::new();
    write!(out, "{}", value.format_with_items(items)).map_err(|_| invalid())?;
    Ok(out)
}

/// Parse `text` with `format`.
///
/// Formats without a time part parse to midnight; formats with only a time
/// part land on the sentinel date.
pub(super) fn parse_datetime(text: &str, format: &str) -> Result<NaiveDateTime> {
    if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(value);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, format) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, format) {
        return Ok(sentinel().date().and_time(time));
    }
    Err(XfwError::InvalidDateTime {
        text: text.to_string(),
        format: format.to_string(),
    })
}
