//! Fixed-width field codecs.
//!
//! A field turns one typed value into text of exactly its width and back.
//! Three variants exist:
//!
//! | Variant  | Padding          | Blank content | Cast type  |
//! |----------|------------------|---------------|------------|
//! | String   | spaces, right    | spaces        | `Str`      |
//! | Integer  | `'0'`, left      | `'0'`, spaces | `Int`      |
//! | DateTime | none (exact)     | `'0'`, spaces | `DateTime` |

mod datetime;
mod padded;

use crate::error::{Result, XfwError};
use crate::value::Value;

/// Field variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Space-padded text.
    String,
    /// Zero-padded integer.
    Integer,
    /// Date/time rendered with a strftime-style format.
    DateTime {
        /// Format string.
        format: String,
    },
}

impl FieldKind {
    /// Characters that do not count as content when probing.
    fn blank_chars(&self) -> &'static [char] {
        match self {
            Self::String => &[' '],
            Self::Integer | Self::DateTime { .. } => &['0', ' '],
        }
    }
}

/// A fixed-width field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    kind: FieldKind,
    width: usize,
    truncate: bool,
    cast: bool,
}

impl Field {
    /// Create a string field.
    #[must_use]
    pub fn string(width: usize) -> Self {
        Self {
            kind: FieldKind::String,
            width,
            truncate: false,
            cast: false,
        }
    }

    /// Create an integer field.
    #[must_use]
    pub fn integer(width: usize) -> Self {
        Self {
            kind: FieldKind::Integer,
            width,
            truncate: false,
            cast: false,
        }
    }

    /// Create a date/time field; its width follows from `format`.
    pub fn datetime(format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        let width = datetime::format_width(&format)?;
        Ok(Self {
            kind: FieldKind::DateTime { format },
            width,
            truncate: false,
            cast: false,
        })
    }

    /// Silently cut oversized data instead of failing.
    ///
    /// Date/time fields reject this when their record is built, and refuse to
    /// render while it is set.
    #[must_use]
    pub fn with_truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Return native values from [`Field::parse`] instead of stripped text.
    #[must_use]
    pub fn with_cast(mut self, cast: bool) -> Self {
        self.cast = cast;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn truncate(&self) -> bool {
        self.truncate
    }

    #[must_use]
    pub fn cast(&self) -> bool {
        self.cast
    }

    /// Check the definition itself.
    ///
    /// `id` only serves error reporting.
    pub fn validate(&self, id: Option<&str>) -> Result<()> {
        if self.width == 0 {
            return Err(XfwError::ZeroWidth {
                id: id.map(str::to_string),
            });
        }
        if let FieldKind::DateTime { format } = &self.kind
            && self.truncate
        {
            return Err(XfwError::DateTimeTruncation {
                format: format.clone(),
            });
        }
        Ok(())
    }

    /// Render `value` as exactly [`Field::width`] bytes.
    ///
    /// `None` renders the variant default: blanks for strings, zero for
    /// integers, the all-zero null pattern for date/times.
    pub fn render(&self, value: Option<&Value>) -> Result<String> {
        match &self.kind {
            FieldKind::String => padded::render_string(self.width, self.truncate, value),
            FieldKind::Integer => padded::render_integer(self.width, self.truncate, value),
            FieldKind::DateTime { format } => self.render_datetime(format, value),
        }
    }

    fn render_datetime(&self, format: &str, value: Option<&Value>) -> Result<String> {
        if self.truncate {
            return Err(XfwError::DateTimeTruncation {
                format: format.to_string(),
            });
        }
        let rendered = match value {
            None => return Ok(self.null_pattern()),
            Some(Value::Str(s)) => {
                if s.len() != self.width {
                    return Err(XfwError::length_mismatch(self.width, s.len()));
                }
                return Ok(s.clone());
            }
            Some(Value::DateTime(dt)) => datetime::format_datetime(*dt, format)?,
            Some(other) => return Err(XfwError::type_mismatch("datetime", other)),
        };
        // Named months or years past 9999 change the width.
        if rendered.len() != self.width {
            return Err(XfwError::length_mismatch(self.width, rendered.len()));
        }
        Ok(rendered)
    }

    /// All-zero text standing for an absent date/time.
    fn null_pattern(&self) -> String {
        "0".repeat(self.width)
    }

    /// Parse text of exactly [`Field::width`] bytes.
    ///
    /// Returns `None` when the text stands for an absent value: blank
    /// strings, and date/times holding the null pattern. Blank integers parse
    /// as zero; cast integers outside the `i64` range come back as canonical
    /// digit text. Without `cast`, values come back as stripped text.
    pub fn parse(&self, text: &str) -> Result<Option<Value>> {
        match &self.kind {
            FieldKind::String => {
                if !self.probe(text) {
                    return Ok(None);
                }
                Ok(Some(Value::from(padded::strip_string(text))))
            }
            FieldKind::Integer => {
                let text = if self.probe(text) { text } else { "0" };
                let stripped = padded::strip_integer(text);
                if self.cast {
                    Ok(Some(padded::parse_integer(stripped)?))
                } else {
                    Ok(Some(Value::from(stripped)))
                }
            }
            FieldKind::DateTime { format } => {
                if !self.probe(text) {
                    return Ok(None);
                }
                if self.cast {
                    Ok(Some(Value::DateTime(datetime::parse_datetime(text, format)?)))
                } else {
                    Ok(Some(Value::from(text)))
                }
            }
        }
    }

    /// Whether `text` holds anything besides blank characters.
    #[must_use]
    pub fn probe(&self, text: &str) -> bool {
        let blank = self.kind.blank_chars();
        text.chars().any(|c| !blank.contains(&c))
    }
}
