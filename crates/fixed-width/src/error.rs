//! Error types for fixed-width encoding and decoding.

use thiserror::Error;

use crate::value::Value;

/// Broad classification of an [`XfwError`].
///
/// Configuration errors are raised while building layouts; every other kind
/// is raised while rendering, parsing or moving bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid field, record or file layout.
    Configuration,
    /// Rendered data does not fit its field and truncation is disabled.
    DataTooLong,
    /// Value of the wrong native type, or text not convertible to it.
    Type,
    /// Input of the wrong fixed length.
    Length,
    /// Separator bytes not found where expected.
    Separator,
    /// Mandatory field missing or blank.
    MandatoryField,
    /// Constrained field holding something other than its constant.
    FixedValue,
    /// Layout accounting bug detected after generation.
    InternalConsistency,
    /// Header and items disagree.
    Structure,
    /// Computed digest differs from the expected one.
    Checksum,
    /// Underlying stream failure.
    Io,
}

/// Errors that can occur when building layouts or processing fixed-width data.
#[derive(Debug, Error)]
pub enum XfwError {
    /// Field id used twice in one flattened record (or equal to the padding id).
    #[error("field {id:?} already present")]
    DuplicateField { id: String },

    /// Fields and separators need more room than the record provides.
    #[error("maximum length exceeded: {used}, limit is {limit}")]
    WidthExceeded { used: usize, limit: usize },

    /// Field declared with zero width.
    #[error("field {} has zero width", describe_id(.id.as_deref()))]
    ZeroWidth { id: Option<String> },

    /// Item count field given without item layout, or the reverse.
    #[error("inconsistent values for item count field and item layout")]
    InconsistentItemLayout,

    /// Date/time format rejected by the formatter.
    #[error("invalid date/time format {format:?}")]
    InvalidDateFormat { format: String },

    /// Date/time field configured to truncate.
    #[error("date/time field with format {format:?} cannot truncate")]
    DateTimeTruncation { format: String },

    /// Rendered value wider than its field.
    #[error("data too long to fit field width: {actual}, {width} available (data: {data:?})")]
    DataTooLong {
        width: usize,
        actual: usize,
        data: String,
    },

    /// Value of the wrong native type.
    #[error("expected {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Text that is not an integer.
    #[error("invalid integer: {text:?}")]
    InvalidInteger { text: String },

    /// Text that does not match a date/time format.
    #[error("cannot parse {text:?} with date/time format {format:?}")]
    InvalidDateTime { text: String, format: String },

    /// Input length differs from the fixed width.
    #[error("data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Fixed-width bytes are not valid UTF-8, or a slice splits a character.
    #[error("invalid UTF-8 in fixed-width data at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// Unexpected bytes where a separator belongs.
    #[error("separator {expected:?} expected{}, got {found:?}", describe_offset(.offset))]
    SeparatorMismatch {
        expected: String,
        found: String,
        offset: Option<u64>,
    },

    /// Mandatory field absent on generate, or blank on parse.
    #[error("field {id:?} is mandatory")]
    MandatoryFieldMissing { id: String },

    /// Fixed value differs from its declared constant.
    #[error("{id:?}: expected {expected}, got {}", describe_slot(.actual.as_ref()))]
    FixedValueMismatch {
        id: String,
        expected: Value,
        actual: Option<Value>,
    },

    /// Generated record length differs from the declared total length.
    #[error("internal consistency error: rendered string length {actual}, expected {expected}")]
    InternalConsistency { expected: usize, actual: usize },

    /// Item list handed to a layout that has no items.
    #[error("this file layout does not accept items")]
    ItemsNotAllowed,

    /// Item count resolved without an item layout.
    #[error("{count} items declared but no item layout available")]
    MissingItemLayout { count: usize },

    /// Header count field holding something that is not a usable count.
    #[error("invalid item count in field {id:?}: {value}")]
    InvalidItemCount { id: String, value: String },

    /// Digest verification failed.
    #[error("checksum verification failed: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fixed-width operations.
pub type Result<T> = std::result::Result<T, XfwError>;

impl XfwError {
    /// Create a DataTooLong error.
    pub fn data_too_long(width: usize, data: impl Into<String>) -> Self {
        let data = data.into();
        Self::DataTooLong {
            width,
            actual: data.len(),
            data,
        }
    }

    /// Create a TypeMismatch error.
    pub fn type_mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }

    /// Create a LengthMismatch error.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create a SeparatorMismatch error.
    pub fn separator_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        offset: Option<u64>,
    ) -> Self {
        Self::SeparatorMismatch {
            expected: expected.into(),
            found: found.into(),
            offset,
        }
    }

    /// Create a MandatoryFieldMissing error.
    pub fn mandatory_missing(id: impl Into<String>) -> Self {
        Self::MandatoryFieldMissing { id: id.into() }
    }

    /// Create a DuplicateField error.
    pub fn duplicate_field(id: impl Into<String>) -> Self {
        Self::DuplicateField { id: id.into() }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateField { .. }
            | Self::WidthExceeded { .. }
            | Self::ZeroWidth { .. }
            | Self::InconsistentItemLayout
            | Self::InvalidDateFormat { .. }
            | Self::DateTimeTruncation { .. } => ErrorKind::Configuration,
            Self::DataTooLong { .. } => ErrorKind::DataTooLong,
            Self::TypeMismatch { .. }
            | Self::InvalidInteger { .. }
            | Self::InvalidDateTime { .. } => ErrorKind::Type,
            Self::LengthMismatch { .. } | Self::InvalidUtf8 { .. } => ErrorKind::Length,
            Self::SeparatorMismatch { .. } => ErrorKind::Separator,
            Self::MandatoryFieldMissing { .. } => ErrorKind::MandatoryField,
            Self::FixedValueMismatch { .. } => ErrorKind::FixedValue,
            Self::InternalConsistency { .. } => ErrorKind::InternalConsistency,
            Self::ItemsNotAllowed
            | Self::MissingItemLayout { .. }
            | Self::InvalidItemCount { .. } => ErrorKind::Structure,
            Self::ChecksumMismatch { .. } => ErrorKind::Checksum,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether this error was raised while building a layout.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

fn describe_id(id: Option<&str>) -> String {
    id.map_or_else(|| "<anonymous>".to_string(), |id| format!("{id:?}"))
}

fn describe_offset(offset: &Option<u64>) -> String {
    offset.map(|at| format!(" at {at}")).unwrap_or_default()
}

fn describe_slot(value: Option<&Value>) -> String {
    value.map_or_else(|| "nothing".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XfwError::length_mismatch(7, 6);
        assert_eq!(format!("{err}"), "data length mismatch: expected 7, got 6");

        let err = XfwError::data_too_long(5, "abcdefgh");
        assert_eq!(
            format!("{err}"),
            "data too long to fit field width: 8, 5 available (data: \"abcdefgh\")"
        );
    }

    #[test]
    fn test_separator_offset_in_message() {
        let err = XfwError::separator_mismatch("|", "-", Some(42));
        assert_eq!(format!("{err}"), "separator \"|\" expected at 42, got \"-\"");

        let err = XfwError::separator_mismatch("|", "-", None);
        assert_eq!(format!("{err}"), "separator \"|\" expected, got \"-\"");
    }

    #[test]
    fn test_fixed_value_message() {
        let err = XfwError::FixedValueMismatch {
            id: "kind".to_string(),
            expected: Value::from("HD"),
            actual: None,
        };
        assert_eq!(format!("{err}"), "\"kind\": expected HD, got nothing");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "test");
        let err: XfwError = io_err.into();
        assert!(matches!(err, XfwError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_kind_classification() {
        assert!(XfwError::duplicate_field("a").is_configuration());
        assert!(XfwError::InconsistentItemLayout.is_configuration());
        assert_eq!(
            XfwError::mandatory_missing("a").kind(),
            ErrorKind::MandatoryField
        );
        assert_eq!(
            XfwError::InternalConsistency {
                expected: 1,
                actual: 2
            }
            .kind(),
            ErrorKind::InternalConsistency
        );
        assert!(!XfwError::length_mismatch(1, 2).is_configuration());
    }
}
