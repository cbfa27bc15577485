//! Fixed-length records made of ordered fields.
//!
//! A record maps [`Values`] to text of exactly `total_length` bytes and back.
//!
//! # Layout
//!
//! ```text
//! FIELD SEP FIELD SEP ... FIELD [FILLER | BLANKS]
//! ```
//!
//! Separators only sit between fields. Width left over once fields and
//! separators are placed becomes either a named string filler (when a padding
//! id is given) or anonymous blanks. Neither is separator-delimited. Anonymous
//! blanks are written on generate but their content is not checked on parse.
//!
//! Nested records are flattened when the outer record is built: their fields
//! (and their named filler, if any) are spliced in place. Their anonymous
//! blanks and their separator are dropped, and their fixed values are merged
//! without overriding the outer ones.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use crate::error::{Result, XfwError};
use crate::field::Field;
use crate::stream::RecordRead;
use crate::value::{Value, Values};

/// One field of a record with its presence rule and optional id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    field: Field,
    mandatory: bool,
    id: Option<String>,
}

impl FieldEntry {
    /// Create an entry.
    pub fn new(field: Field, mandatory: bool, id: Option<String>) -> Self {
        Self {
            field,
            mandatory,
            id,
        }
    }

    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[must_use]
    pub fn mandatory(&self) -> bool {
        self.mandatory
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.field.width()
    }
}

/// Element of a record description: a field, or a record to splice in.
#[derive(Debug, Clone)]
pub enum Entry {
    Field(FieldEntry),
    Record(Record),
}

impl From<FieldEntry> for Entry {
    fn from(entry: FieldEntry) -> Self {
        Self::Field(entry)
    }
}

impl From<Record> for Entry {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

/// A flattened, fixed-length record layout.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<FieldEntry>,
    filler: Option<FieldEntry>,
    padding_length: usize,
    total_length: usize,
    separator: String,
    fixed_values: BTreeMap<String, Value>,
}

impl Record {
    /// Start describing a record of `total_length` bytes.
    #[must_use]
    pub fn builder(total_length: usize) -> RecordBuilder {
        RecordBuilder::new(total_length)
    }

    #[must_use]
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Width of anonymous trailing blanks.
    #[must_use]
    pub fn padding_length(&self) -> usize {
        self.padding_length
    }

    /// Flattened fields in order, without the padding filler.
    #[must_use]
    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }

    /// Named padding filler, if any.
    #[must_use]
    pub fn filler(&self) -> Option<&FieldEntry> {
        self.filler.as_ref()
    }

    /// Merged fixed values.
    #[must_use]
    pub fn fixed_values(&self) -> &BTreeMap<String, Value> {
        &self.fixed_values
    }

    /// Ids of all id-bearing fields, filler included, in layout order.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .chain(self.filler.iter())
            .filter_map(FieldEntry::id)
    }

    /// Render `values` as exactly `total_length` bytes.
    ///
    /// Fixed values missing from `values` are used as defaults; present ones
    /// must match. Optional fields without a value render their default.
    pub fn generate(&self, values: &Values) -> Result<String> {
        self.check_fixed_values(values)?;

        let mut rendered = String::with_capacity(self.total_length);
        for (index, entry) in self.fields.iter().enumerate() {
            if index > 0 {
                rendered.push_str(&self.separator);
            }
            rendered.push_str(&self.render_entry(entry, values)?);
        }
        if let Some(filler) = &self.filler {
            rendered.push_str(&self.render_entry(filler, values)?);
        }
        rendered.extend(std::iter::repeat_n(' ', self.padding_length));

        if rendered.len() != self.total_length {
            return Err(XfwError::InternalConsistency {
                expected: self.total_length,
                actual: rendered.len(),
            });
        }
        Ok(rendered)
    }

    /// Parse text of exactly `total_length` bytes.
    ///
    /// The result holds a slot for every id-bearing field plus every fixed
    /// value.
    pub fn parse(&self, text: &str) -> Result<Values> {
        if text.len() != self.total_length {
            return Err(XfwError::length_mismatch(self.total_length, text.len()));
        }

        let mut values = Values::new();
        let mut offset = 0usize;
        for (index, entry) in self.fields.iter().enumerate() {
            if index > 0 {
                let found = slice(text, offset, self.separator.len())?;
                if found != self.separator {
                    return Err(XfwError::separator_mismatch(
                        self.separator.as_str(),
                        found,
                        Some(offset as u64),
                    ));
                }
                offset += self.separator.len();
            }
            parse_entry(entry, slice(text, offset, entry.width())?, &mut values)?;
            offset += entry.width();
        }
        if let Some(filler) = &self.filler {
            parse_entry(filler, slice(text, offset, filler.width())?, &mut values)?;
            offset += filler.width();
        }

        if offset + self.padding_length != self.total_length {
            return Err(XfwError::InternalConsistency {
                expected: self.total_length,
                actual: offset + self.padding_length,
            });
        }

        self.apply_fixed_values(&mut values)?;
        Ok(values)
    }

    /// Read exactly `total_length` bytes from `stream` and parse them.
    pub fn parse_stream<R: RecordRead + ?Sized>(&self, stream: &mut R) -> Result<Values> {
        let bytes = stream.read_chunk(self.total_length)?;
        let text = String::from_utf8(bytes).map_err(|e| XfwError::InvalidUtf8 {
            offset: e.utf8_error().valid_up_to(),
        })?;
        self.parse(&text)
    }

    /// Generate `values` and write them to `stream`.
    pub fn generate_stream<W: Write + ?Sized>(&self, stream: &mut W, values: &Values) -> Result<()> {
        let rendered = self.generate(values)?;
        stream.write_all(rendered.as_bytes())?;
        Ok(())
    }

    fn render_entry(&self, entry: &FieldEntry, values: &Values) -> Result<String> {
        let Some(id) = entry.id() else {
            return entry.field.render(None);
        };
        match values.get(id).or_else(|| self.fixed_values.get(id)) {
            Some(value) => entry.field.render(Some(value)),
            None if entry.mandatory => Err(XfwError::mandatory_missing(id)),
            None => entry.field.render(None),
        }
    }

    fn check_fixed_values(&self, values: &Values) -> Result<()> {
        for (id, expected) in &self.fixed_values {
            if let Some(actual) = values.slot(id)
                && actual.as_ref() != Some(expected)
            {
                return Err(XfwError::FixedValueMismatch {
                    id: id.clone(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
        }
        Ok(())
    }

    fn apply_fixed_values(&self, values: &mut Values) -> Result<()> {
        self.check_fixed_values(values)?;
        for (id, expected) in &self.fixed_values {
            if !values.contains_key(id) {
                values.insert(id.clone(), Some(expected.clone()));
            }
        }
        Ok(())
    }
}

/// Store the parsed value of an id-bearing field.
fn parse_entry(entry: &FieldEntry, text: &str, values: &mut Values) -> Result<()> {
    let Some(id) = entry.id() else {
        return Ok(());
    };
    let parsed = entry.field.parse(text)?;
    if parsed.is_none() && entry.mandatory {
        return Err(XfwError::mandatory_missing(id));
    }
    values.insert(id, parsed);
    Ok(())
}

fn slice(text: &str, offset: usize, len: usize) -> Result<&str> {
    text.get(offset..offset + len)
        .ok_or(XfwError::InvalidUtf8 { offset })
}

/// Builder for [`Record`].
///
/// ```
/// use fixed_width::{Field, Record, Values};
///
/// let record = Record::builder(12)
///     .separator("|")
///     .mandatory(Field::string(3), "code")
///     .field(Field::integer(4).with_cast(true), "qty")
///     .build()
///     .unwrap();
///
/// let line = record
///     .generate(&Values::new().with("code", "AB").with("qty", 7))
///     .unwrap();
/// assert_eq!(line, "AB |0007    ");
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    entries: Vec<Entry>,
    total_length: usize,
    separator: String,
    padding_id: Option<String>,
    fixed_values: BTreeMap<String, Value>,
}

impl RecordBuilder {
    /// Create a builder for a record of `total_length` bytes.
    #[must_use]
    pub fn new(total_length: usize) -> Self {
        Self {
            entries: Vec::new(),
            total_length,
            separator: String::new(),
            padding_id: None,
            fixed_values: BTreeMap::new(),
        }
    }

    /// Separator placed between fields.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Add an optional field.
    #[must_use]
    pub fn field(self, field: Field, id: impl Into<String>) -> Self {
        self.entry(FieldEntry::new(field, false, Some(id.into())))
    }

    /// Add a mandatory field.
    #[must_use]
    pub fn mandatory(self, field: Field, id: impl Into<String>) -> Self {
        self.entry(FieldEntry::new(field, true, Some(id.into())))
    }

    /// Add a field without id: always rendered as its default, never stored.
    #[must_use]
    pub fn anonymous(self, field: Field) -> Self {
        self.entry(FieldEntry::new(field, false, None))
    }

    /// Splice the fields of another record in place.
    #[must_use]
    pub fn nested(self, record: Record) -> Self {
        self.entry(record)
    }

    #[must_use]
    pub fn entry(mut self, entry: impl Into<Entry>) -> Self {
        self.entries.push(entry.into());
        self
    }

    /// Name the residual width as a string field instead of anonymous blanks.
    #[must_use]
    pub fn padding_id(mut self, id: impl Into<String>) -> Self {
        self.padding_id = Some(id.into());
        self
    }

    /// Constrain `id` to always hold `value`.
    #[must_use]
    pub fn fixed_value(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fixed_values.insert(id.into(), value.into());
        self
    }

    /// Flatten and check the layout.
    pub fn build(self) -> Result<Record> {
        let mut fixed_values = self.fixed_values;
        let mut fields = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Field(entry) => {
                    entry.field.validate(entry.id())?;
                    fields.push(entry);
                }
                Entry::Record(nested) => {
                    for (id, value) in nested.fixed_values {
                        fixed_values.entry(id).or_insert(value);
                    }
                    fields.extend(nested.fields);
                    fields.extend(nested.filler);
                }
            }
        }

        let mut seen = HashSet::new();
        if let Some(padding_id) = &self.padding_id {
            seen.insert(padding_id.as_str());
        }
        for id in fields.iter().filter_map(FieldEntry::id) {
            if !seen.insert(id) {
                return Err(XfwError::duplicate_field(id));
            }
        }

        let separators = self.separator.len() * fields.len().saturating_sub(1);
        let used = fields.iter().map(FieldEntry::width).sum::<usize>() + separators;
        if used > self.total_length {
            return Err(XfwError::WidthExceeded {
                used,
                limit: self.total_length,
            });
        }

        let residual = self.total_length - used;
        let (filler, padding_length) = match self.padding_id {
            Some(id) => (
                Some(FieldEntry::new(Field::string(residual), false, Some(id))),
                0,
            ),
            None => (None, residual),
        };

        Ok(Record {
            fields,
            filler,
            padding_length,
            total_length: self.total_length,
            separator: self.separator,
            fixed_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_fields() -> Record {
        Record::builder(7)
            .separator("|")
            .field(Field::string(3), "a")
            .field(Field::string(3), "b")
            .build()
            .unwrap()
    }

    #[test]
    fn test_separator_enforcement() {
        let record = two_fields();

        let values = record.parse("abc|def").unwrap();
        assert_eq!(values.get_str("a"), Some("abc"));
        assert_eq!(values.get_str("b"), Some("def"));

        assert!(matches!(
            record.parse("abc-def"),
            Err(XfwError::SeparatorMismatch {
                offset: Some(3),
                ..
            })
        ));
        assert!(matches!(
            record.parse("abcXdef "),
            Err(XfwError::LengthMismatch {
                expected: 7,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_generate_joins_with_separator() {
        let record = two_fields();
        let values = Values::new().with("a", "x").with("b", "yz");
        assert_eq!(record.generate(&values).unwrap(), "x  |yz ");
    }

    #[test]
    fn test_residual_blank_padding() {
        let record = Record::builder(10)
            .separator("|")
            .field(Field::string(2), "a")
            .field(Field::string(2), "b")
            .build()
            .unwrap();
        assert_eq!(record.padding_length(), 5);

        let rendered = record
            .generate(&Values::new().with("a", "ab").with("b", "cd"))
            .unwrap();
        assert_eq!(rendered, "ab|cd     ");

        // Residual content is not checked.
        let values = record.parse("ab|cdXXXXX").unwrap();
        assert_eq!(values.get_str("b"), Some("cd"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_named_padding() {
        let record = Record::builder(8)
            .field(Field::string(3), "a")
            .padding_id("rest")
            .build()
            .unwrap();
        assert_eq!(record.padding_length(), 0);
        assert_eq!(record.filler().map(FieldEntry::width), Some(5));

        let values = record.parse("abcnote ").unwrap();
        assert_eq!(values.get_str("rest"), Some("note"));

        let rendered = record.generate(&Values::new().with("a", "x")).unwrap();
        assert_eq!(rendered, "x       ");
        assert_eq!(record.parse(&rendered).unwrap().slot("rest"), Some(&None));
    }

    #[test]
    fn test_width_exceeded() {
        let err = Record::builder(6)
            .separator("|")
            .field(Field::string(3), "a")
            .field(Field::string(3), "b")
            .build()
            .unwrap_err();
        assert!(matches!(err, XfwError::WidthExceeded { used: 7, limit: 6 }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_ids() {
        let err = Record::builder(10)
            .field(Field::string(3), "a")
            .field(Field::string(3), "a")
            .build()
            .unwrap_err();
        assert!(matches!(err, XfwError::DuplicateField { .. }));

        let err = Record::builder(10)
            .field(Field::string(3), "pad")
            .padding_id("pad")
            .build()
            .unwrap_err();
        assert!(matches!(err, XfwError::DuplicateField { .. }));
    }

    #[test]
    fn test_mandatory_fields() {
        let record = Record::builder(4)
            .mandatory(Field::string(4), "name")
            .build()
            .unwrap();

        assert!(matches!(
            record.generate(&Values::new()),
            Err(XfwError::MandatoryFieldMissing { .. })
        ));
        assert!(matches!(
            record.generate(&Values::new().with_null("name")),
            Err(XfwError::MandatoryFieldMissing { .. })
        ));
        assert!(matches!(
            record.parse("    "),
            Err(XfwError::MandatoryFieldMissing { .. })
        ));
    }

    #[test]
    fn test_mandatory_zero_integer_is_a_value() {
        let record = Record::builder(3)
            .mandatory(Field::integer(3).with_cast(true), "n")
            .build()
            .unwrap();
        assert_eq!(record.parse("000").unwrap().get_int("n"), Some(0));
    }

    #[test]
    fn test_optional_blank_parses_as_none() {
        let record = Record::builder(12)
            .field(Field::string(4), "s")
            .field(Field::datetime("%Y%m%d").unwrap(), "d")
            .build()
            .unwrap();
        let values = record.parse("    00000000").unwrap();
        assert_eq!(values.slot("s"), Some(&None));
        assert_eq!(values.slot("d"), Some(&None));
    }

    #[test]
    fn test_fixed_values() {
        let record = Record::builder(5)
            .mandatory(Field::string(2), "kind")
            .field(Field::integer(3).with_cast(true), "n")
            .fixed_value("kind", "HD")
            .build()
            .unwrap();

        // Missing fixed value is defaulted.
        assert_eq!(record.generate(&Values::new().with("n", 4)).unwrap(), "HD004");

        let err = record
            .generate(&Values::new().with("kind", "XX"))
            .unwrap_err();
        assert!(matches!(err, XfwError::FixedValueMismatch { .. }));

        let values = record.parse("HD012").unwrap();
        assert_eq!(values.get_str("kind"), Some("HD"));
        assert!(matches!(
            record.parse("XX012"),
            Err(XfwError::FixedValueMismatch { .. })
        ));
    }

    #[test]
    fn test_fixed_value_without_field_is_added_on_parse() {
        let record = Record::builder(2)
            .field(Field::string(2), "a")
            .fixed_value("version", 3)
            .build()
            .unwrap();
        let values = record.parse("ok").unwrap();
        assert_eq!(values.get_int("version"), Some(3));
    }

    #[test]
    fn test_nested_record_is_spliced() {
        let inner = Record::builder(8)
            .separator("#")
            .field(Field::string(2), "x")
            .field(Field::string(2), "y")
            .fixed_value("x", "AA")
            .build()
            .unwrap();
        assert_eq!(inner.padding_length(), 3);

        let outer = Record::builder(12)
            .separator("|")
            .field(Field::string(1), "head")
            .nested(inner)
            .fixed_value("x", "BB")
            .build()
            .unwrap();

        // head | x | y, then 5 outer blanks; the inner blanks are gone.
        let ids: Vec<_> = outer.field_ids().collect();
        assert_eq!(ids, ["head", "x", "y"]);
        assert_eq!(outer.fields().len(), 3);
        assert_eq!(outer.padding_length(), 5);
        assert_eq!(outer.fixed_values().get("x"), Some(&Value::from("BB")));

        let rendered = outer
            .generate(&Values::new().with("head", "H").with("y", "cd"))
            .unwrap();
        assert_eq!(rendered, "H|BB|cd     ");
    }

    #[test]
    fn test_nested_record_width_counts_fields_only() {
        let inner = Record::builder(8)
            .field(Field::string(2), "x")
            .field(Field::string(2), "y")
            .build()
            .unwrap();
        let outer = Record::builder(5)
            .nested(inner)
            .field(Field::string(1), "z")
            .build()
            .unwrap();
        assert_eq!(outer.padding_length(), 0);

        let values = Values::new().with("x", "ab").with("y", "cd").with("z", "e");
        assert_eq!(outer.generate(&values).unwrap(), "abcde");
        assert_eq!(outer.parse("abcde").unwrap(), values);
    }

    #[test]
    fn test_anonymous_field_is_not_stored() {
        let record = Record::builder(6)
            .anonymous(Field::string(2))
            .field(Field::string(4), "a")
            .build()
            .unwrap();
        assert_eq!(record.generate(&Values::new().with("a", "abcd")).unwrap(), "  abcd");

        let values = record.parse("zzabcd").unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_slice() {
        let record = Record::builder(2)
            .field(Field::string(1), "a")
            .field(Field::string(1), "b")
            .build()
            .unwrap();
        assert!(matches!(
            record.parse("é"),
            Err(XfwError::InvalidUtf8 { offset: 0 })
        ));
    }

    #[test]
    fn test_stream_roundtrip() {
        let record = two_fields();
        let mut out = Vec::new();
        record
            .generate_stream(&mut out, &Values::new().with("a", "abc").with("b", "def"))
            .unwrap();
        assert_eq!(out, b"abc|def");

        let mut source: &[u8] = &out;
        let values = record.parse_stream(&mut source).unwrap();
        assert_eq!(values.get_str("b"), Some("def"));

        let mut short: &[u8] = b"abc|";
        assert!(matches!(
            record.parse_stream(&mut short),
            Err(XfwError::LengthMismatch { .. })
        ));
    }
}
