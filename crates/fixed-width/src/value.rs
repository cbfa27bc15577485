//! Typed values exchanged with fields and records.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// A single field value.
///
/// `Float` is only accepted as render input (by truncating integer fields);
/// parsing never produces it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Date and time value.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Text content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float content, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Date/time content, if this is a date/time.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::DateTime(value.and_time(chrono::NaiveTime::MIN))
    }
}

/// Named values of one record.
///
/// Each id maps to a slot that is either a value or `None` (absent). Parsing
/// always fills a slot for every id-bearing field of the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    slots: BTreeMap<String, Option<Value>>,
}

impl Values {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(id, value);
        self
    }

    /// Add an absent slot, builder style.
    #[must_use]
    pub fn with_null(mut self, id: impl Into<String>) -> Self {
        self.slots.insert(id.into(), None);
        self
    }

    /// Set a value.
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<Value>) {
        self.slots.insert(id.into(), Some(value.into()));
    }

    /// Set a slot, returning the previous one.
    pub fn insert(&mut self, id: impl Into<String>, slot: Option<Value>) -> Option<Option<Value>> {
        self.slots.insert(id.into(), slot)
    }

    /// Remove a slot.
    pub fn remove(&mut self, id: &str) -> Option<Option<Value>> {
        self.slots.remove(id)
    }

    /// Value under `id`; `None` when the id is missing or its slot is absent.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Raw slot under `id`, distinguishing a missing id from an absent value.
    #[must_use]
    pub fn slot(&self, id: &str) -> Option<&Option<Value>> {
        self.slots.get(id)
    }

    /// Text under `id`.
    #[must_use]
    pub fn get_str(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(Value::as_str)
    }

    /// Integer under `id`.
    #[must_use]
    pub fn get_int(&self, id: &str) -> Option<i64> {
        self.get(id).and_then(Value::as_int)
    }

    /// Date/time under `id`.
    #[must_use]
    pub fn get_datetime(&self, id: &str) -> Option<NaiveDateTime> {
        self.get(id).and_then(Value::as_datetime)
    }

    /// Whether `id` has a slot, even an absent one.
    #[must_use]
    pub fn contains_key(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over ids and slots in id order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Option<Value>> {
        self.slots.iter()
    }

    /// Iterate over ids in order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Option<Value>> {
        self.slots.keys()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Values {
    type Item = (String, Option<Value>);
    type IntoIter = btree_map::IntoIter<String, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a String, &'a Option<Value>);
    type IntoIter = btree_map::Iter<'a, String, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from("abc"), Value::Str("abc".to_string()));
        assert_eq!(Value::from(7), Value::Int(7));
        assert_eq!(Value::from(7u32), Value::Int(7));
        assert_eq!(Value::from(1.5), Value::Float(1.5));

        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            Value::from(date).as_datetime(),
            Some(date.and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_slot_versus_missing() {
        let values = Values::new().with("a", 1).with_null("b");

        assert_eq!(values.get_int("a"), Some(1));
        assert_eq!(values.get("b"), None);
        assert_eq!(values.slot("b"), Some(&None));
        assert_eq!(values.slot("c"), None);
        assert!(values.contains_key("b"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_typed_accessors_reject_other_types() {
        let values = Values::new().with("name", "ACME");
        assert_eq!(values.get_str("name"), Some("ACME"));
        assert_eq!(values.get_int("name"), None);
        assert_eq!(values.get_datetime("name"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(-3).to_string(), "-3");
    }
}
