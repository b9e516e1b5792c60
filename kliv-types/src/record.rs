//! Opaque table rows.
//!
//! A record is whatever object the server returns. Only the reserved system
//! columns get typed accessors, and the client never writes them itself.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned row identifier.
pub const ROW_ID: &str = "_row_id";
/// Creation time, seconds since the Unix epoch.
pub const CREATED_AT: &str = "_created_at";
/// Last update time, seconds since the Unix epoch.
pub const UPDATED_AT: &str = "_updated_at";
/// Soft-delete flag (`0` or `1`).
pub const DELETED: &str = "_deleted";
/// Identifier of the creating user.
pub const CREATED_BY: &str = "_created_by";

/// All reserved system columns.
pub const SYSTEM_FIELDS: [&str; 5] = [ROW_ID, CREATED_AT, UPDATED_AT, DELETED, CREATED_BY];

/// A schema-agnostic row. Key order is preserved through serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Converts any serializable value that encodes as a JSON object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::try_from(serde_json::to_value(value)?)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the field as a string slice if it is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Inserts a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`Record::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The `_row_id` column. Numeric or string depending on the table.
    #[must_use]
    pub fn row_id(&self) -> Option<&Value> {
        self.0.get(ROW_ID)
    }

    #[must_use]
    pub fn created_at(&self) -> Option<i64> {
        self.0.get(CREATED_AT).and_then(as_i64)
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<i64> {
        self.0.get(UPDATED_AT).and_then(as_i64)
    }

    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.get_str(CREATED_BY)
    }

    /// Whether the server marked this row soft-deleted.
    ///
    /// Accepts `1`, `true` and `"1"`; anything else (including a missing
    /// column) reads as not deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        match self.0.get(DELETED) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Iterates the non-system fields.
    pub fn user_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| !SYSTEM_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::NotAnObject(json_kind(&other))),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
