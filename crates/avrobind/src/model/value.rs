//! Dynamic values.
//!
//! [`Value`] is the open destination: anything a schema can describe decodes
//! into it without a concrete Rust type.

use indexmap::IndexMap;

use crate::model::Timestamp;
use crate::util::datetime::format_date_rfc3339;

/// Kind of a decoded value, used in type-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Timestamp,
    Date,
    Time,
    Record,
    Map,
}

impl ValueKind {
    /// Returns the schema-facing name of this kind (e.g., "long").
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Bytes => "bytes",
            ValueKind::String => "string",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::Record => "record",
            ValueKind::Map => "map",
        }
    }
}

/// A decoded value of any shape.
///
/// Records keep their fields in schema declaration order; maps keep their
/// entries in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    /// A `timestamp-millis` / `timestamp-micros` instant.
    Timestamp(Timestamp),
    /// A `date`: days since the Unix epoch.
    Date(i32),
    /// A `time-millis` / `time-micros`: microseconds since midnight.
    Time(i64),
    Record(IndexMap<String, Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::String(_) => ValueKind::String,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::Record(_) => ValueKind::Record,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Builds a record value from `(name, value)` pairs.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a map value from `(key, value)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Looks up a record field or map entry by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) | Value::Map(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an `int` or `long`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is a `string`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders calendar values as RFC 3339 text; other kinds return `None`.
    pub fn to_rfc3339(&self) -> Option<String> {
        match self {
            Value::Timestamp(ts) => Some(ts.to_rfc3339()),
            Value::Date(days) => Some(format_date_rfc3339(*days)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order() {
        let value = Value::record([("b", Value::from("foo")), ("a", Value::from(27i64))]);
        let Value::Record(fields) = &value else {
            panic!("expected record");
        };
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(value.get("a").and_then(Value::as_i64), Some(27));
        assert_eq!(value.get("b").and_then(Value::as_str), Some("foo"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind().name(), "null");
        assert_eq!(Value::from(1i32).kind(), ValueKind::Int);
        assert_eq!(Value::map([("k", Value::Null)]).kind(), ValueKind::Map);
    }

    #[test]
    fn test_calendar_rendering() {
        assert_eq!(Value::Date(19797).to_rfc3339().as_deref(), Some("2024-03-15"));
        assert_eq!(
            Value::Timestamp(Timestamp::UNIX_EPOCH).to_rfc3339().as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(Value::Long(1).to_rfc3339(), None);
    }
}
