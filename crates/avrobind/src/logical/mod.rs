//! Logical type projection.
//!
//! A logical tag refines how a decoded primitive is interpreted, e.g.
//! `timestamp-millis` turns a `long` into a [`Timestamp`]. Tags are
//! advisory: a tag with no registered projection passes the value through
//! unchanged.
//!
//! Tags may carry the base type as a prefix (`long.timestamp-millis`).
//! Lookup tries the full tag first, then the part after a primitive-name
//! prefix.

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::error::{DecodeError, EncodeError};
use crate::model::{Timestamp, Value};
use crate::schema::PrimitiveKind;

const MILLIS_PER_DAY: i64 = 86_400_000;
const MICROS_PER_DAY: i64 = 86_400_000_000;

/// A pure transform from a decoded primitive to its logical value.
///
/// The error string becomes the reason of
/// [`DecodeError::LogicalTypeConversion`].
pub type Projection = fn(Value) -> Result<Value, String>;

lazy_static! {
    static ref DEFAULT_LOGICAL_TYPES: LogicalTypes = LogicalTypes::with_defaults();
}

/// Returns the process-wide registry of built-in logical types.
pub fn default_logical_types() -> &'static LogicalTypes {
    &DEFAULT_LOGICAL_TYPES
}

/// Registry of logical type projections, keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct LogicalTypes {
    projections: FxHashMap<String, Projection>,
}

impl LogicalTypes {
    /// Creates an empty registry; every tag passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in logical types.
    pub fn with_defaults() -> Self {
        let mut types = Self::new();
        types.register("timestamp-millis", project_timestamp_millis);
        types.register("timestamp-micros", project_timestamp_micros);
        types.register("date", project_date);
        types.register("time-millis", project_time_millis);
        types.register("time-micros", project_time_micros);
        types
    }

    /// Registers (or replaces) the projection for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, projection: Projection) {
        self.projections.insert(tag.into(), projection);
    }

    /// Returns true if `tag` has a registered projection.
    pub fn contains(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }

    fn lookup(&self, tag: &str) -> Option<Projection> {
        self.projections
            .get(tag)
            .or_else(|| self.projections.get(base_tag(tag)))
            .copied()
    }

    /// Applies the projection registered for `tag` to `value`.
    pub fn project(&self, tag: &str, value: Value) -> Result<Value, DecodeError> {
        match self.lookup(tag) {
            Some(projection) => {
                projection(value).map_err(|reason| DecodeError::LogicalTypeConversion {
                    tag: tag.to_string(),
                    reason,
                })
            }
            None => {
                tracing::trace!(tag, "unknown logical type, passing value through");
                Ok(value)
            }
        }
    }
}

/// Strips a primitive-name prefix (`long.timestamp-millis` → `timestamp-millis`).
fn base_tag(tag: &str) -> &str {
    match tag.split_once('.') {
        Some((prefix, rest)) if PrimitiveKind::from_name(prefix).is_some() => rest,
        _ => tag,
    }
}

fn project_timestamp_millis(value: Value) -> Result<Value, String> {
    match value {
        Value::Long(ms) => Timestamp::from_epoch_millis(ms)
            .map(Value::Timestamp)
            .ok_or_else(|| format!("{} ms is outside the timestamp range", ms)),
        Value::String(s) => Timestamp::parse_rfc3339(&s)
            .map(Value::Timestamp)
            .map_err(|e| e.to_string()),
        other => Err(format!("cannot read {} as a timestamp", other.kind().name())),
    }
}

fn project_timestamp_micros(value: Value) -> Result<Value, String> {
    match value {
        Value::Long(us) => Timestamp::from_epoch_micros(us)
            .map(Value::Timestamp)
            .ok_or_else(|| format!("{} us is outside the timestamp range", us)),
        Value::String(s) => Timestamp::parse_rfc3339(&s)
            .map(Value::Timestamp)
            .map_err(|e| e.to_string()),
        other => Err(format!("cannot read {} as a timestamp", other.kind().name())),
    }
}

fn project_date(value: Value) -> Result<Value, String> {
    match value {
        Value::Int(days) => Ok(Value::Date(days)),
        other => Err(format!("cannot read {} as a date", other.kind().name())),
    }
}

fn project_time_millis(value: Value) -> Result<Value, String> {
    match value {
        Value::Int(ms) if (0..MILLIS_PER_DAY).contains(&(ms as i64)) => {
            Ok(Value::Time(ms as i64 * 1_000))
        }
        Value::Int(ms) => Err(format!("{} ms is not a time of day", ms)),
        other => Err(format!("cannot read {} as a time", other.kind().name())),
    }
}

fn project_time_micros(value: Value) -> Result<Value, String> {
    match value {
        Value::Long(us) if (0..MICROS_PER_DAY).contains(&us) => Ok(Value::Time(us)),
        Value::Long(us) => Err(format!("{} us is not a time of day", us)),
        other => Err(format!("cannot read {} as a time", other.kind().name())),
    }
}

/// Converts a logical value back to the primitive its base schema encodes.
///
/// Values that are already primitives pass through unchanged.
pub fn unproject(tag: &str, base: PrimitiveKind, value: Value) -> Result<Value, EncodeError> {
    let mismatch = |found: &Value| EncodeError::LogicalTypeConversion {
        tag: tag.to_string(),
        found: found.kind().name(),
    };

    match (value, base) {
        (Value::Timestamp(ts), PrimitiveKind::Long) => {
            if base_tag(tag) == "timestamp-micros" {
                Ok(Value::Long(ts.epoch_micros()))
            } else {
                Ok(Value::Long(ts.epoch_millis()))
            }
        }
        (Value::Timestamp(ts), PrimitiveKind::String) => Ok(Value::String(ts.to_rfc3339())),
        (Value::Date(days), PrimitiveKind::Int) => Ok(Value::Int(days)),
        (value @ Value::Time(us), PrimitiveKind::Int) => i32::try_from(us / 1_000)
            .map(Value::Int)
            .map_err(|_| mismatch(&value)),
        (Value::Time(us), PrimitiveKind::Long) => Ok(Value::Long(us)),
        (value @ (Value::Timestamp(_) | Value::Date(_) | Value::Time(_)), _) => {
            Err(mismatch(&value))
        }
        (value, _) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_millis() {
        let types = LogicalTypes::with_defaults();
        let value = types
            .project("timestamp-millis", Value::Long(1_658_335_430_564))
            .unwrap();
        assert_eq!(
            value,
            Value::Timestamp(Timestamp::from_epoch_millis(1_658_335_430_564).unwrap())
        );
    }

    #[test]
    fn test_prefixed_tag() {
        let types = default_logical_types();
        assert!(types.contains("long.timestamp-millis"));
        assert!(!types.contains("uuid.timestamp-millis"));
        let value = types
            .project("string.timestamp-millis", Value::from("2022-07-20T16:43:50Z"))
            .unwrap();
        assert_eq!(value.to_rfc3339().as_deref(), Some("2022-07-20T16:43:50Z"));
    }

    #[test]
    fn test_unknown_tag_passes_through() {
        let types = default_logical_types();
        assert_eq!(
            types.project("uuid", Value::from("abc")).unwrap(),
            Value::from("abc")
        );
        let empty = LogicalTypes::new();
        assert_eq!(
            empty.project("timestamp-millis", Value::Long(5)).unwrap(),
            Value::Long(5)
        );
    }

    #[test]
    fn test_timestamp_overflow() {
        let types = default_logical_types();
        let err = types
            .project("timestamp-millis", Value::Long(i64::MAX))
            .unwrap_err();
        assert!(matches!(err, DecodeError::LogicalTypeConversion { ref tag, .. } if tag == "timestamp-millis"));
    }

    #[test]
    fn test_time_of_day() {
        let types = default_logical_types();
        assert_eq!(
            types.project("time-millis", Value::Int(1_500)).unwrap(),
            Value::Time(1_500_000)
        );
        assert!(types.project("time-millis", Value::Int(-1)).is_err());
        assert!(types.project("time-micros", Value::Long(MICROS_PER_DAY)).is_err());
        assert_eq!(types.project("date", Value::Int(3)).unwrap(), Value::Date(3));
    }

    #[test]
    fn test_custom_projection() {
        fn upper(value: Value) -> Result<Value, String> {
            match value {
                Value::String(s) => Ok(Value::String(s.to_uppercase())),
                other => Ok(other),
            }
        }
        let mut types = LogicalTypes::new();
        types.register("shout", upper);
        assert_eq!(
            types.project("string.shout", Value::from("hi")).unwrap(),
            Value::from("HI")
        );
    }

    #[test]
    fn test_unproject() {
        let ts = Timestamp::from_epoch_micros(1_500_000).unwrap();
        assert_eq!(
            unproject("timestamp-millis", PrimitiveKind::Long, Value::Timestamp(ts)).unwrap(),
            Value::Long(1_500)
        );
        assert_eq!(
            unproject("long.timestamp-micros", PrimitiveKind::Long, Value::Timestamp(ts)).unwrap(),
            Value::Long(1_500_000)
        );
        assert_eq!(
            unproject("date", PrimitiveKind::Int, Value::Date(7)).unwrap(),
            Value::Int(7)
        );
        assert!(unproject("date", PrimitiveKind::Boolean, Value::Date(7)).is_err());
        assert_eq!(
            unproject("uuid", PrimitiveKind::String, Value::from("x")).unwrap(),
            Value::from("x")
        );
    }
}
