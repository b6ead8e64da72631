//! Calendar timestamp produced by the timestamp logical types.

use std::fmt;

use crate::util::datetime::{
    format_datetime_rfc3339, parse_datetime_rfc3339, DateTimeParseError,
};

/// Earliest representable instant: 0001-01-01T00:00:00Z.
const MIN_EPOCH_MICROS: i64 = -62_135_596_800_000_000;

/// Latest representable instant: 9999-12-31T23:59:59.999999Z.
const MAX_EPOCH_MICROS: i64 = 253_402_300_799_999_999;

/// A UTC instant with microsecond precision, limited to years 1 through 9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    epoch_micros: i64,
}

impl Timestamp {
    /// The Unix epoch.
    pub const UNIX_EPOCH: Timestamp = Timestamp { epoch_micros: 0 };

    /// Creates a timestamp from microseconds since the Unix epoch.
    ///
    /// Returns `None` outside the representable calendar range.
    pub fn from_epoch_micros(epoch_micros: i64) -> Option<Self> {
        (MIN_EPOCH_MICROS..=MAX_EPOCH_MICROS)
            .contains(&epoch_micros)
            .then_some(Self { epoch_micros })
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    ///
    /// Returns `None` on overflow or outside the representable calendar range.
    pub fn from_epoch_millis(epoch_millis: i64) -> Option<Self> {
        epoch_millis
            .checked_mul(1_000)
            .and_then(Self::from_epoch_micros)
    }

    /// Parses an RFC 3339 datetime, normalizing it to UTC.
    pub fn parse_rfc3339(s: &str) -> Result<Self, DateTimeParseError> {
        let (epoch_micros, _offset) = parse_datetime_rfc3339(s)?;
        Self::from_epoch_micros(epoch_micros).ok_or_else(|| DateTimeParseError {
            message: format!("Datetime out of range: {}", s),
        })
    }

    /// Microseconds since the Unix epoch.
    pub fn epoch_micros(&self) -> i64 {
        self.epoch_micros
    }

    /// Milliseconds since the Unix epoch, truncated toward negative infinity.
    pub fn epoch_millis(&self) -> i64 {
        self.epoch_micros.div_euclid(1_000)
    }

    /// Formats the timestamp as an RFC 3339 string in UTC.
    pub fn to_rfc3339(&self) -> String {
        format_datetime_rfc3339(self.epoch_micros, 0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis() {
        let ts = Timestamp::from_epoch_millis(1_658_335_430_564).unwrap();
        assert_eq!(ts.to_rfc3339(), "2022-07-20T16:43:50.564Z");
        assert_eq!(ts.epoch_millis(), 1_658_335_430_564);
    }

    #[test]
    fn test_range() {
        assert!(Timestamp::from_epoch_millis(i64::MAX).is_none());
        assert!(Timestamp::from_epoch_millis(i64::MIN).is_none());
        assert!(Timestamp::from_epoch_micros(MAX_EPOCH_MICROS + 1).is_none());
        assert_eq!(
            Timestamp::from_epoch_micros(MIN_EPOCH_MICROS).unwrap().to_rfc3339(),
            "0001-01-01T00:00:00Z"
        );
        assert_eq!(
            Timestamp::from_epoch_micros(MAX_EPOCH_MICROS).unwrap().to_rfc3339(),
            "9999-12-31T23:59:59.999999Z"
        );
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let ts = Timestamp::parse_rfc3339("2024-03-15T14:30:00+05:30").unwrap();
        assert_eq!(ts.to_string(), "2024-03-15T09:00:00Z");
    }

    #[test]
    fn test_negative_millis() {
        let ts = Timestamp::from_epoch_micros(-1).unwrap();
        assert_eq!(ts.epoch_millis(), -1);
    }
}
