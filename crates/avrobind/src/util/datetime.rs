//! RFC 3339 datetime parsing and formatting.
//!
//! Converts between RFC 3339 strings and microseconds since the Unix epoch
//! (1970-01-01T00:00:00Z). Used by [`Timestamp`](crate::model::Timestamp)
//! and by the timestamp logical types when the wire value is a string.

use thiserror::Error;

const MICROSECONDS_PER_SECOND: i64 = 1_000_000;
const MICROSECONDS_PER_MINUTE: i64 = 60 * MICROSECONDS_PER_SECOND;
const MICROSECONDS_PER_HOUR: i64 = 60 * MICROSECONDS_PER_MINUTE;
const MICROSECONDS_PER_DAY: i64 = 24 * MICROSECONDS_PER_HOUR;

/// Error type for RFC 3339 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DateTimeParseError {
    pub message: String,
}

impl DateTimeParseError {
    fn invalid(what: &str, input: &str) -> Self {
        Self {
            message: format!("Invalid {} in datetime: {}", what, input),
        }
    }
}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) and returns offset in minutes.
fn parse_timezone_offset(offset: &str) -> Result<i16, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    let invalid = || DateTimeParseError {
        message: format!("Invalid timezone offset: {}", offset),
    };

    if offset.len() != 6 || offset.as_bytes()[3] != b':' {
        return Err(invalid());
    }
    let sign = match offset.as_bytes()[0] {
        b'+' => 1i16,
        b'-' => -1i16,
        _ => return Err(invalid()),
    };

    let hours: i16 = offset[1..3].parse().map_err(|_| invalid())?;
    let minutes: i16 = offset[4..6].parse().map_err(|_| invalid())?;

    // ±24:00 is the widest offset accepted
    if hours > 24 || (hours == 24 && minutes != 0) || minutes > 59 {
        return Err(invalid());
    }

    Ok(sign * (hours * 60 + minutes))
}

/// Formats an offset in minutes as a timezone string (Z, +HH:MM, -HH:MM).
fn format_timezone_offset(offset_min: i16) -> String {
    if offset_min == 0 {
        return "Z".to_string();
    }

    let sign = if offset_min >= 0 { '+' } else { '-' };
    let abs_offset = offset_min.abs();
    format!("{}{:02}:{:02}", sign, abs_offset / 60, abs_offset % 60)
}

/// Parses fractional seconds and returns microseconds.
///
/// Digits beyond microsecond precision are truncated.
fn parse_fractional_seconds(frac: &str) -> i64 {
    let mut micros = 0i64;
    for (i, digit) in frac.bytes().take(6).enumerate() {
        micros += (digit - b'0') as i64 * 10i64.pow(5 - i as u32);
    }
    micros
}

/// Formats microseconds as fractional seconds, omitting if zero.
fn format_fractional_seconds(us: i64) -> String {
    if us == 0 {
        return String::new();
    }
    let digits = format!("{:06}", us);
    format!(".{}", digits.trim_end_matches('0'))
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since Unix epoch for a civil date (Howard Hinnant's algorithm).
pub(crate) fn date_to_days(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146097 + doe - 719468
}

/// Civil date (year, month, day) for days since Unix epoch.
pub(crate) fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn parse_field<T: std::str::FromStr>(
    s: &str,
    range: std::ops::Range<usize>,
    what: &str,
    input: &str,
) -> Result<T, DateTimeParseError> {
    s.get(range)
        .filter(|part| part.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|part| part.parse().ok())
        .ok_or_else(|| DateTimeParseError::invalid(what, input))
}

/// Parses an RFC 3339 datetime string and returns microseconds since Unix
/// epoch (UTC) and the offset in minutes.
pub fn parse_datetime_rfc3339(input: &str) -> Result<(i64, i16), DateTimeParseError> {
    // Minimum length is 19 (YYYY-MM-DDTHH:MM:SS)
    let bytes = input.as_bytes();
    if bytes.len() < 19
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || !matches!(bytes[10], b'T' | b't' | b' ')
        || bytes[13] != b':'
        || bytes[16] != b':'
    {
        return Err(DateTimeParseError {
            message: format!("Invalid RFC 3339 datetime: {}", input),
        });
    }

    let year: i32 = parse_field(input, 0..4, "year", input)?;
    let month: u32 = parse_field(input, 5..7, "month", input)?;
    let day: u32 = parse_field(input, 8..10, "day", input)?;
    let hours: i64 = parse_field(input, 11..13, "hours", input)?;
    let minutes: i64 = parse_field(input, 14..16, "minutes", input)?;
    let seconds: i64 = parse_field(input, 17..19, "seconds", input)?;

    if !(1..=12).contains(&month) {
        return Err(DateTimeParseError::invalid("month", input));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError::invalid("day", input));
    }
    if hours > 23 {
        return Err(DateTimeParseError::invalid("hours", input));
    }
    if minutes > 59 {
        return Err(DateTimeParseError::invalid("minutes", input));
    }
    if seconds > 59 {
        return Err(DateTimeParseError::invalid("seconds", input));
    }

    // Optional fractional seconds, then the offset
    let rest = &input[19..];
    let (microseconds, offset_str) = match rest.strip_prefix('.') {
        Some(frac) => {
            let frac_end = frac
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(frac.len());
            if frac_end == 0 {
                return Err(DateTimeParseError::invalid("fraction", input));
            }
            (parse_fractional_seconds(&frac[..frac_end]), &frac[frac_end..])
        }
        None => (0, rest),
    };

    let offset_min = if offset_str.is_empty() {
        0
    } else {
        parse_timezone_offset(offset_str)?
    };

    let local_micros = date_to_days(year, month, day) * MICROSECONDS_PER_DAY
        + hours * MICROSECONDS_PER_HOUR
        + minutes * MICROSECONDS_PER_MINUTE
        + seconds * MICROSECONDS_PER_SECOND
        + microseconds;

    // local time = UTC + offset, so UTC = local - offset
    let epoch_micros = local_micros - offset_min as i64 * MICROSECONDS_PER_MINUTE;

    Ok((epoch_micros, offset_min))
}

/// Formats microseconds since Unix epoch as an RFC 3339 datetime string.
pub fn format_datetime_rfc3339(epoch_micros: i64, offset_min: i16) -> String {
    let local_us = epoch_micros + offset_min as i64 * MICROSECONDS_PER_MINUTE;

    let days = local_us.div_euclid(MICROSECONDS_PER_DAY);
    let time_micros = local_us.rem_euclid(MICROSECONDS_PER_DAY);
    let (year, month, day) = days_to_date(days);

    let hours = time_micros / MICROSECONDS_PER_HOUR;
    let minutes = (time_micros % MICROSECONDS_PER_HOUR) / MICROSECONDS_PER_MINUTE;
    let seconds = (time_micros % MICROSECONDS_PER_MINUTE) / MICROSECONDS_PER_SECOND;
    let microseconds = time_micros % MICROSECONDS_PER_SECOND;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}{}",
        year,
        month,
        day,
        hours,
        minutes,
        seconds,
        format_fractional_seconds(microseconds),
        format_timezone_offset(offset_min)
    )
}

/// Formats days since Unix epoch as an RFC 3339 full-date (YYYY-MM-DD).
pub fn format_date_rfc3339(days: i32) -> String {
    let (year, month, day) = days_to_date(days as i64);
    format!("{:04}-{:02}-{:02}", year, month, day)
}
