//! Timestamp and calendar-date parsing for scanned cells.
//!
//! Timestamps accept a fixed set of common layouts. Layouts that carry their
//! own offset keep it; zone-less layouts are interpreted in the caller's zone
//! context, falling back to UTC. Calendar dates are strict `YYYY-MM-DD`.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat, Utc,
};
use thiserror::Error;

/// Layouts that carry an explicit UTC offset.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Zone-less date-time layouts.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%b-%Y %H:%M:%S", // 15-Jan-2024 10:30:00
    "%d %b %Y %H:%M:%S", // 15 Jan 2024 10:30:00
];

/// Date-only layouts, read as midnight.
const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",  // 15-Jan-2024
    "%d %b %Y",  // 15 Jan 2024
    "%b %d, %Y", // Jan 15, 2024
    "%Y%m%d",    // 20240115
];

/// Error returned when no timestamp layout matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("couldn't parse {value:?} as a timestamp")]
pub struct TimestampError {
    value: String,
}

/// Parses a timestamp using the default layouts.
///
/// `tz` supplies the offset for layouts without one; `None` means UTC.
pub fn parse_timestamp(
    value: &str,
    tz: Option<FixedOffset>,
) -> Result<DateTime<FixedOffset>, TimestampError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Ok(dt);
    }

    let naive = try_parse_naive(value).ok_or_else(|| TimestampError {
        value: value.to_string(),
    })?;
    let offset = tz.unwrap_or_else(|| Utc.fix());
    naive
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| TimestampError {
            value: value.to_string(),
        })
}

fn try_parse_naive(value: &str) -> Option<NaiveDateTime> {
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

/// Formats a timestamp as RFC 3339, keeping sub-second precision and offset.
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_rfc3339_keeps_offset() {
        let dt = parse_timestamp("2024-01-15T10:30:45+10:00", None).unwrap();
        assert_eq!(dt.offset(), &offset(10));
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_zoned_layout_ignores_context() {
        let dt = parse_timestamp("2024-01-15 10:30:45+02:00", Some(offset(-5))).unwrap();
        assert_eq!(dt.offset(), &offset(2));
    }

    #[test]
    fn test_naive_layout_uses_context() {
        let dt = parse_timestamp("2024-01-15 10:30:45", Some(offset(10))).unwrap();
        assert_eq!(dt.offset(), &offset(10));
        assert_eq!(dt.naive_local().hour(), 10);
    }

    #[test]
    fn test_naive_layout_defaults_to_utc() {
        let dt = parse_timestamp("2024-01-15T10:30", None).unwrap();
        assert_eq!(dt.offset(), &offset(0));
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_date_only_is_midnight() {
        let dt = parse_timestamp("15-Jan-2024", None).unwrap();
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        let err = parse_timestamp("not a time", None).unwrap_err();
        assert_eq!(err.to_string(), "couldn't parse \"not a time\" as a timestamp");
    }

    #[test]
    fn test_parse_date_strict() {
        let d = parse_date("2024-02-29").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2024-02-29T00:00:00").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(d), "2024-01-05");
    }
}
