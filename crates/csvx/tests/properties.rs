//! Property tests: values formatted into a cell scan back to themselves.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use proptest::prelude::*;

use csvx::{
    Destination, ScanContext, format_bytes, format_date, format_timestamp, scan_cell, scan_row,
};

fn ctx() -> ScanContext {
    ScanContext::default()
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1i32..=9999, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn any_timestamp() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (
        0i64..=253_400_000_000,
        0u32..1_000_000_000,
        -(14 * 3600)..=(14 * 3600),
    )
        .prop_map(|(secs, nanos, offset)| {
            FixedOffset::east_opt(offset)
                .unwrap()
                .timestamp_opt(secs, nanos)
                .unwrap()
        })
}

proptest! {
    #[test]
    fn integers_round_trip(value in any::<i64>()) {
        let mut out = 0i64;
        scan_cell(&ctx(), 0, &value.to_string(), Destination::from(&mut out)).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn floats_round_trip(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let mut out = 0f64;
        scan_cell(&ctx(), 0, &value.to_string(), Destination::from(&mut out)).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn dates_round_trip(value in any_date()) {
        let mut out = NaiveDate::default();
        scan_cell(&ctx(), 0, &format_date(value), Destination::from(&mut out)).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn timestamps_round_trip(value in any_timestamp()) {
        let mut out = DateTime::<FixedOffset>::default();
        scan_cell(&ctx(), 0, &format_timestamp(&value), Destination::from(&mut out)).unwrap();
        prop_assert_eq!(out, value);
        prop_assert_eq!(out.offset(), value.offset());
    }

    #[test]
    fn booleans_round_trip(value in any::<bool>()) {
        let mut out = !value;
        scan_cell(&ctx(), 0, &value.to_string(), Destination::from(&mut out)).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn text_is_trimmed(value in "[ \t]{0,3}[a-zA-Z0-9_.-]{0,20}[ \t]{0,3}") {
        let mut out = String::new();
        scan_row(&ctx(), &vec![value.as_str()], [Destination::from(&mut out)]).unwrap();
        prop_assert_eq!(out.as_str(), value.trim());
    }

    #[test]
    fn optional_integers_round_trip(value in proptest::option::of(any::<i64>())) {
        let cell = value.as_ref().map(ToString::to_string).unwrap_or_default();
        let mut out = Some(-1i64);
        scan_cell(&ctx(), 0, &cell, Destination::from(&mut out)).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn byte_sizes_use_at_most_three_digits(n in any::<u64>()) {
        let text = format_bytes(n);
        let (number, unit) = text.split_once(' ').unwrap();
        prop_assert!(["B", "KB", "MB", "GB", "TB", "PB"].contains(&unit));
        let mantissa = number.split_once('e').map_or(number, |(m, _)| m);
        let digits = mantissa.chars().filter(char::is_ascii_digit).count();
        prop_assert!(digits <= 3, "{}", text);
    }
}
