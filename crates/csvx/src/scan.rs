//! Typed scanning of row cells into caller-owned destinations.
//!
//! A [`Destination`] is a mutable borrow of one value of a known kind. The
//! primitive kinds are converted directly; anything else goes through the
//! [`ScanString`] capability. Empty cells on optional destinations produce
//! `None` without calling the parser.

use std::any::type_name;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::datetime::{parse_date, parse_timestamp};
use crate::error::{BoxError, CsvxError, Result};

/// Literals accepted as `true` by boolean destinations.
pub const TRUE_LITERALS: &[&str] = &["1", "yes", "true", "t"];

/// Literals accepted as `false` by boolean destinations. Empty is false.
pub const FALSE_LITERALS: &[&str] = &["", "0", "no", "false", "f"];

/// Capability for types that can parse themselves from a cell.
///
/// Implement this for domain types that need more than [`FromStr`]. Types
/// that only implement `FromStr` can be scanned with
/// [`Destination::parsed`] instead.
pub trait ScanString {
    /// Replaces `self` with the value parsed from a trimmed cell.
    fn scan_string(&mut self, value: &str) -> std::result::Result<(), BoxError>;
}

impl<T: ScanString + ?Sized> ScanString for &mut T {
    fn scan_string(&mut self, value: &str) -> std::result::Result<(), BoxError> {
        (**self).scan_string(value)
    }
}

/// Empty cells clear the option; anything else is scanned into the existing
/// value, or into `T::default()` when the option was `None`.
impl<T: ScanString + Default> ScanString for Option<T> {
    fn scan_string(&mut self, value: &str) -> std::result::Result<(), BoxError> {
        if value.is_empty() {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).scan_string(value)
    }
}

struct Parsed<'a, T>(&'a mut T);

impl<T> ScanString for Parsed<'_, T>
where
    T: FromStr,
    T::Err: Into<BoxError>,
{
    fn scan_string(&mut self, value: &str) -> std::result::Result<(), BoxError> {
        *self.0 = value.parse().map_err(Into::into)?;
        Ok(())
    }
}

struct ParsedOpt<'a, T>(&'a mut Option<T>);

impl<T> ScanString for ParsedOpt<'_, T>
where
    T: FromStr,
    T::Err: Into<BoxError>,
{
    fn scan_string(&mut self, value: &str) -> std::result::Result<(), BoxError> {
        *self.0 = if value.is_empty() {
            None
        } else {
            Some(value.parse().map_err(Into::into)?)
        };
        Ok(())
    }
}

/// A type-erased custom destination.
pub struct CustomTarget<'a> {
    type_name: &'static str,
    target: Box<dyn ScanString + 'a>,
}

/// A typed write target for one cell.
pub enum Destination<'a> {
    /// Ignore the column.
    Skip,
    /// Trimmed cell text.
    Text(&'a mut String),
    /// Base-10 signed integer.
    Int(&'a mut i64),
    /// Integer; an empty cell becomes `None`.
    OptInt(&'a mut Option<i64>),
    /// Floating point number.
    Float(&'a mut f64),
    /// Float; an empty cell becomes `None`.
    OptFloat(&'a mut Option<f64>),
    /// Timestamp in any accepted layout.
    Timestamp(&'a mut DateTime<FixedOffset>),
    /// Timestamp; an empty cell becomes `None`.
    OptTimestamp(&'a mut Option<DateTime<FixedOffset>>),
    /// `YYYY-MM-DD` date.
    Date(&'a mut NaiveDate),
    /// Date; an empty cell becomes `None`.
    OptDate(&'a mut Option<NaiveDate>),
    /// Boolean literal; an empty cell is `false`.
    Bool(&'a mut bool),
    /// User type, see [`Destination::custom`].
    Custom(CustomTarget<'a>),
}

impl<'a> Destination<'a> {
    /// Scans through the target's [`ScanString`] implementation.
    pub fn custom<T: ScanString + ?Sized>(target: &'a mut T) -> Self {
        Self::Custom(CustomTarget {
            type_name: type_name::<T>(),
            target: Box::new(target),
        })
    }

    /// Scans through the target's [`FromStr`] implementation.
    pub fn parsed<T>(target: &'a mut T) -> Self
    where
        T: FromStr + 'a,
        T::Err: Into<BoxError>,
    {
        Self::Custom(CustomTarget {
            type_name: type_name::<T>(),
            target: Box::new(Parsed(target)),
        })
    }

    /// Like [`Destination::parsed`], with empty cells mapping to `None`.
    pub fn parsed_opt<T>(target: &'a mut Option<T>) -> Self
    where
        T: FromStr + 'a,
        T::Err: Into<BoxError>,
    {
        Self::Custom(CustomTarget {
            type_name: type_name::<Option<T>>(),
            target: Box::new(ParsedOpt(target)),
        })
    }

    /// Name of the destination type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Text(_) => "String",
            Self::Int(_) => "i64",
            Self::OptInt(_) => "Option<i64>",
            Self::Float(_) => "f64",
            Self::OptFloat(_) => "Option<f64>",
            Self::Timestamp(_) => "DateTime<FixedOffset>",
            Self::OptTimestamp(_) => "Option<DateTime<FixedOffset>>",
            Self::Date(_) => "NaiveDate",
            Self::OptDate(_) => "Option<NaiveDate>",
            Self::Bool(_) => "bool",
            Self::Custom(custom) => custom.type_name,
        }
    }
}

macro_rules! impl_from_target {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl<'a> From<&'a mut $ty> for Destination<'a> {
                fn from(target: &'a mut $ty) -> Self {
                    Self::$variant(target)
                }
            }
        )+
    };
}

impl_from_target! {
    String => Text,
    i64 => Int,
    Option<i64> => OptInt,
    f64 => Float,
    Option<f64> => OptFloat,
    DateTime<FixedOffset> => Timestamp,
    Option<DateTime<FixedOffset>> => OptTimestamp,
    NaiveDate => Date,
    Option<NaiveDate> => OptDate,
    bool => Bool,
}

/// Builds an array of destinations from mutable borrows.
///
/// Each argument goes through `Destination::from`, so primitive borrows and
/// ready-made destinations can be mixed.
///
/// ```ignore
/// let mut id = 0i64;
/// let mut name = String::new();
/// reader.scan(csvx::destinations![&mut id, Destination::Skip, &mut name])?;
/// ```
#[macro_export]
macro_rules! destinations {
    ($($target:expr),* $(,)?) => {
        [$($crate::Destination::from($target)),*]
    };
}

/// Settings that affect conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanContext {
    /// Offset applied to timestamps that carry none. `None` means UTC.
    pub tz: Option<FixedOffset>,
}

/// Positional access to the cells of one row.
pub trait Cells {
    fn cell(&self, index: usize) -> Option<&str>;
}

impl Cells for csv::StringRecord {
    fn cell(&self, index: usize) -> Option<&str> {
        self.get(index)
    }
}

impl<S: AsRef<str>> Cells for [S] {
    fn cell(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> Cells for Vec<S> {
    fn cell(&self, index: usize) -> Option<&str> {
        self.as_slice().cell(index)
    }
}

/// Returns the trimmed cell at `index`, or `""` past the end of the row.
pub fn trimmed_cell<R: Cells + ?Sized>(row: &R, index: usize) -> &str {
    row.cell(index).map_or("", str::trim)
}

/// Scans `row` into `destinations` positionally.
///
/// Stops at the first failure. Destinations before it keep their new
/// values; those after it are untouched.
pub fn scan_row<'a, R, I>(ctx: &ScanContext, row: &R, destinations: I) -> Result<()>
where
    R: Cells + ?Sized,
    I: IntoIterator<Item = Destination<'a>>,
{
    for (index, destination) in destinations.into_iter().enumerate() {
        scan_cell(ctx, index, trimmed_cell(row, index), destination)?;
    }
    Ok(())
}

/// Converts one already-trimmed cell into `destination`.
pub fn scan_cell(
    ctx: &ScanContext,
    index: usize,
    cell: &str,
    destination: Destination<'_>,
) -> Result<()> {
    let kind = destination.type_name();
    match destination {
        Destination::Skip => {}
        Destination::Text(target) => cell.clone_into(target),
        Destination::Int(target) => {
            *target = cell.parse::<i64>().map_err(conversion(kind, index))?;
        }
        Destination::OptInt(target) => {
            *target = optional(cell, str::parse::<i64>).map_err(conversion(kind, index))?;
        }
        Destination::Float(target) => {
            *target = cell.parse::<f64>().map_err(conversion(kind, index))?;
        }
        Destination::OptFloat(target) => {
            *target = optional(cell, str::parse::<f64>).map_err(conversion(kind, index))?;
        }
        Destination::Timestamp(target) => {
            *target = parse_timestamp(cell, ctx.tz).map_err(conversion(kind, index))?;
        }
        Destination::OptTimestamp(target) => {
            *target = optional(cell, |c| parse_timestamp(c, ctx.tz))
                .map_err(conversion(kind, index))?;
        }
        Destination::Date(target) => {
            *target = parse_date(cell).map_err(conversion(kind, index))?;
        }
        Destination::OptDate(target) => {
            *target = optional(cell, parse_date).map_err(conversion(kind, index))?;
        }
        Destination::Bool(target) => {
            *target = parse_bool(cell).ok_or_else(|| CsvxError::InvalidBool {
                kind,
                index,
                value: cell.to_string(),
            })?;
        }
        Destination::Custom(mut custom) => {
            custom
                .target
                .scan_string(cell)
                .map_err(conversion(kind, index))?;
        }
    }
    Ok(())
}

/// Maps a boolean literal. Matching is exact; `""` is false.
pub fn parse_bool(value: &str) -> Option<bool> {
    if TRUE_LITERALS.contains(&value) {
        Some(true)
    } else if FALSE_LITERALS.contains(&value) {
        Some(false)
    } else {
        None
    }
}

fn optional<T, E>(
    cell: &str,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> std::result::Result<Option<T>, E> {
    if cell.is_empty() {
        Ok(None)
    } else {
        parse(cell).map(Some)
    }
}

fn conversion<E: Into<BoxError>>(kind: &'static str, index: usize) -> impl FnOnce(E) -> CsvxError {
    move |err| CsvxError::Convert {
        kind,
        index,
        source: err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::net::Ipv4Addr;

    fn ctx() -> ScanContext {
        ScanContext::default()
    }

    #[derive(Debug, Default, PartialEq)]
    struct Cents(i64);

    impl ScanString for Cents {
        fn scan_string(&mut self, value: &str) -> std::result::Result<(), BoxError> {
            let (whole, frac) = value.split_once('.').ok_or("expected a decimal point")?;
            self.0 = whole.parse::<i64>()? * 100 + frac.parse::<i64>()?;
            Ok(())
        }
    }

    #[test]
    fn test_scan_primitives() {
        let row = vec!["  hello ", "42", "2.5", "2024-01-15", "yes"];
        let mut text = String::new();
        let mut int = 0i64;
        let mut float = 0f64;
        let mut date = NaiveDate::default();
        let mut flag = false;

        scan_row(
            &ctx(),
            &row,
            destinations![&mut text, &mut int, &mut float, &mut date, &mut flag],
        )
        .unwrap();

        assert_eq!(text, "hello");
        assert_eq!(int, 42);
        assert_eq!(float, 2.5);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(flag);
    }

    #[test]
    fn test_skip_ignores_column() {
        let row = vec!["not a number", "7"];
        let mut int = 0i64;
        scan_row(&ctx(), &row, [Destination::Skip, Destination::from(&mut int)]).unwrap();
        assert_eq!(int, 7);
    }

    #[test]
    fn test_optional_empty_is_none() {
        let row = vec!["", " ", "", ""];
        let mut int = Some(1i64);
        let mut float = Some(1.0f64);
        let mut ts = Some(DateTime::<FixedOffset>::default());
        let mut date = Some(NaiveDate::default());

        scan_row(
            &ctx(),
            &row,
            destinations![&mut int, &mut float, &mut ts, &mut date],
        )
        .unwrap();

        assert_eq!(int, None);
        assert_eq!(float, None);
        assert_eq!(ts, None);
        assert_eq!(date, None);
    }

    #[test]
    fn test_required_empty_is_error() {
        let row = vec![""];
        let mut int = 5i64;
        let err = scan_row(&ctx(), &row, destinations![&mut int]).unwrap_err();
        assert!(matches!(err, CsvxError::Convert { kind: "i64", index: 0, .. }));
        assert_eq!(int, 5);
    }

    #[test]
    fn test_missing_cells_are_empty() {
        let row = vec!["1"];
        let mut first = 0i64;
        let mut second = Some(3i64);
        let mut third = String::from("old");
        scan_row(
            &ctx(),
            &row,
            destinations![&mut first, &mut second, &mut third],
        )
        .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, None);
        assert_eq!(third, "");
    }

    #[test]
    fn test_bool_literals() {
        for value in ["1", "yes", "true", "t"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["", "0", "no", "false", "f"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool("YES"), None);
    }

    #[test]
    fn test_bool_error_names_index_and_type() {
        let row = vec!["1", "maybe"];
        let mut a = false;
        let mut b = true;
        let err = scan_row(&ctx(), &row, destinations![&mut a, &mut b]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "scan(bool) (index 1): couldn't convert \"maybe\" to boolean"
        );
        assert!(a);
        assert!(b);
    }

    #[test]
    fn test_failure_leaves_later_destinations_untouched() {
        let row = vec!["first", "oops", "third"];
        let mut a = String::new();
        let mut b = 0i64;
        let mut c = String::from("unchanged");
        let err = scan_row(&ctx(), &row, destinations![&mut a, &mut b, &mut c]).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(a, "first");
        assert_eq!(c, "unchanged");
    }

    #[test]
    fn test_custom_scan_string() {
        let row = vec!["12.34"];
        let mut cents = Cents::default();
        scan_row(&ctx(), &row, [Destination::custom(&mut cents)]).unwrap();
        assert_eq!(cents, Cents(1234));
    }

    #[test]
    fn test_custom_error_names_type() {
        let row = vec!["1234"];
        let mut cents = Cents::default();
        let err = scan_row(&ctx(), &row, [Destination::custom(&mut cents)]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Cents"), "{message}");
        assert!(message.ends_with("(index 0): expected a decimal point"), "{message}");
    }

    #[test]
    fn test_optional_custom_allocates_on_demand() {
        let row = vec!["1.05", ""];
        let mut present: Option<Cents> = None;
        let mut absent = Some(Cents(9));
        scan_row(
            &ctx(),
            &row,
            [
                Destination::custom(&mut present),
                Destination::custom(&mut absent),
            ],
        )
        .unwrap();
        assert_eq!(present, Some(Cents(105)));
        assert_eq!(absent, None);
    }

    #[test]
    fn test_parsed_from_str() {
        let row = vec!["127.0.0.1", "", "10.0.0.1"];
        let mut addr = Ipv4Addr::UNSPECIFIED;
        let mut none = Some(Ipv4Addr::LOCALHOST);
        let mut some: Option<Ipv4Addr> = None;
        scan_row(
            &ctx(),
            &row,
            [
                Destination::parsed(&mut addr),
                Destination::parsed_opt(&mut none),
                Destination::parsed_opt(&mut some),
            ],
        )
        .unwrap();
        assert_eq!(addr, Ipv4Addr::LOCALHOST);
        assert_eq!(none, None);
        assert_eq!(some, Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_optional_skips_parser_on_empty() {
        struct Counting<'a>(&'a Cell<usize>);

        impl ScanString for Counting<'_> {
            fn scan_string(&mut self, _value: &str) -> std::result::Result<(), BoxError> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        impl Default for Counting<'_> {
            fn default() -> Self {
                unreachable!("empty cells must not allocate")
            }
        }

        let calls = Cell::new(0);
        let mut target = Some(Counting(&calls));
        scan_cell(&ctx(), 0, "", Destination::custom(&mut target)).unwrap();
        assert!(target.is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_timestamp_uses_context_offset() {
        let tz = FixedOffset::east_opt(10 * 3600).unwrap();
        let context = ScanContext { tz: Some(tz) };
        let mut ts = DateTime::<FixedOffset>::default();
        scan_cell(&context, 0, "2024-01-15 09:00:00", Destination::from(&mut ts)).unwrap();
        assert_eq!(ts.offset(), &tz);
    }

    #[test]
    fn test_type_names() {
        let mut v = None::<f64>;
        assert_eq!(Destination::from(&mut v).type_name(), "Option<f64>");
        assert_eq!(Destination::Skip.type_name(), "skip");
    }
}
