//! Column type declarations for `csvx check`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use csvx::Destination;

/// Value kind a column is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    OptInt,
    Float,
    OptFloat,
    Timestamp,
    OptTimestamp,
    Date,
    OptDate,
    Bool,
    Skip,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::OptInt => "int?",
            Self::Float => "float",
            Self::OptFloat => "float?",
            Self::Timestamp => "timestamp",
            Self::OptTimestamp => "timestamp?",
            Self::Date => "date",
            Self::OptDate => "date?",
            Self::Bool => "bool",
            Self::Skip => "skip",
        }
    }

    /// Empty slot of this kind, or `None` for skipped columns.
    pub fn slot(self) -> Option<Slot> {
        let slot = match self {
            Self::Text => Slot::Text(String::new()),
            Self::Int => Slot::Int(0),
            Self::OptInt => Slot::OptInt(None),
            Self::Float => Slot::Float(0.0),
            Self::OptFloat => Slot::OptFloat(None),
            Self::Timestamp => Slot::Timestamp(DateTime::default()),
            Self::OptTimestamp => Slot::OptTimestamp(None),
            Self::Date => Slot::Date(NaiveDate::default()),
            Self::OptDate => Slot::OptDate(None),
            Self::Bool => Slot::Bool(false),
            Self::Skip => return None,
        };
        Some(slot)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "text" | "string" => Self::Text,
            "int" => Self::Int,
            "int?" => Self::OptInt,
            "float" => Self::Float,
            "float?" => Self::OptFloat,
            "timestamp" => Self::Timestamp,
            "timestamp?" => Self::OptTimestamp,
            "date" => Self::Date,
            "date?" => Self::OptDate,
            "bool" => Self::Bool,
            "skip" => Self::Skip,
            other => return Err(format!("unknown column kind '{other}'")),
        };
        Ok(kind)
    }
}

/// One `COL:KIND` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl FromStr for ColumnSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, kind) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected COLUMN:KIND, got '{s}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing column name in '{s}'"));
        }
        Ok(Self {
            name: name.to_string(),
            kind: kind.parse()?,
        })
    }
}

/// Parses a UTC offset such as `+10:00`, `-0530`, or `UTC`.
pub fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("utc") || s == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }
    s.parse::<FixedOffset>()
        .map_err(|err| format!("invalid offset '{s}': {err}"))
}

/// Owned storage that one column is scanned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Text(String),
    Int(i64),
    OptInt(Option<i64>),
    Float(f64),
    OptFloat(Option<f64>),
    Timestamp(DateTime<FixedOffset>),
    OptTimestamp(Option<DateTime<FixedOffset>>),
    Date(NaiveDate),
    OptDate(Option<NaiveDate>),
    Bool(bool),
}

impl Slot {
    pub fn destination(&mut self) -> Destination<'_> {
        match self {
            Self::Text(v) => Destination::from(v),
            Self::Int(v) => Destination::from(v),
            Self::OptInt(v) => Destination::from(v),
            Self::Float(v) => Destination::from(v),
            Self::OptFloat(v) => Destination::from(v),
            Self::Timestamp(v) => Destination::from(v),
            Self::OptTimestamp(v) => Destination::from(v),
            Self::Date(v) => Destination::from(v),
            Self::OptDate(v) => Destination::from(v),
            Self::Bool(v) => Destination::from(v),
        }
    }
}

/// A row that failed to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Line where the row starts, when known.
    pub line: Option<u64>,
    /// Data row number, starting at 1.
    pub row: u64,
    /// Header name of the failing column, when the failure names one.
    pub column: Option<String>,
    pub message: String,
}

/// Outcome of `csvx check`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    pub rows: u64,
    pub failed_rows: u64,
    /// First failures in row order, capped by the caller's limit.
    pub failures: Vec<RowFailure>,
}

impl CheckResult {
    pub fn has_failures(&self) -> bool {
        self.failed_rows > 0
    }
}

/// Outcome of `csvx count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountResult {
    pub rows: u64,
    pub read_errors: u64,
}
