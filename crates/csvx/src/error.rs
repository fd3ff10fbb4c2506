//! Error types for CSV reading, scanning, and column mapping.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error produced by a conversion or a custom scan target.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while reading and scanning CSV data.
#[derive(Debug, Error)]
pub enum CsvxError {
    // === Source Errors ===
    /// Input file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File size could not be determined for progress reporting.
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Header Errors ===
    /// Input ended before a header row was read.
    #[error("couldn't read header: input is empty")]
    MissingHeader,

    /// Header row could not be parsed.
    #[error("couldn't read header: {source}")]
    Header {
        #[source]
        source: csv::Error,
    },

    // === Row Errors ===
    /// The last row advance failed. The source is shared so the same failure
    /// can be reported by every scan until the next advance.
    #[error("couldn't read row: {source}")]
    Read {
        #[source]
        source: Arc<csv::Error>,
    },

    /// The reader was used after `close`.
    #[error("reader is closed")]
    Closed,

    // === Conversion Errors ===
    /// A cell could not be converted into its destination.
    #[error("scan({kind}) (index {index}): {source}")]
    Convert {
        kind: &'static str,
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A cell is not one of the accepted boolean literals.
    #[error("scan({kind}) (index {index}): couldn't convert {value:?} to boolean")]
    InvalidBool {
        kind: &'static str,
        index: usize,
        value: String,
    },

    // === Mapping Errors ===
    /// A record field matched no header column.
    #[error("couldn't find column in {header:?} for field {field}")]
    UnresolvedField { field: String, header: Vec<String> },

    /// One or more requested column names are absent.
    #[error("couldn't find columns {}", names.join(", "))]
    MissingColumns { names: Vec<String> },
}

impl CsvxError {
    /// Column index of a conversion failure, if this is one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Convert { index, .. } | Self::InvalidBool { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result type for csvx operations.
pub type Result<T> = std::result::Result<T, CsvxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CsvxError::Open {
            path: PathBuf::from("/path/to/file.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "failed to open /path/to/file.csv: not found");
    }

    #[test]
    fn test_missing_columns_display() {
        let err = CsvxError::MissingColumns {
            names: vec!["total".to_string(), "tax".to_string()],
        };
        assert_eq!(err.to_string(), "couldn't find columns total, tax");
    }

    #[test]
    fn test_index_only_for_conversion_errors() {
        let err = CsvxError::InvalidBool {
            kind: "bool",
            index: 4,
            value: "maybe".to_string(),
        };
        assert_eq!(err.index(), Some(4));
        assert_eq!(CsvxError::MissingHeader.index(), None);
    }
}
