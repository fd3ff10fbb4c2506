//! CSV reading helpers.
//!
//! This crate reads delimited text one row at a time and converts cells into
//! typed values without an intermediate table.
//!
//! # Features
//!
//! - **Row Scanning**: Positional conversion of cells into typed destinations
//! - **Struct Mapping**: Name-based binding of header columns to record fields
//! - **Column Lookup**: Normalized search for required columns in a header
//! - **Progress**: Throughput and time-remaining status line for large files
//!
//! # Example
//!
//! ```ignore
//! use csvx::{CsvRecord, Destination, Reader, RecordLayout};
//!
//! #[derive(Default)]
//! struct Order {
//!     id: i64,
//!     customer: String,
//!     total: Option<f64>,
//! }
//!
//! impl CsvRecord for Order {
//!     fn layout() -> RecordLayout<Self> {
//!         RecordLayout::<Self>::new()
//!             .tagged("id", "order_id", |o| Destination::from(&mut o.id))
//!             .field("customer", |o| Destination::from(&mut o.customer))
//!             .field("total", |o| Destination::from(&mut o.total))
//!     }
//! }
//!
//! let mut reader = Reader::open("orders.csv.gz")?;
//! let binding = reader.bind::<Order>()?;
//! let mut order = Order::default();
//! while reader.advance() {
//!     reader.scan_bound(&binding, &mut order)?;
//! }
//! reader.close();
//! ```

mod columns;
mod datetime;
mod error;
mod mapping;
pub mod progress;
mod reader;
mod scan;

// === Error Types ===
pub use error::{BoxError, CsvxError, Result};

// === Reading ===
pub use reader::{Reader, ReaderOptions};

// === Row Scanning ===
pub use scan::{
    Cells, CustomTarget, Destination, FALSE_LITERALS, ScanContext, ScanString, TRUE_LITERALS,
    parse_bool, scan_cell, scan_row, trimmed_cell,
};

// === Struct Mapping ===
pub use mapping::{
    ColumnName, CsvRecord, FieldAccessor, RecordBinding, RecordLayout, SKIP_ANNOTATION,
    parse_annotation, resolve_column,
};

// === Column Lookup ===
pub use columns::{find_columns, normalize_column_name};

// === Dates and Times ===
pub use datetime::{TimestampError, format_date, format_timestamp, parse_date, parse_timestamp};

// === Progress ===
pub use progress::{
    DrawFn, DrawTarget, ProgressOptions, ProgressReader, ProgressSink, TerminalDraw,
    TimeRemainingFormatter, format_bytes,
};
