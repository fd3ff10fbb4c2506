//! Row-at-a-time CSV reader with typed scanning.
//!
//! A [`Reader`] captures the header row on construction and then exposes one
//! data row at a time through [`Reader::advance`]. Read failures are stored
//! instead of returned, so the usual loop stays flat:
//!
//! ```ignore
//! use csvx::{Reader, destinations};
//!
//! let mut reader = Reader::open("orders.csv")?;
//! let (mut id, mut total) = (0i64, 0f64);
//! while reader.advance() {
//!     reader.scan(destinations![&mut id, &mut total])?;
//! }
//! reader.close();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::FixedOffset;
use csv::StringRecord;
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::columns::find_columns;
use crate::error::{CsvxError, Result};
use crate::mapping::{CsvRecord, RecordBinding};
use crate::progress::{ProgressOptions, ProgressReader};
use crate::scan::{Destination, ScanContext, scan_row};

/// Settings for opening a [`Reader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Offset for timestamps without one. `None` means UTC.
    pub tz: Option<FixedOffset>,
    /// Field separator byte.
    pub delimiter: u8,
    /// Accept rows whose length differs from the header.
    pub flexible: bool,
    /// Progress reporting; off when `None`.
    pub progress: Option<ProgressOptions>,
    /// Size of a non-file source, required for progress on one.
    pub total_size: Option<u64>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            tz: None,
            delimiter: b',',
            flexible: false,
            progress: None,
            total_size: None,
        }
    }
}

impl ReaderOptions {
    /// Sets the offset for timestamps without one.
    #[must_use]
    pub fn with_tz(mut self, tz: FixedOffset) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Sets the field separator.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Allows rows with a different length than the header.
    #[must_use]
    pub fn with_flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    /// Turns on progress reporting.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressOptions) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the source size used for progress on non-file input.
    #[must_use]
    pub fn with_total_size(mut self, total_size: u64) -> Self {
        self.total_size = Some(total_size);
        self
    }

    fn scan_context(&self) -> ScanContext {
        ScanContext { tz: self.tz }
    }
}

/// A CSV reader positioned on one data row at a time.
pub struct Reader {
    inner: Option<csv::Reader<Box<dyn Read>>>,
    header: Vec<String>,
    row: StringRecord,
    error: Option<Arc<csv::Error>>,
    exhausted: bool,
    ctx: ScanContext,
    source: String,
    rows: u64,
}

impl Reader {
    /// Opens a file with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, ReaderOptions::default())
    }

    /// Opens a file. Paths ending in `.gz` are decompressed.
    ///
    /// With progress enabled the total is the on-disk size, so for gzip
    /// files progress counts compressed bytes.
    pub fn open_with(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CsvxError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let gzip = is_gzip(path);

        let mut source: Box<dyn Read> = match options.progress {
            Some(progress) => {
                let size = file
                    .metadata()
                    .map_err(|source| CsvxError::Stat {
                        path: path.to_path_buf(),
                        source,
                    })?
                    .len();
                Box::new(ProgressReader::new(
                    file,
                    size,
                    progress,
                    progress.draw_target(),
                ))
            }
            None => Box::new(file),
        };
        if gzip {
            source = Box::new(GzDecoder::new(source));
        }

        debug!(
            path = %path.display(),
            gzip,
            progress = options.progress.is_some(),
            "opening csv file"
        );
        Self::build(source, &options, path.display().to_string())
    }

    /// Reads from any byte source.
    ///
    /// Progress needs [`ReaderOptions::total_size`]; without it the progress
    /// setting is ignored.
    pub fn from_reader<R: Read + 'static>(reader: R, options: ReaderOptions) -> Result<Self> {
        let source: Box<dyn Read> = match (options.progress, options.total_size) {
            (Some(progress), Some(total)) => Box::new(ProgressReader::new(
                reader,
                total,
                progress,
                progress.draw_target(),
            )),
            (Some(_), None) => {
                debug!("progress skipped: source size unknown");
                Box::new(reader)
            }
            (None, _) => Box::new(reader),
        };
        Self::build(source, &options, "<reader>".to_string())
    }

    fn build(source: Box<dyn Read>, options: &ReaderOptions, name: String) -> Result<Self> {
        let mut inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(options.delimiter)
            .flexible(options.flexible)
            .from_reader(source);

        let mut record = StringRecord::new();
        let found = inner
            .read_record(&mut record)
            .map_err(|source| CsvxError::Header { source })?;
        if !found {
            return Err(CsvxError::MissingHeader);
        }
        let header: Vec<String> = record.iter().map(str::to_string).collect();
        debug!(source = %name, columns = header.len(), "read header");

        Ok(Self {
            inner: Some(inner),
            header,
            row: StringRecord::new(),
            error: None,
            exhausted: false,
            ctx: options.scan_context(),
            source: name,
            rows: 0,
        })
    }

    /// Moves to the next data row.
    ///
    /// Returns `false` at end of input. A failed read still returns `true`;
    /// the failure is stored and returned by the next scan. After an I/O
    /// failure the following call returns `false`.
    pub fn advance(&mut self) -> bool {
        self.error = None;
        if self.exhausted {
            return false;
        }
        let Some(inner) = self.inner.as_mut() else {
            return false;
        };

        match inner.read_record(&mut self.row) {
            Ok(true) => {
                self.rows += 1;
                true
            }
            Ok(false) => {
                self.exhausted = true;
                debug!(source = %self.source, rows = self.rows, "end of input");
                false
            }
            Err(err) => {
                warn!(source = %self.source, error = %err, "couldn't read row");
                if err.is_io_error() {
                    self.exhausted = true;
                }
                self.error = Some(Arc::new(err));
                true
            }
        }
    }

    /// Failure stored by the last [`advance`](Self::advance), if any.
    pub fn err(&self) -> Option<CsvxError> {
        self.error.as_ref().map(|source| CsvxError::Read {
            source: Arc::clone(source),
        })
    }

    /// Header cells as read from the first row.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Raw cells of the current row.
    pub fn row(&self) -> &StringRecord {
        &self.row
    }

    /// Line number where the current row starts.
    pub fn line(&self) -> Option<u64> {
        self.row.position().map(csv::Position::line)
    }

    /// Number of data rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows
    }

    /// Conversion settings applied by the scan methods.
    pub fn scan_context(&self) -> ScanContext {
        self.ctx
    }

    /// Whether [`Reader::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Scans the current row into `destinations` by position.
    pub fn scan<'a, I>(&self, destinations: I) -> Result<()>
    where
        I: IntoIterator<Item = Destination<'a>>,
    {
        self.ready()?;
        scan_row(&self.ctx, &self.row, destinations)
    }

    /// Scans the current row into `record` by column name.
    ///
    /// Resolves the layout on every call; use [`bind`](Self::bind) and
    /// [`scan_bound`](Self::scan_bound) in loops.
    pub fn scan_struct<T: CsvRecord>(&self, record: &mut T) -> Result<()> {
        self.ready()?;
        let binding = self.bind::<T>()?;
        binding.scan(&self.ctx, &self.row, record)
    }

    /// Resolves `T`'s layout against the header.
    pub fn bind<T: CsvRecord>(&self) -> Result<RecordBinding<T>> {
        T::layout().resolve(&self.header)
    }

    /// Scans the current row through a binding from [`Reader::bind`].
    pub fn scan_bound<T>(&self, binding: &RecordBinding<T>, record: &mut T) -> Result<()> {
        self.ready()?;
        binding.scan(&self.ctx, &self.row, record)
    }

    /// Looks up column indexes in the header.
    pub fn find_columns<N: AsRef<str>>(
        &self,
        names: &[N],
    ) -> Result<HashMap<String, usize>> {
        find_columns(&self.header, names)
    }

    /// Releases the source and finishes any progress line. Safe to call
    /// more than once.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(source = %self.source, rows = self.rows, "closed reader");
        }
    }

    fn ready(&self) -> Result<()> {
        if self.inner.is_none() {
            return Err(CsvxError::Closed);
        }
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("source", &self.source)
            .field("header", &self.header)
            .field("rows", &self.rows)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
