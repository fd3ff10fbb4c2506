use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info_span};

use csvx::{ProgressOptions, Reader, ReaderOptions};
use csvx_cli::check::{check_reader, count_rows};
use csvx_cli::types::{CheckResult, CountResult};

use crate::cli::{CheckArgs, CountArgs, FindArgs, InputArgs};

pub fn run_header(args: &InputArgs) -> Result<Vec<String>> {
    let mut reader = open(args, reader_options(args)?)?;
    let header = reader.header().to_vec();
    reader.close();
    Ok(header)
}

pub fn run_count(args: &CountArgs) -> Result<CountResult> {
    let span = info_span!("count", file = %args.input.file.display());
    let _guard = span.enter();

    let mut options = reader_options(&args.input)?;
    if args.progress {
        options = options.with_progress(ProgressOptions::default());
    }
    let mut reader = open(&args.input, options)?;
    let start = Instant::now();
    let result = count_rows(&mut reader);
    debug!(
        rows = result.rows,
        read_errors = result.read_errors,
        elapsed_ms = start.elapsed().as_millis(),
        "counted rows"
    );
    Ok(result)
}

/// Returns `(name, index)` pairs in header order.
pub fn run_find(args: &FindArgs) -> Result<Vec<(String, usize)>> {
    let mut reader = open(&args.input, reader_options(&args.input)?)?;
    let found = reader.find_columns(&args.names);
    reader.close();

    let mut columns: Vec<(String, usize)> = found?.into_iter().collect();
    columns.sort_by_key(|(_, index)| *index);
    Ok(columns)
}

pub fn run_check(args: &CheckArgs) -> Result<CheckResult> {
    let span = info_span!("check", file = %args.input.file.display());
    let _guard = span.enter();

    let mut options = reader_options(&args.input)?;
    if let Some(tz) = args.tz {
        options = options.with_tz(tz);
    }
    if args.progress {
        options = options.with_progress(ProgressOptions::default());
    }
    let mut reader = open(&args.input, options)?;
    check_reader(&mut reader, &args.types, args.max_errors)
}

fn reader_options(args: &InputArgs) -> Result<ReaderOptions> {
    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter must be an ASCII character, got '{}'", args.delimiter))?;
    Ok(ReaderOptions::default()
        .with_delimiter(delimiter)
        .with_flexible(args.flexible))
}

fn open(args: &InputArgs, options: ReaderOptions) -> Result<Reader> {
    Reader::open_with(&args.file, options)
        .with_context(|| format!("read {}", args.file.display()))
}
