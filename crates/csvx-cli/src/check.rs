//! Row-by-row type checking of a CSV source.

use anyhow::{Context, Result};
use csvx::{CsvxError, Destination, Reader};
use tracing::{debug, info_span};

use crate::types::{CheckResult, ColumnSpec, CountResult, RowFailure, Slot};

/// Scans every row against `specs`, keeping at most `max_failures` details.
///
/// Rows that fail are counted even after the detail limit is reached.
pub fn check_reader(
    reader: &mut Reader,
    specs: &[ColumnSpec],
    max_failures: usize,
) -> Result<CheckResult> {
    let span = info_span!("check", columns = specs.len());
    let _guard = span.enter();

    let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
    let found = reader
        .find_columns(&names)
        .context("resolve --types columns")?;

    let mut slots: Vec<Option<Slot>> = Vec::new();
    slots.resize_with(reader.header().len(), || None);
    for spec in specs {
        let Some(&index) = found.get(&spec.name) else {
            continue;
        };
        debug!(column = %spec.name, index, kind = %spec.kind, "checking column");
        slots[index] = spec.kind.slot();
    }

    let mut result = CheckResult::default();
    while reader.advance() {
        result.rows += 1;
        let scanned = reader.scan(
            slots
                .iter_mut()
                .map(|slot| slot.as_mut().map_or(Destination::Skip, Slot::destination)),
        );
        if let Err(err) = scanned {
            result.failed_rows += 1;
            if result.failures.len() < max_failures {
                result.failures.push(RowFailure {
                    line: reader.line(),
                    row: result.rows,
                    column: failing_column(&err, reader.header()),
                    message: err.to_string(),
                });
            }
        }
    }
    reader.close();

    Ok(result)
}

/// Counts data rows, tallying rows that could not be read.
pub fn count_rows(reader: &mut Reader) -> CountResult {
    let mut result = CountResult::default();
    while reader.advance() {
        if reader.err().is_some() {
            result.read_errors += 1;
        } else {
            result.rows += 1;
        }
    }
    reader.close();
    result
}

fn failing_column(err: &CsvxError, header: &[String]) -> Option<String> {
    err.index().and_then(|index| header.get(index).cloned())
}
