use anyhow::{anyhow, Context};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crate::util::file_io::open_reader;

/// Loads a column deletion set: one 0-based column index per line, no header.
/// Blank lines are skipped and duplicates are collapsed.
/// # Arguments
/// * `filename` - the file to load
/// # Errors
/// * if the file cannot be opened
/// * if any line is not a non-negative integer
pub fn load_deleted_columns(filename: &Path) -> anyhow::Result<BTreeSet<usize>> {
    let reader = open_reader(filename)?;
    read_deleted_columns(reader)
        .with_context(|| format!("Error while loading {filename:?}:"))
}

/// Parses a column deletion set from any reader, see `load_deleted_columns(...)`.
pub fn read_deleted_columns<R: Read>(reader: R) -> anyhow::Result<BTreeSet<usize>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false) // no headers in the file, disable so we do not skip first row
        .from_reader(reader);

    let mut columns = BTreeSet::new();
    for (line_index, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("Error while reading line {}", line_index + 1))?;
        let value = row.get(0)
            .ok_or(anyhow!("Missing column index on line {}", line_index + 1))?
            .trim();
        if value.is_empty() {
            continue;
        }
        let column: usize = value.parse()
            .with_context(|| format!("Invalid column index {value:?} on line {}", line_index + 1))?;
        columns.insert(column);
    }
    Ok(columns)
}
