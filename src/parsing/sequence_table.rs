use anyhow::Context;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::data_types::sequence_record::{RecordLabel, SequenceRecord, SequenceTable, SYNONYMOUS_LABEL};
use crate::data_types::variant::Variant;
use crate::util::file_io::{delimiter_for, open_reader};

/// Raw row layout of a sequence table; any other columns are ignored
#[derive(Debug, Deserialize)]
struct SequenceRow {
    /// Variant text, or the reference marker
    #[serde(rename = "Variant")]
    variant: String,
    /// Optional mutation type, "synonymous" marks the reference row
    #[serde(default)]
    mut_type: Option<String>,
    /// Full sequence
    sequence: String,
    /// Optional measured effect
    #[serde(default)]
    scaled_effect1: Option<f64>
}

impl SequenceRow {
    fn is_reference(&self) -> bool {
        self.mut_type.as_deref() == Some(SYNONYMOUS_LABEL) || self.variant == SYNONYMOUS_LABEL
    }
}

/// Loads a sequence table from a CSV/TSV file (optionally gzipped).
/// # Arguments
/// * `filename` - the table to load
/// # Errors
/// * if the file cannot be opened or parsed
/// * if any non-reference variant is malformed
/// * if there is not exactly one reference row
pub fn load_sequence_table(filename: &Path) -> anyhow::Result<SequenceTable> {
    let reader = open_reader(filename)?;
    read_sequence_table(reader, delimiter_for(filename))
        .with_context(|| format!("Error while loading {filename:?}:"))
}

/// Parses a sequence table from any reader, see `load_sequence_table(...)`.
pub fn read_sequence_table<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<SequenceTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let mut records = vec![];
    for (row_index, result) in csv_reader.deserialize().enumerate() {
        let row: SequenceRow = result
            .with_context(|| format!("Error while parsing row {row_index}"))?;

        let label = if row.is_reference() {
            RecordLabel::Reference
        } else {
            let variant: Variant = row.variant.parse()
                .with_context(|| format!("Error while parsing row {row_index}"))?;
            RecordLabel::Mutant(variant)
        };
        records.push(SequenceRecord::new(label, row.sequence.into_bytes(), row.scaled_effect1));
    }

    Ok(SequenceTable::from_records(records)?)
}
