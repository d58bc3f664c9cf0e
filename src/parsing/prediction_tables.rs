use anyhow::{bail, Context};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

use crate::data_types::prediction::{ExperimentalTable, Measurement, PredictionTable};
use crate::data_types::variant::Variant;
use crate::util::file_io::{delimiter_for, open_reader};

/// Experimental row as read from disk; reconciled tables leave `scaled_effect1` empty for unmeasured variants
#[derive(Deserialize)]
struct ExperimentalRow {
    #[serde(rename = "Variant")]
    variant: Variant,
    #[serde(default)]
    scaled_effect1: Option<f64>
}

/// Deserializes every row of a headered CSV/TSV, tagging errors with the row index.
fn read_rows<T: DeserializeOwned, R: Read>(reader: R, delimiter: u8) -> anyhow::Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    csv_reader.deserialize()
        .enumerate()
        .map(|(row_index, result)| result.with_context(|| format!("Error while parsing row {row_index}")))
        .collect()
}

/// Loads raw model predictions with columns `Variant` and `delta_elbo`.
/// # Errors
/// * if the file cannot be opened or parsed, including malformed variants
pub fn load_predictions(filename: &Path) -> anyhow::Result<PredictionTable> {
    let reader = open_reader(filename)?;
    read_predictions(reader, delimiter_for(filename))
        .with_context(|| format!("Error while loading {filename:?}:"))
}

/// Parses raw model predictions from any reader, see `load_predictions(...)`.
pub fn read_predictions<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<PredictionTable> {
    read_rows(reader, delimiter)
}

/// Loads experimental measurements with columns `Variant` and `scaled_effect1`; other columns are ignored.
/// # Errors
/// * if the file cannot be opened or parsed, including malformed variants
/// * if any row has no `scaled_effect1` value
pub fn load_experimental(filename: &Path) -> anyhow::Result<ExperimentalTable> {
    let reader = open_reader(filename)?;
    read_experimental(reader, delimiter_for(filename))
        .with_context(|| format!("Error while loading {filename:?}:"))
}

/// Parses experimental measurements from any reader, see `load_experimental(...)`.
pub fn read_experimental<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<ExperimentalTable> {
    let rows: Vec<ExperimentalRow> = read_rows(reader, delimiter)?;
    rows.into_iter()
        .enumerate()
        .map(|(row_index, row)| match row.scaled_effect1 {
            Some(scaled_effect1) => Ok(Measurement { variant: row.variant, scaled_effect1 }),
            None => bail!(
                "Row {row_index} ({}) has no scaled_effect1 measurement; remove unmeasured variants before evaluating",
                row.variant
            )
        })
        .collect()
}
