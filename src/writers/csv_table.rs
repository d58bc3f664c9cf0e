use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data_types::prediction::{MergedTable, Prediction};
use crate::util::file_io::{delimiter_for, is_gzipped};

/// Writes serializable rows to any writer, with a header taken from the row field names.
/// # Arguments
/// * `rows` - the rows to write, in order
/// * `writer` - the destination
/// * `delimiter` - field delimiter
/// # Errors
/// * if serialization or writing fails
pub fn write_rows<T: Serialize, W: Write>(rows: impl IntoIterator<Item = T>, writer: W, delimiter: u8) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Saves rows to a file; ".tsv" files are tab-delimited and ".gz" files are gzipped.
/// The file is always created fresh.
/// # Errors
/// * if the file cannot be created or written
pub fn save_rows<T: Serialize>(rows: impl IntoIterator<Item = T>, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let delimiter = delimiter_for(out_filename);
    if is_gzipped(out_filename) {
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        write_rows(rows, &mut encoder, delimiter)
            .with_context(|| format!("Error while writing {out_filename:?}:"))?;
        encoder.finish()
            .with_context(|| format!("Error while finishing {out_filename:?}:"))?;
    } else {
        write_rows(rows, file, delimiter)
            .with_context(|| format!("Error while writing {out_filename:?}:"))?;
    }
    Ok(())
}

/// Saves the raw predictions file: `Variant`, `delta_elbo`
pub fn save_predictions(predictions: &[Prediction], out_filename: &Path) -> anyhow::Result<()> {
    save_rows(predictions.iter(), out_filename)
}

/// Saves the merged evaluation file: `Variant`, `scaled_effect1`, `delta_elbo`
pub fn save_merged(merged: &MergedTable, out_filename: &Path) -> anyhow::Result<()> {
    save_rows(merged.rows().iter(), out_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::prediction::MergedRow;
    use crate::data_types::variant::Variant;
    use crate::parsing::prediction_tables::read_predictions;

    #[test]
    fn test_write_predictions() {
        let predictions = vec![
            Prediction { variant: Variant::new(b'M', 1, b'A'), delta_elbo: -2.5 },
            Prediction { variant: Variant::new(b'K', 2, b'W'), delta_elbo: 0.75 },
        ];
        let mut buffer = vec![];
        write_rows(predictions.iter(), &mut buffer, b',').unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert_eq!(text, "Variant,delta_elbo\nM1A,-2.5\nK2W,0.75\n");

        // and the loader accepts what we wrote
        assert_eq!(read_predictions(buffer.as_slice(), b',').unwrap(), predictions);
    }

    #[test]
    fn test_write_merged() {
        let merged = MergedTable::new(vec![
            MergedRow { variant: Variant::new(b'K', 11, b'E'), scaled_effect1: 0.5, delta_elbo: -1.0 },
        ]);
        let mut buffer = vec![];
        write_rows(merged.rows().iter(), &mut buffer, b'\t').unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "Variant\tscaled_effect1\tdelta_elbo\nK11E\t0.5\t-1.0\n");
    }

    #[test]
    fn test_scored_predictions_through_merge() {
        use crate::correlation::spearman_merged;
        use crate::data_types::prediction::Measurement;
        use crate::mutation_scorer::{score_single_mutants, ScorerConfigBuilder, WorkingAlignment};
        use crate::parsing::prediction_tables::load_predictions;
        use crate::prediction_merger::merge_predictions;

        // deterministic oracle: later positions and 'W' substitutions score higher
        let oracle = |sequence: &[u8]| -> anyhow::Result<f64> {
            Ok(sequence.iter().enumerate()
                .filter(|&(_, &c)| c == b'W')
                .map(|(i, _)| (i + 1) as f64)
                .sum())
        };
        let alignment = WorkingAlignment::with_alphabet(b"AC".to_vec(), b"ACW".to_vec());
        let config = ScorerConfigBuilder::default().iterations(3).build().unwrap();
        let predictions = score_single_mutants(&alignment, &oracle, &config).unwrap();

        let out_filename = std::env::temp_dir().join(format!("mutfit_predictions_{}.csv.gz", std::process::id()));
        save_predictions(&predictions, &out_filename).unwrap();
        let loaded = load_predictions(&out_filename).unwrap();
        std::fs::remove_file(&out_filename).unwrap();
        assert_eq!(loaded, predictions);

        // alignment position 1 is experimental position 101
        let experimental: Vec<Measurement> = [("A101C", 0.1), ("A101W", 0.2), ("C102A", 0.3), ("C102W", 0.4)]
            .iter()
            .map(|&(text, scaled_effect1)| Measurement { variant: text.parse().unwrap(), scaled_effect1 })
            .collect();
        let merged = merge_predictions(&loaded, &experimental, 101).unwrap();
        assert_eq!(merged.predicted(), vec![0.0, 1.0, 0.0, 2.0]);

        let report = spearman_merged(&merged).unwrap();
        assert_eq!(report.n, 4);
        assert!(report.coefficient > 0.0);
    }
}
