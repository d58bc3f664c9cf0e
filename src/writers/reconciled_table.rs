use serde::Serialize;
use std::path::Path;

use crate::data_types::sequence_record::SequenceTable;
use crate::writers::csv_table::{save_rows, write_rows};

/// Contains all the data written to each row of the reconciled table
#[derive(Serialize)]
struct ReconciledRow<'a> {
    /// Variant in trimmed coordinates
    #[serde(rename = "Variant")]
    variant: String,
    /// Measured effect, empty if there was none
    scaled_effect1: Option<f64>,
    /// The trimmed sequence
    sequence: &'a str
}

/// Builds the output rows; the reference row is not written, only mutants.
fn reconciled_rows(table: &SequenceTable) -> impl Iterator<Item = ReconciledRow<'_>> {
    table.records().iter()
        .filter_map(|record| {
            let variant = record.variant()?;
            Some(ReconciledRow {
                variant: variant.to_string(),
                scaled_effect1: record.measured_effect(),
                // sequences come from UTF-8 input, so this only fails on corrupted data
                sequence: std::str::from_utf8(record.sequence()).unwrap_or_default()
            })
        })
}

/// Writes a reconciled table (`Variant`, `scaled_effect1`, `sequence`) to any writer.
pub fn write_reconciled_table<W: std::io::Write>(table: &SequenceTable, writer: W, delimiter: u8) -> csv::Result<()> {
    write_rows(reconciled_rows(table), writer, delimiter)
}

/// Saves a reconciled table to a file, see `save_rows(...)` for format handling.
pub fn save_reconciled_table(table: &SequenceTable, out_filename: &Path) -> anyhow::Result<()> {
    save_rows(reconciled_rows(table), out_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_filter::MismatchPolicy;
    use crate::parsing::sequence_table::read_sequence_table;
    use crate::record_reconciler::reconcile;

    #[test]
    fn test_write_reconciled_table() {
        let data = "\
Variant,mut_type,sequence,scaled_effect1
_wt,synonymous,MKVL,1.0
K2W,missense,MWVL,0.25
V3A,missense,MKAL,
L4P,missense,MKVP,0.5
";
        let table = read_sequence_table(data.as_bytes(), b',').unwrap();
        let deleted = [0, 2].into_iter().collect();
        let (table, _stats) = reconcile(table, &deleted, MismatchPolicy::Strict).unwrap();

        let mut buffer = vec![];
        write_reconciled_table(&table, &mut buffer, b',').unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Variant,scaled_effect1,sequence\nK1W,0.25,WL\nL2P,0.5,KP\n"
        );
    }
}
