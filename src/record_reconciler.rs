/*!
# Record reconciler
Applies the alignment column filter to every mutant in a sequence table.
Mutants whose only difference from the reference was removed are dropped, and everything else is re-labeled in trimmed coordinates.
*/
use log::debug;
use std::collections::BTreeSet;

use crate::column_filter::{filter_variant, trim_columns, FilterError, FilterOutcome, MismatchPolicy};
use crate::data_types::reconcile_stats::ReconcileStats;
use crate::data_types::sequence_record::{RecordLabel, SequenceRecord, SequenceTable};

/// Converts a deletion set in original coordinates into the current coordinates of a table that already had `removed` taken out.
/// Columns that were already removed are skipped.
fn pending_columns(deleted_columns: &BTreeSet<usize>, removed: &BTreeSet<usize>) -> BTreeSet<usize> {
    deleted_columns.iter()
        .filter(|c| !removed.contains(c))
        .map(|&c| c - removed.range(..c).count())
        .collect()
}

/// Runs a single reconciliation pass over a table.
/// Measured effects are carried through unchanged, and the reference sequence is trimmed along with the records.
/// # Arguments
/// * `table` - the table to reconcile, consumed
/// * `deleted_columns` - 0-based columns to remove, in the coordinates of the original (untrimmed) sequences
/// * `policy` - how the filter treats a mutant with more than one differing column
/// # Errors
/// * if any record fails the filter preconditions, see `filter_variant(...)`
pub fn reconcile(table: SequenceTable, deleted_columns: &BTreeSet<usize>, policy: MismatchPolicy) -> Result<(SequenceTable, ReconcileStats), FilterError> {
    let (reference, records, mut removed_columns) = table.into_parts();
    let pending = pending_columns(deleted_columns, &removed_columns);
    debug!("Removing {} new columns ({} already removed)", pending.len(), deleted_columns.len() - pending.len());

    let original = records.len() as u64;
    let mut kept_records = Vec::with_capacity(records.len());
    for record in records.into_iter() {
        let variant = match record.label() {
            RecordLabel::Mutant(v) => *v,
            RecordLabel::Reference => continue
        };

        match filter_variant(record.sequence(), &reference, &variant, &pending, policy)? {
            FilterOutcome::Synonymous => {
                debug!("Deleting variant {variant} because the mutation is on a deleted column.");
            },
            FilterOutcome::Retained { variant: new_variant, sequence } => {
                kept_records.push(SequenceRecord::new(
                    RecordLabel::Mutant(new_variant), sequence, record.measured_effect()
                ));
            }
        }
    }

    let stats = ReconcileStats::new(kept_records.len() as u64, original);
    let reference = trim_columns(&reference, &pending);
    removed_columns.extend(deleted_columns.iter().cloned());

    Ok((SequenceTable::from_parts(reference, kept_records, removed_columns), stats))
}
