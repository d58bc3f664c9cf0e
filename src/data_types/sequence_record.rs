use std::collections::BTreeSet;

use crate::data_types::variant::Variant;

/// The literal used in the input tables to mark the unmutated reference row
pub const SYNONYMOUS_LABEL: &str = "synonymous";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SequenceTableError {
    #[error("no reference record found, exactly one row must be labeled \"synonymous\"")]
    MissingReference,
    #[error("found {count} reference records, exactly one row must be labeled \"synonymous\"")]
    MultipleReferences { count: usize },
}

/// Label on a single row of a sequence table
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordLabel {
    /// The sentinel row carrying the unmutated reference sequence
    Reference,
    /// A single-mutant row
    Mutant(Variant)
}

/// One row of a sequence table: a labeled sequence with an optional measured effect
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceRecord {
    /// Reference sentinel or the variant this sequence carries
    label: RecordLabel,
    /// Residues of the full sequence
    sequence: Vec<u8>,
    /// Experimentally measured effect, if one was provided
    measured_effect: Option<f64>
}

impl SequenceRecord {
    /// Constructor
    pub fn new(label: RecordLabel, sequence: Vec<u8>, measured_effect: Option<f64>) -> Self {
        Self { label, sequence, measured_effect }
    }

    /// Returns the variant for a mutant row, None for the reference row
    pub fn variant(&self) -> Option<&Variant> {
        match &self.label {
            RecordLabel::Reference => None,
            RecordLabel::Mutant(v) => Some(v)
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.label, RecordLabel::Reference)
    }

    pub fn label(&self) -> &RecordLabel {
        &self.label
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn measured_effect(&self) -> Option<f64> {
        self.measured_effect
    }
}

/// A full set of sequence records split into the reference and the mutants.
/// Also tracks which alignment columns (in the original coordinates) have already been removed from every sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceTable {
    /// The unmutated reference sequence
    reference: Vec<u8>,
    /// All mutant records, in input order
    records: Vec<SequenceRecord>,
    /// Original 0-based columns that have already been removed from `reference` and `records`
    removed_columns: BTreeSet<usize>
}

impl SequenceTable {
    /// Builds a table from raw rows, pulling out the single reference row.
    /// # Arguments
    /// * `rows` - all rows from the input, including the reference row
    /// # Errors
    /// * if there is not exactly one reference row
    pub fn from_records(rows: Vec<SequenceRecord>) -> Result<Self, SequenceTableError> {
        let (references, records): (Vec<SequenceRecord>, Vec<SequenceRecord>) = rows.into_iter()
            .partition(|r| r.is_reference());

        let mut references = references.into_iter();
        let reference = match (references.next(), references.len()) {
            (Some(r), 0) => r.sequence,
            (None, _) => return Err(SequenceTableError::MissingReference),
            (Some(_), extra) => return Err(SequenceTableError::MultipleReferences { count: extra + 1 })
        };

        Ok(Self {
            reference,
            records,
            removed_columns: Default::default()
        })
    }

    /// Builds an already-trimmed table; used by the reconciler after a pass
    pub(crate) fn from_parts(reference: Vec<u8>, records: Vec<SequenceRecord>, removed_columns: BTreeSet<usize>) -> Self {
        Self { reference, records, removed_columns }
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn removed_columns(&self) -> &BTreeSet<usize> {
        &self.removed_columns
    }

    /// Number of mutant records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the table, returning the reference and mutant records
    pub fn into_parts(self) -> (Vec<u8>, Vec<SequenceRecord>, BTreeSet<usize>) {
        (self.reference, self.records, self.removed_columns)
    }
}
