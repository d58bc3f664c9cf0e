use serde::Serialize;
use std::fmt;

/// Retention statistics from a single reconciliation pass
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ReconcileStats {
    /// Number of mutant records that survived the pass
    pub kept: u64,
    /// Number of mutant records going into the pass
    pub original: u64
}

impl ReconcileStats {
    /// Constructor
    pub fn new(kept: u64, original: u64) -> Self {
        Self { kept, original }
    }

    /// Number of records dropped because their mutation became a no-op
    pub fn dropped(&self) -> u64 {
        self.original - self.kept
    }

    /// Number of rows in the input table; every table carries exactly one reference row on top of its mutants
    pub fn input_rows(&self) -> u64 {
        self.original + 1
    }

    /// Percentage of kept mutants relative to all input rows, reference included
    pub fn percent_retained(&self) -> f64 {
        100.0 * self.kept as f64 / self.input_rows() as f64
    }
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Left with {} sequences (of {}, {:.3} %).", self.kept, self.input_rows(), self.percent_retained())
    }
}
