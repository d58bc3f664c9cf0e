use serde::{Deserialize, Serialize};

use crate::data_types::variant::Variant;

/// A single model prediction; this is also the row layout of the raw predictions file
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Prediction {
    /// The scored variant
    #[serde(rename = "Variant")]
    pub variant: Variant,
    /// Aggregated model score for the variant
    pub delta_elbo: f64
}

/// A single experimental measurement; extra columns in the input file are ignored
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Measurement {
    /// The measured variant
    #[serde(rename = "Variant")]
    pub variant: Variant,
    /// Measured effect of the variant
    pub scaled_effect1: f64
}

/// One row of the merged evaluation table
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MergedRow {
    /// The shared variant identifier, in experimental coordinates
    #[serde(rename = "Variant")]
    pub variant: Variant,
    /// Measured effect of the variant
    pub scaled_effect1: f64,
    /// Model score of the variant
    pub delta_elbo: f64
}

/// Ordered model predictions, as produced by the scorer
pub type PredictionTable = Vec<Prediction>;
/// Ordered experimental measurements
pub type ExperimentalTable = Vec<Measurement>;

/// Experimental measurements joined with predictions, in experimental order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedTable {
    rows: Vec<MergedRow>
}

impl MergedTable {
    /// Constructor
    pub fn new(rows: Vec<MergedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The measured column, in row order
    pub fn measured(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.scaled_effect1).collect()
    }

    /// The predicted column, in row order
    pub fn predicted(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.delta_elbo).collect()
    }
}
