/*!
# Prediction merger
Joins model predictions onto experimental measurements.
Predictions are emitted in 1-based alignment coordinates, so they are shifted into experimental coordinates before the join.
Every (non-synonymous) experimental variant must find exactly one prediction; rows are never silently dropped.
*/
use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::data_types::prediction::{Measurement, MergedRow, MergedTable, Prediction};
use crate::data_types::variant::Variant;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("experimental variant {variant} (row {row}) has no matching prediction")]
    MissingPrediction { variant: Variant, row: usize },
    #[error("variant {variant} was predicted more than once after shifting")]
    DuplicatePrediction { variant: Variant },
    #[error("shifting prediction {variant} by {offset} overflows the position")]
    PositionOverflow { variant: Variant, offset: i64 },
    #[error("start index {start_index} is out of range")]
    InvalidStartIndex { start_index: i64 },
}

/// Moves predictions from alignment coordinates into experimental coordinates.
/// `start_index` is the experimental position of alignment position 1.
/// # Errors
/// * if a shifted position does not fit in an `i64`
pub fn shift_predictions(predictions: &[Prediction], start_index: i64) -> Result<Vec<Prediction>, MergeError> {
    let offset = start_index.checked_sub(1)
        .ok_or(MergeError::InvalidStartIndex { start_index })?;
    predictions.iter()
        .map(|p| {
            let variant = p.variant.shift(offset)
                .ok_or(MergeError::PositionOverflow { variant: p.variant, offset })?;
            Ok(Prediction { variant, delta_elbo: p.delta_elbo })
        })
        .collect()
}

/// Merges predictions onto experimental measurements.
/// The output follows the experimental order, with pseudo-synonymous experimental rows (wild-type == mutant) removed first.
/// Predictions that do not correspond to an experimental variant are ignored.
/// # Arguments
/// * `predictions` - model scores in 1-based alignment coordinates
/// * `experimental` - measured effects in experimental coordinates
/// * `start_index` - the experimental position of alignment position 1
/// # Errors
/// * if an experimental variant has no prediction
/// * if two predictions map to the same variant
/// * if shifting a prediction overflows its position
pub fn merge_predictions(predictions: &[Prediction], experimental: &[Measurement], start_index: i64) -> Result<MergedTable, MergeError> {
    let shifted = shift_predictions(predictions, start_index)?;
    let mut lookup: FxHashMap<Variant, f64> = Default::default();
    lookup.reserve(shifted.len());
    for prediction in shifted.iter() {
        if lookup.insert(prediction.variant, prediction.delta_elbo).is_some() {
            return Err(MergeError::DuplicatePrediction { variant: prediction.variant });
        }
    }

    let mut rows = Vec::with_capacity(experimental.len());
    for (row, measurement) in experimental.iter().enumerate() {
        if measurement.variant.is_pseudo_synonymous() {
            debug!("Skipping pseudo-synonymous experimental variant {}", measurement.variant);
            continue;
        }

        let delta_elbo = lookup.get(&measurement.variant)
            .ok_or(MergeError::MissingPrediction { variant: measurement.variant, row })?;
        rows.push(MergedRow {
            variant: measurement.variant,
            scaled_effect1: measurement.scaled_effect1,
            delta_elbo: *delta_elbo
        });
    }

    info!(
        "Merged {} experimental variants with {} predictions ({} pseudo-synonymous rows skipped)",
        rows.len(), predictions.len(), experimental.len() - rows.len()
    );
    Ok(MergedTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(text: &str, delta_elbo: f64) -> Prediction {
        Prediction { variant: text.parse().unwrap(), delta_elbo }
    }

    fn measurement(text: &str, scaled_effect1: f64) -> Measurement {
        Measurement { variant: text.parse().unwrap(), scaled_effect1 }
    }

    #[test]
    fn test_shift_predictions() {
        let shifted = shift_predictions(&[prediction("V1R", 0.5), prediction("K3E", -1.0)], 25).unwrap();
        assert_eq!(shifted, vec![prediction("V25R", 0.5), prediction("K27E", -1.0)]);

        // a start of 1 means the coordinates already match
        let shifted = shift_predictions(&[prediction("V1R", 0.5)], 1).unwrap();
        assert_eq!(shifted, vec![prediction("V1R", 0.5)]);
    }

    #[test]
    fn test_shift_overflow() {
        let predictions = vec![prediction("A9223372036854775807C", 0.5)];
        let experimental = vec![measurement("A1C", 0.1)];
        let result = merge_predictions(&predictions, &experimental, 5);
        assert_eq!(result, Err(MergeError::PositionOverflow { variant: "A9223372036854775807C".parse().unwrap(), offset: 4 }));

        assert_eq!(shift_predictions(&[], i64::MIN), Err(MergeError::InvalidStartIndex { start_index: i64::MIN }));
    }

    #[test]
    fn test_merge() {
        let predictions = vec![
            prediction("M1A", -3.0),
            prediction("M1W", -1.0),
            prediction("K2A", -2.0),
            prediction("K2E", -0.5),
        ];
        let experimental = vec![
            measurement("K11E", 0.9),
            measurement("K11K", 1.0),
            measurement("M10A", 0.1),
        ];
        let merged = merge_predictions(&predictions, &experimental, 10).unwrap();
        assert_eq!(merged.rows(), &[
            MergedRow { variant: "K11E".parse().unwrap(), scaled_effect1: 0.9, delta_elbo: -0.5 },
            MergedRow { variant: "M10A".parse().unwrap(), scaled_effect1: 0.1, delta_elbo: -3.0 },
        ]);
        assert_eq!(merged.measured(), vec![0.9, 0.1]);
        assert_eq!(merged.predicted(), vec![-0.5, -3.0]);
    }

    #[test]
    fn test_merge_length_invariant() {
        let predictions: Vec<Prediction> = (1..=20)
            .map(|i| prediction(&format!("A{i}C"), i as f64))
            .collect();
        let experimental: Vec<Measurement> = (5..=24)
            .step_by(3)
            .map(|i| measurement(&format!("A{i}C"), i as f64))
            .collect();
        let merged = merge_predictions(&predictions, &experimental, 5).unwrap();
        assert_eq!(merged.len(), experimental.len());
    }

    #[test]
    fn test_missing_prediction() {
        let predictions = vec![prediction("M1A", -3.0)];
        let experimental = vec![
            measurement("M10A", 0.1),
            measurement("M10W", 0.2),
        ];
        let result = merge_predictions(&predictions, &experimental, 10);
        assert_eq!(result, Err(MergeError::MissingPrediction { variant: "M10W".parse().unwrap(), row: 1 }));

        // off-by-one in the start index is caught rather than producing an empty table
        let result = merge_predictions(&predictions, &experimental[..1], 11);
        assert!(matches!(result, Err(MergeError::MissingPrediction { .. })));
    }

    #[test]
    fn test_duplicate_prediction() {
        let predictions = vec![prediction("M1A", -3.0), prediction("M1A", -2.0)];
        let experimental = vec![measurement("M1A", 0.1)];
        let result = merge_predictions(&predictions, &experimental, 1);
        assert_eq!(result, Err(MergeError::DuplicatePrediction { variant: "M1A".parse().unwrap() }));
    }

    #[test]
    fn test_all_synonymous() {
        let experimental = vec![measurement("M1M", 0.1)];
        let merged = merge_predictions(&[], &experimental, 1).unwrap();
        assert!(merged.is_empty());
    }
}
