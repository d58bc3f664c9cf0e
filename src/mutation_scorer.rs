/*!
# Mutation scorer
Scores every single mutant of a working alignment with an external, stochastic scoring model.
Each variant is sent to the model a fixed number of times and the samples are reduced to one value.

## Example usage
```rust
use mutfit::mutation_scorer::{score_single_mutants, Aggregation, ScorerConfigBuilder, WorkingAlignment};

// a toy oracle; anything implementing ScoringOracle works, including closures
let oracle = |sequence: &[u8]| -> anyhow::Result<f64> {
    Ok(sequence.iter().filter(|&&c| c == b'W').count() as f64)
};

let alignment = WorkingAlignment::with_alphabet(b"AC".to_vec(), b"ACW".to_vec());
let config = ScorerConfigBuilder::default()
    .iterations(10)
    .aggregation(Aggregation::Median)
    .build().unwrap();
let predictions = score_single_mutants(&alignment, &oracle, &config).unwrap();

let labels: Vec<String> = predictions.iter().map(|p| p.variant.to_string()).collect();
assert_eq!(labels, vec!["A1C", "A1W", "C2A", "C2W"]);
assert_eq!(predictions[1].delta_elbo, 1.0);
```
*/
use anyhow::ensure;
use derive_builder::Builder;
use indicatif::ParallelProgressIterator;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::data_types::prediction::{Prediction, PredictionTable};
use crate::data_types::variant::Variant;
use crate::util::progress_bar::get_progress_style;

/// The residues a variant is allowed to mutate to by default
pub const AMINO_ACID_ALPHABET: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
/// Default number of model samples per variant
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Anything that can produce a (possibly stochastic) score for a sequence.
/// Repeated calls with the same sequence are expected to give independent estimates.
pub trait ScoringOracle: Sync {
    /// Scores a single sequence
    /// # Errors
    /// * implementation specific; these are passed through to the caller unmodified
    fn score(&self, sequence: &[u8]) -> anyhow::Result<f64>;
}

impl<F> ScoringOracle for F
where
    F: Fn(&[u8]) -> anyhow::Result<f64> + Sync
{
    fn score(&self, sequence: &[u8]) -> anyhow::Result<f64> {
        self(sequence)
    }
}

/// How repeated model samples are reduced into one score
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum_macros::Display, Serialize)]
pub enum Aggregation {
    #[default]
    #[strum(serialize = "mean")]
    Mean,
    #[strum(serialize = "median")]
    Median
}

impl Aggregation {
    /// Reduces the samples to a single value, None if there are no samples
    pub fn aggregate(&self, mut samples: Vec<f64>) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len();
        match self {
            Aggregation::Mean => Some(samples.iter().sum::<f64>() / n as f64),
            Aggregation::Median => {
                samples.sort_by(|a, b| a.total_cmp(b));
                if n % 2 == 1 {
                    Some(samples[n / 2])
                } else {
                    Some((samples[n / 2 - 1] + samples[n / 2]) / 2.0)
                }
            }
        }
    }
}

/// Controls how the scorer samples the model
#[derive(Builder, Clone, Copy, Debug, Serialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ScorerConfig {
    /// Number of model samples per variant
    iterations: usize,
    /// Reduction applied to the samples
    aggregation: Aggregation
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            aggregation: Aggregation::default()
        }
    }
}

impl ScorerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.iterations == Some(0) {
            return Err("iterations must be >0".to_string());
        }
        Ok(())
    }
}

impl ScorerConfig {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}

/// The sequence the model sees, along with the residues we are allowed to substitute in
#[derive(Clone, Debug)]
pub struct WorkingAlignment {
    /// The reference sequence in alignment coordinates
    reference: Vec<u8>,
    /// Allowed residues; reference columns holding anything else (e.g. gaps) are not mutated
    alphabet: Vec<u8>
}

impl WorkingAlignment {
    /// Creates an alignment over the 20 canonical amino acids
    pub fn new(reference: Vec<u8>) -> Self {
        Self::with_alphabet(reference, AMINO_ACID_ALPHABET.to_vec())
    }

    /// Creates an alignment with a custom residue alphabet
    pub fn with_alphabet(reference: Vec<u8>, alphabet: Vec<u8>) -> Self {
        Self { reference, alphabet }
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    /// Enumerates every single mutant, position-major and in alphabet order within a position.
    /// Positions are 1-based in alignment coordinates.
    pub fn single_mutants(&self) -> Vec<Variant> {
        let mut variants = vec![];
        for (i, &wild_type) in self.reference.iter().enumerate() {
            if !self.alphabet.contains(&wild_type) {
                continue;
            }
            for &mutant in self.alphabet.iter() {
                if mutant != wild_type {
                    variants.push(Variant::new(wild_type, i as i64 + 1, mutant));
                }
            }
        }
        variants
    }

    /// Builds the full sequence for a variant from `single_mutants()`
    /// # Errors
    /// * if the variant position is outside the alignment
    /// * if the wild-type residue does not match the reference
    pub fn mutant_sequence(&self, variant: &Variant) -> anyhow::Result<Vec<u8>> {
        let position = variant.position();
        ensure!(
            position >= 1 && position as usize <= self.reference.len(),
            "{variant} is outside the alignment (length {})", self.reference.len()
        );
        let index = position as usize - 1;
        ensure!(
            self.reference[index] == variant.wild_type(),
            "{variant} does not match reference residue {}", self.reference[index] as char
        );

        let mut sequence = self.reference.clone();
        sequence[index] = variant.mutant();
        Ok(sequence)
    }
}

/// Samples the oracle `config.iterations()` times for one sequence and reduces the result.
fn score_sequence<O: ScoringOracle + ?Sized>(sequence: &[u8], oracle: &O, config: &ScorerConfig) -> anyhow::Result<f64> {
    let samples: Vec<f64> = (0..config.iterations())
        .map(|_| oracle.score(sequence))
        .collect::<anyhow::Result<_>>()?;
    // the config builder guarantees at least one sample
    Ok(config.aggregation().aggregate(samples).unwrap_or(f64::NAN))
}

/// Scores every single mutant of the alignment.
/// Variants are scored in parallel on the current rayon pool, and the output is in `WorkingAlignment::single_mutants()` order.
/// # Arguments
/// * `alignment` - the reference and alphabet to enumerate variants from
/// * `oracle` - the model to sample
/// * `config` - sample count and aggregation
/// # Errors
/// * the first oracle error encountered, unmodified; no retries are attempted
pub fn score_single_mutants<O: ScoringOracle + ?Sized>(alignment: &WorkingAlignment, oracle: &O, config: &ScorerConfig) -> anyhow::Result<PredictionTable> {
    let variants = alignment.single_mutants();
    info!(
        "Scoring {} single mutants with {} samples each ({} aggregation)...",
        variants.len(), config.iterations(), config.aggregation()
    );

    let style = get_progress_style();
    let predictions: PredictionTable = variants.into_par_iter()
        .map(|variant| -> anyhow::Result<Prediction> {
            let sequence = alignment.mutant_sequence(&variant)?;
            let delta_elbo = score_sequence(&sequence, oracle, config)?;
            debug!("{variant} => {delta_elbo}");
            Ok(Prediction { variant, delta_elbo })
        })
        .progress_with_style(style)
        .collect::<anyhow::Result<_>>()?;

    info!("Scoring complete.");
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use approx_eq::assert_approx_eq;
    use rustc_hash::FxHashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns 0, 1, 2, ... on successive calls for the same sequence, plus the number of 'W' residues times 100
    struct CountingOracle {
        calls: Mutex<FxHashMap<Vec<u8>, usize>>,
        total_calls: AtomicUsize
    }

    impl CountingOracle {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Default::default()),
                total_calls: AtomicUsize::new(0)
            }
        }
    }

    impl ScoringOracle for CountingOracle {
        fn score(&self, sequence: &[u8]) -> anyhow::Result<f64> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(sequence.to_vec()).or_insert(0);
            let value = *count as f64 + 100.0 * sequence.iter().filter(|&&c| c == b'W').count() as f64;
            *count += 1;
            Ok(value)
        }
    }

    #[test]
    fn test_aggregate() {
        assert_approx_eq!(Aggregation::Mean.aggregate(vec![1.0, 2.0, 6.0]).unwrap(), 3.0);
        assert_approx_eq!(Aggregation::Median.aggregate(vec![6.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_approx_eq!(Aggregation::Median.aggregate(vec![4.0, 1.0, 2.0, 10.0]).unwrap(), 3.0);
        assert_eq!(Aggregation::Mean.aggregate(vec![]), None);
    }

    #[test]
    fn test_config() {
        let config = ScorerConfig::default();
        assert_eq!(config.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(config.aggregation(), Aggregation::Mean);

        let config = ScorerConfigBuilder::default().build().unwrap();
        assert_eq!(config.iterations(), DEFAULT_ITERATIONS);

        assert!(ScorerConfigBuilder::default().iterations(0).build().is_err());
    }

    #[test]
    fn test_single_mutants() {
        let alignment = WorkingAlignment::with_alphabet(b"A-C".to_vec(), b"ACW".to_vec());
        let labels: Vec<String> = alignment.single_mutants().iter().map(|v| v.to_string()).collect();
        // the gap column is skipped but still counts toward positions
        assert_eq!(labels, vec!["A1C", "A1W", "C3A", "C3W"]);

        let alignment = WorkingAlignment::new(b"MK".to_vec());
        let variants = alignment.single_mutants();
        assert_eq!(variants.len(), 38);
        assert!(variants.iter().all(|v| !v.is_pseudo_synonymous()));
    }

    #[test]
    fn test_mutant_sequence() {
        let alignment = WorkingAlignment::new(b"MKV".to_vec());
        assert_eq!(alignment.mutant_sequence(&"K2W".parse().unwrap()).unwrap(), b"MWV".to_vec());
        assert!(alignment.mutant_sequence(&"K4W".parse().unwrap()).is_err());
        assert!(alignment.mutant_sequence(&"K0W".parse().unwrap()).is_err());
        assert!(alignment.mutant_sequence(&"A2W".parse().unwrap()).is_err());
    }

    #[test]
    fn test_exact_sample_count() {
        let oracle = CountingOracle::new();
        let alignment = WorkingAlignment::with_alphabet(b"ACA".to_vec(), b"ACW".to_vec());
        let config = ScorerConfigBuilder::default()
            .iterations(7)
            .build().unwrap();
        let predictions = score_single_mutants(&alignment, &oracle, &config).unwrap();

        assert_eq!(predictions.len(), 6);
        assert_eq!(oracle.total_calls.load(Ordering::SeqCst), 6 * 7);
        let calls = oracle.calls.lock().unwrap();
        assert_eq!(calls.len(), 6);
        assert!(calls.values().all(|&c| c == 7));
    }

    #[test]
    fn test_order_and_values() {
        let oracle = CountingOracle::new();
        let alignment = WorkingAlignment::with_alphabet(b"ACA".to_vec(), b"ACW".to_vec());
        let config = ScorerConfigBuilder::default()
            .iterations(5)
            .aggregation(Aggregation::Mean)
            .build().unwrap();
        let predictions = score_single_mutants(&alignment, &oracle, &config).unwrap();

        let labels: Vec<String> = predictions.iter().map(|p| p.variant.to_string()).collect();
        assert_eq!(labels, vec!["A1C", "A1W", "C2A", "C2W", "A3C", "A3W"]);

        // samples are 0..5 so the mean is 2, and each W adds 100
        let expected = [2.0, 102.0, 2.0, 102.0, 2.0, 102.0];
        for (prediction, value) in predictions.iter().zip(expected.iter()) {
            assert_approx_eq!(prediction.delta_elbo, *value);
        }
    }

    #[test]
    fn test_oracle_failure() {
        let oracle = |sequence: &[u8]| -> anyhow::Result<f64> {
            if sequence == b"AW" {
                bail!("model parameters not loaded");
            }
            Ok(1.0)
        };
        let alignment = WorkingAlignment::with_alphabet(b"AC".to_vec(), b"ACW".to_vec());
        let config = ScorerConfigBuilder::default()
            .iterations(3)
            .build().unwrap();
        let error = score_single_mutants(&alignment, &oracle, &config).unwrap_err();
        assert_eq!(error.to_string(), "model parameters not loaded");
    }
}
