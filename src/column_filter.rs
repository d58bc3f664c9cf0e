/*!
# Alignment column filter
Recomputes a single-mutant variant after a set of alignment columns has been removed from both the mutant and the reference sequence.
Positions in the returned variant are 1-based in the trimmed coordinate system.
If the only difference between the two sequences sat in a removed column, the mutant is now identical to the reference and is reported as synonymous.

## Example usage
```rust
use mutfit::column_filter::{filter_variant, FilterOutcome, MismatchPolicy};
use std::collections::BTreeSet;

let reference = b"DVPLPAGW";
let mutant = b"DRPLPAGW";
let variant = "V171R".parse().unwrap();

// the mutated column is removed, nothing is left to score
let deleted: BTreeSet<usize> = [0, 1].into_iter().collect();
let outcome = filter_variant(mutant, reference, &variant, &deleted, MismatchPolicy::LastWins).unwrap();
assert_eq!(outcome, FilterOutcome::Synonymous);

// the mutated column survives and is the first retained column
let deleted: BTreeSet<usize> = [0, 2].into_iter().collect();
let outcome = filter_variant(mutant, reference, &variant, &deleted, MismatchPolicy::LastWins).unwrap();
assert_eq!(outcome, FilterOutcome::Retained {
    variant: "V1R".parse().unwrap(),
    sequence: b"RLPAGW".to_vec()
});
```
*/
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use strum_macros::EnumString;

use crate::data_types::variant::Variant;

/// Controls what happens when a mutant differs from the reference at more than one retained column
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum_macros::Display, EnumString, Serialize, clap::ValueEnum)]
pub enum MismatchPolicy {
    /// The last differing column is used as the mutated position
    #[default]
    #[strum(ascii_case_insensitive, serialize = "last_wins")]
    #[clap(name = "last_wins")]
    LastWins,
    /// More than one differing column is an error
    #[strum(ascii_case_insensitive, serialize = "strict")]
    #[clap(name = "strict")]
    Strict,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("{variant}: mutant sequence length ({mutant_len}) does not match reference length ({reference_len})")]
    LengthMismatch { variant: Variant, mutant_len: usize, reference_len: usize },
    #[error("{variant}: mutant differs from reference at {count} retained columns, expected a single mutant")]
    MultipleMismatches { variant: Variant, count: usize },
}

/// Result of filtering a single variant
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterOutcome {
    /// The mutation fell in a removed column, the record should be dropped
    Synonymous,
    /// The mutation survived trimming
    Retained {
        /// Original residues at the trimmed, 1-based position
        variant: Variant,
        /// The trimmed mutant sequence
        sequence: Vec<u8>
    }
}

/// Removes the given columns from a sequence, preserving the order of everything else.
/// # Arguments
/// * `sequence` - the full sequence
/// * `deleted_columns` - 0-based columns to drop; values past the end are ignored
pub fn trim_columns(sequence: &[u8], deleted_columns: &BTreeSet<usize>) -> Vec<u8> {
    if deleted_columns.is_empty() {
        return sequence.to_vec();
    }
    sequence.iter()
        .enumerate()
        .filter(|(i, _c)| !deleted_columns.contains(i))
        .map(|(_i, &c)| c)
        .collect()
}

/// Recomputes a variant relative to the trimmed coordinate system.
/// The wild-type and mutant residues of the returned variant are copied from `variant`, they are not re-read from the sequences.
/// # Arguments
/// * `mutant_sequence` - the full sequence carrying the mutation
/// * `reference_sequence` - the full reference sequence, must be the same length as `mutant_sequence`
/// * `variant` - the variant carried by `mutant_sequence`
/// * `deleted_columns` - 0-based columns to remove from both sequences
/// * `policy` - how to handle a mutant that differs at more than one retained column
/// # Errors
/// * if the sequences have different lengths
/// * if the policy is strict and more than one retained column differs
pub fn filter_variant(
    mutant_sequence: &[u8], reference_sequence: &[u8], variant: &Variant,
    deleted_columns: &BTreeSet<usize>, policy: MismatchPolicy
) -> Result<FilterOutcome, FilterError> {
    if mutant_sequence.len() != reference_sequence.len() {
        return Err(FilterError::LengthMismatch {
            variant: *variant,
            mutant_len: mutant_sequence.len(),
            reference_len: reference_sequence.len()
        });
    }

    let trimmed_mutant = trim_columns(mutant_sequence, deleted_columns);
    let trimmed_reference = trim_columns(reference_sequence, deleted_columns);

    // scan the whole thing, we need the count for the strict policy
    let mismatches: Vec<usize> = trimmed_mutant.iter()
        .zip(trimmed_reference.iter())
        .positions(|(m, r)| m != r)
        .collect();

    if policy == MismatchPolicy::Strict && mismatches.len() > 1 {
        return Err(FilterError::MultipleMismatches { variant: *variant, count: mismatches.len() });
    }

    Ok(match mismatches.last() {
        None => FilterOutcome::Synonymous,
        Some(&index) => FilterOutcome::Retained {
            variant: variant.with_position(index as i64 + 1),
            sequence: trimmed_mutant
        }
    })
}
