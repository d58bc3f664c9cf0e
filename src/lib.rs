/// Command line interface functionality
pub mod cli;
/// Removes alignment columns and re-labels a single variant
pub mod column_filter;
/// Rank correlation between measured and predicted effects
pub mod correlation;
/// Contains various shared data types
pub mod data_types;
/// Scores all single mutants with an external model
pub mod mutation_scorer;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Joins predictions onto experimental measurements
pub mod prediction_merger;
/// Applies the column filter across a full sequence table
pub mod record_reconciler;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
