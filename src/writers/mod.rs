/*!
# Writers module
Contains the logic for writing the output tables for the preprocess and evaluate commands.
*/
/// Generic CSV/TSV row writers, plus the predictions and merged tables
pub mod csv_table;
/// Writes the reconciled sequence table
pub mod reconciled_table;
