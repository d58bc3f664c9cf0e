/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Loads the column deletion set
pub mod deleted_columns;
/// Loads raw predictions and experimental measurements
pub mod prediction_tables;
/// Loads the sequence table, including the reference row
pub mod sequence_table;
