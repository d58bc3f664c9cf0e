/// Predictions, measurements, and the merged table built from them
pub mod prediction;
/// Retention counts from a reconciliation pass
pub mod reconcile_stats;
/// Sequence records and the table that groups them around a reference
pub mod sequence_record;
/// Single amino-acid substitution identifiers
pub mod variant;
