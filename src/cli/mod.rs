/*!
# CLI module
Command line interface functionality that is specific to mutfit.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The evaluate CLI subcommand
pub mod evaluate;
/// The preprocess CLI subcommand
pub mod preprocess;
