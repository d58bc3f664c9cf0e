use anyhow::bail;
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use log::LevelFilter;
use std::path::Path;

use crate::cli::evaluate::EvaluateSettings;
use crate::cli::preprocess::PreprocessSettings;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.1.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.1.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2024-{}     mutfit developers
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
research use only.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// Mutfit, scores single-mutant fitness effects and checks them against experiments.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Removes alignment columns from a sequence table and re-labels the variants
    Preprocess(Box<PreprocessSettings>),
    /// Merges model predictions with experimental measurements and reports the rank correlation
    Evaluate(Box<EvaluateSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Converts a `-v` count into a log filter level
pub fn verbosity_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    }
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}
