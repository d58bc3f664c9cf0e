use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::column_filter::MismatchPolicy;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct PreprocessSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    mutfit_version: String,

    /// Sequence table with Variant, mut_type, sequence, and scaled_effect1 columns
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "sequence-table")]
    #[clap(value_name = "CSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub sequence_table: PathBuf,

    /// File of 0-based alignment columns to remove, one per line
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "deleted-columns")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub deleted_columns: PathBuf,

    /// Output directory; the reconciled table keeps the input file name
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// How to handle a mutant that differs from the reference at more than one remaining column
    #[clap(value_enum)]
    #[clap(long = "mismatch-policy")]
    #[clap(help_heading = Some("Filter parameters"))]
    #[clap(default_value = "last_wins")]
    pub mismatch_policy: MismatchPolicy,

    /// Enable verbose output; -v also reports every dropped variant.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl PreprocessSettings {
    /// Path of the reconciled table inside the output folder
    pub fn output_filename(&self) -> PathBuf {
        let basename = self.sequence_table.file_name().unwrap_or_default();
        self.output_folder.join(basename)
    }
}

pub fn check_preprocess_settings(mut settings: PreprocessSettings) -> anyhow::Result<PreprocessSettings> {
    // hard code the version in
    settings.mutfit_version = FULL_VERSION.clone();
    info!("Mutfit version: {:?}", &settings.mutfit_version);
    info!("Sub-command: preprocess");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.sequence_table, "Sequence table")?;
    check_required_filename(&settings.deleted_columns, "Deleted columns file")?;

    // dump stuff to the logger
    info!("\tSequence table: {:?}", &settings.sequence_table);
    info!("\tDeleted columns: {:?}", &settings.deleted_columns);

    info!("Filter parameters:");
    info!("\tMismatch policy: {}", settings.mismatch_policy);

    // outputs
    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);
    info!("\tReconciled table: {:?}", settings.output_filename());

    Ok(settings)
}
