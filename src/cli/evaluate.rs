use anyhow::bail;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct EvaluateSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    mutfit_version: String,

    /// Raw model predictions with Variant and delta_elbo columns
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "predictions")]
    #[clap(value_name = "CSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub predictions: PathBuf,

    /// Experimental measurements with Variant and scaled_effect1 columns, e.g. the preprocess output
    #[clap(required = true)]
    #[clap(short = 'e')]
    #[clap(long = "experimental")]
    #[clap(value_name = "CSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub experimental: PathBuf,

    /// Output directory for the merged table and correlation report
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Prefix for the output files [default: experimental file stem]
    #[clap(long = "label")]
    #[clap(value_name = "LABEL")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "", hide_default_value = true)]
    pub label: String,

    /// Experimental position of the first alignment column
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "start-index")]
    #[clap(value_name = "POS")]
    #[clap(allow_negative_numbers = true)]
    #[clap(help_heading = Some("Merge parameters"))]
    pub start_index: i64,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl EvaluateSettings {
    /// Path of the merged table
    pub fn merged_filename(&self) -> PathBuf {
        self.output_folder.join(format!("{}.csv", self.label))
    }

    /// Path of the correlation report
    pub fn report_filename(&self) -> PathBuf {
        self.output_folder.join(format!("{}.correlation.json", self.label))
    }
}

pub fn check_evaluate_settings(mut settings: EvaluateSettings) -> anyhow::Result<EvaluateSettings> {
    // hard code the version in
    settings.mutfit_version = FULL_VERSION.clone();
    info!("Mutfit version: {:?}", &settings.mutfit_version);
    info!("Sub-command: evaluate");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.predictions, "Predictions")?;
    check_required_filename(&settings.experimental, "Experimental table")?;

    info!("\tPredictions: {:?}", &settings.predictions);
    info!("\tExperimental: {:?}", &settings.experimental);

    info!("Merge parameters:");
    info!("\tStart index: {}", settings.start_index);

    // outputs
    if settings.label.is_empty() {
        settings.label = match settings.experimental.file_name().and_then(|f| f.to_str()) {
            // strip all extensions, e.g. "data.csv.gz" -> "data"
            Some(name) => name.split('.').next().unwrap_or_default().to_string(),
            None => String::new()
        };
    }
    if settings.label.is_empty() {
        bail!("--label could not be derived from the experimental file name, please provide one");
    }
    info!("Outputs:");
    info!("\tLabel: {:?}", &settings.label);
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_experimental() {
        let settings = EvaluateSettings {
            predictions: PathBuf::from("Cargo.toml"),
            experimental: PathBuf::from("Cargo.toml"),
            output_folder: PathBuf::from("out"),
            start_index: 24,
            ..Default::default()
        };
        let settings = check_evaluate_settings(settings).unwrap();
        assert_eq!(settings.label, "Cargo");
        assert_eq!(settings.merged_filename(), PathBuf::from("out/Cargo.csv"));
        assert_eq!(settings.report_filename(), PathBuf::from("out/Cargo.correlation.json"));
    }

    #[test]
    fn test_explicit_label() {
        let settings = EvaluateSettings {
            predictions: PathBuf::from("Cargo.toml"),
            experimental: PathBuf::from("Cargo.toml"),
            output_folder: PathBuf::from("out"),
            label: "BLAT_ECOLX".to_string(),
            ..Default::default()
        };
        let settings = check_evaluate_settings(settings).unwrap();
        assert_eq!(settings.merged_filename(), PathBuf::from("out/BLAT_ECOLX.csv"));
    }

    #[test]
    fn test_missing_predictions() {
        let settings = EvaluateSettings {
            predictions: PathBuf::from("does/not/exist.csv"),
            experimental: PathBuf::from("Cargo.toml"),
            ..Default::default()
        };
        assert!(check_evaluate_settings(settings).is_err());
    }
}
