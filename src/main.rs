use log::{error, info, warn};
use std::time::Instant;

use mutfit::cli::core::{verbosity_filter, Commands, get_cli};
use mutfit::cli::evaluate::{EvaluateSettings, check_evaluate_settings};
use mutfit::cli::preprocess::{PreprocessSettings, check_preprocess_settings};
use mutfit::correlation::spearman_merged;
use mutfit::parsing::deleted_columns::load_deleted_columns;
use mutfit::parsing::prediction_tables::{load_experimental, load_predictions};
use mutfit::parsing::sequence_table::load_sequence_table;
use mutfit::prediction_merger::merge_predictions;
use mutfit::record_reconciler::reconcile;
use mutfit::util::json_io::save_json;
use mutfit::writers::csv_table::save_merged;
use mutfit::writers::reconciled_table::save_reconciled_table;

fn init_logging(verbosity: u8) {
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(verbosity_filter(verbosity))
        .init();
}

fn create_folder(folder: &std::path::Path, label: &str) {
    info!("Creating {label} folder at {folder:?}...");
    if let Err(e) = std::fs::create_dir_all(folder) {
        error!("Error while creating {label} folder: {e}");
        std::process::exit(exitcode::IOERR);
    }
}

fn run_preprocess(settings: PreprocessSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);

    let settings = match check_preprocess_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    create_folder(&settings.output_folder, "output");

    info!("Loading deleted columns...");
    let deleted_columns = match load_deleted_columns(&settings.deleted_columns) {
        Ok(dc) => dc,
        Err(e) => {
            error!("Error while loading deleted columns: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Loaded {} deleted columns.", deleted_columns.len());

    info!("Loading sequence table...");
    let table = match load_sequence_table(&settings.sequence_table) {
        Ok(t) => t,
        Err(e) => {
            error!("Error while loading sequence table: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Loaded {} variant sequences, reference length {}.", table.len(), table.reference().len());

    info!("Reconciling variants...");
    let (table, stats) = match reconcile(table, &deleted_columns, settings.mismatch_policy) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while reconciling variants: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    if stats.original == 0 {
        warn!("No variant sequences were provided.");
    }
    info!("{stats}");

    let out_fn = settings.output_filename();
    info!("Saving reconciled table to {out_fn:?}...");
    if let Err(e) = save_reconciled_table(&table, &out_fn) {
        error!("Error while saving reconciled table: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Preprocessing completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_evaluate(settings: EvaluateSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);

    let settings = match check_evaluate_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    create_folder(&settings.output_folder, "output");

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        create_folder(debug_folder, "debug");

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    info!("Loading predictions...");
    let predictions = match load_predictions(&settings.predictions) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while loading predictions: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Loaded {} predictions.", predictions.len());

    info!("Loading experimental measurements...");
    let experimental = match load_experimental(&settings.experimental) {
        Ok(e) => e,
        Err(e) => {
            error!("Error while loading experimental measurements: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Loaded {} experimental measurements.", experimental.len());

    let merged = match merge_predictions(&predictions, &experimental, settings.start_index) {
        Ok(m) => m,
        Err(e) => {
            error!("Error while merging predictions: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    let merged_fn = settings.merged_filename();
    info!("Saving merged table to {merged_fn:?}...");
    if let Err(e) = save_merged(&merged, &merged_fn) {
        error!("Error while saving merged table: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let report = match spearman_merged(&merged) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while computing correlation: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!("Spearman's correlation: {}", report.coefficient);
    match report.p_value {
        Some(p) => info!("\tp-value: {p:e}"),
        None => info!("\tp-value: undefined")
    };
    info!("\tVariants: {}", report.n);

    let report_fn = settings.report_filename();
    info!("Saving correlation report to {report_fn:?}...");
    if let Err(e) = save_json(&report, &report_fn) {
        error!("Error while saving correlation report: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Evaluation completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Preprocess(settings) => {
            run_preprocess(*settings);
        },
        Commands::Evaluate(settings) => {
            run_evaluate(*settings);
        }
    }

    info!("Process finished successfully.");
}
