//! Import command implementation.
//!
//! The import command:
//! 1. Reads every trace file
//! 2. Builds one model from all of them
//! 3. Writes the model and optionally prints a summary

use super::models::ImportArgs;
use super::utils::render_summary;
use crate::model::TraceModel;
use crate::output::{validate_output_path, write_model};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Import errors echoed to the log before the rest are summarized
const LOGGED_IMPORT_ERRORS: usize = 10;

/// Execute the import command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Import command arguments
///
/// # Returns
/// The finished model
///
/// # Errors
/// * Unreadable trace files
/// * Malformed JSON containers
/// * File write errors
/// * Any import error when `strict` is set
pub fn execute_import(args: ImportArgs) -> Result<TraceModel> {
    let start_time = Instant::now();

    // Step 1: Read inputs
    info!("Step 1/3: Reading {} trace file(s)...", args.inputs.len());
    let contents = args
        .inputs
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read trace file {}", path.display()))
        })
        .collect::<Result<Vec<String>>>()?;

    for (path, text) in args.inputs.iter().zip(&contents) {
        debug!("{}: {} bytes", path.display(), text.len());
    }

    // Step 2: Build the model
    info!("Step 2/3: Importing traces...");
    let traces: Vec<&str> = contents.iter().map(String::as_str).collect();
    let mut model = TraceModel::new();
    model
        .import_traces_with_options(&traces, args.import_options())
        .context("Failed to import traces")?;

    if model.has_import_errors() {
        warn!("{} import error(s) recorded", model.import_errors.len());
        for error in model.import_errors.iter().take(LOGGED_IMPORT_ERRORS) {
            warn!("  {}", error);
        }
        if model.import_errors.len() > LOGGED_IMPORT_ERRORS {
            warn!(
                "  ... and {} more",
                model.import_errors.len() - LOGGED_IMPORT_ERRORS
            );
        }
    }

    // Step 3: Write outputs
    match &args.output_json {
        Some(path) => {
            info!("Step 3/3: Writing output files...");
            write_model(&model, path).context("Failed to write model JSON")?;
            info!("✓ Model written to: {}", path.display());
        }
        None => info!("Step 3/3: Skipping model output (not requested)"),
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("MODEL SUMMARY");
        println!("{}", "=".repeat(80));
        println!("{}", render_summary(&model));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Import completed in {:.2}s", elapsed.as_secs_f64());

    if args.strict && model.has_import_errors() {
        anyhow::bail!(
            "{} import error(s) recorded (strict mode)",
            model.import_errors.len()
        );
    }

    Ok(model)
}

/// Validate import arguments
///
/// **Public** - can be called before execute_import for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &ImportArgs) -> Result<()> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one trace file is required");
    }

    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Trace file not found: {}", input.display());
        }
        if !input.is_file() {
            anyhow::bail!("Trace path is not a file: {}", input.display());
        }
    }

    if let Some(output) = &args.output_json {
        validate_output_path(output).context("Invalid model output path")?;
    }

    Ok(())
}
