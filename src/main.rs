//! Systrace Studio CLI
//!
//! Builds a trace model from systrace text and JSON trace-event files
//! and writes it out as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use systrace_studio::commands::{
    display_schema, display_version, execute_import, validate_args, validate_model_file,
    ImportArgs,
};

/// Systrace Studio - trace model construction
#[derive(Parser, Debug)]
#[command(name = "systrace-studio")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Import one or more trace files into a single model
    Import {
        /// Trace files (systrace text, trace-event JSON, or combined JSON)
        #[arg(short, long = "input", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output path for the JSON model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Skip writing the model file
        #[arg(long)]
        no_output: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Shift all timestamps so the model starts at zero
        #[arg(long)]
        shift_to_zero: bool,

        /// Exit with an error if any import error was recorded
        #[arg(long, env = "SYSTRACE_STUDIO_STRICT")]
        strict: bool,
    },

    /// Validate a model JSON file
    Validate {
        /// Path to model JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Import {
            inputs,
            output,
            no_output,
            summary,
            shift_to_zero,
            strict,
        } => {
            let args = ImportArgs {
                inputs,
                output_json: (!no_output).then_some(output),
                print_summary: summary,
                shift_world_to_zero: shift_to_zero,
                strict,
            };

            // Validate args first
            validate_args(&args)?;

            execute_import(args)?;
        }

        Commands::Validate { file } => {
            validate_model_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
