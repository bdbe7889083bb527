//! Aggregation of sub-traces into one model.
//!
//! This module turns raw inputs into a finished `TraceModel`:
//! - Splitting each input into sub-traces (container detection)
//! - Importing every sub-trace into its own partial model
//! - Merging partial models, remapping colliding threads
//! - Finalizing bounds and categories

pub mod merge;
pub mod subtrace;

// Re-export main types and functions
pub use merge::merge_partial;
pub use subtrace::{split_subtraces, SubTrace};

use crate::model::TraceModel;
use crate::utils::config::ImportOptions;
use crate::utils::error::ImportError;
use log::{debug, info};

/// Import a list of trace inputs into one model
///
/// **Public** - main entry point for model construction
///
/// # Arguments
/// * `traces` - raw inputs; each may be systrace text, a trace-event array,
///   or a combined object
/// * `options` - finalization options
///
/// # Returns
/// The finished model. Recoverable problems are listed in
/// `TraceModel::import_errors`.
///
/// # Errors
/// * `ImportError` - an input is malformed JSON or JSON of an unknown shape.
///   Every input is split before anything is imported, so no partial model
///   is produced.
pub fn import_traces(traces: &[&str], options: ImportOptions) -> Result<TraceModel, ImportError> {
    let mut subtraces = Vec::new();
    for (index, trace) in traces.iter().enumerate() {
        let pieces = split_subtraces(trace)?;
        debug!("Input {} holds {} sub-trace(s)", index, pieces.len());
        subtraces.extend(pieces);
    }

    let mut model = TraceModel::new();
    for (index, subtrace) in subtraces.iter().enumerate() {
        debug!("Importing sub-trace {} ({})", index, subtrace.kind());
        merge_partial(&mut model, subtrace.import(), index);
    }

    model.finalize(options);

    info!(
        "Imported {} sub-trace(s): {} processes, {} cpus, {} import errors",
        subtraces.len(),
        model.processes.len(),
        model.cpus.len(),
        model.import_errors.len()
    );

    Ok(model)
}
