//! Output writers for finished models.
//!
//! This module handles writing models to disk:
//! - JSON model documents (pretty printed, versioned)
//! - Bare model JSON for in-memory use

pub mod json;

// Re-export main functions
pub use json::{model_from_str, model_to_string, read_model, write_model, ModelDocument};

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

/// Validate that an output path is writable
///
/// **Public** - shared by writers and argument validation
pub fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Parent directory will be created: {}", parent.display());
        }
    }

    Ok(())
}
