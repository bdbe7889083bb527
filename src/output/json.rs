//! JSON model output writer.
//!
//! Writes finished models to disk wrapped in a small versioned envelope, and
//! reads them back for validation.

use crate::model::TraceModel;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// On-disk form of a model
///
/// **Public** - returned by `read_model`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Envelope schema version
    pub version: String,

    /// RFC 3339 time the document was written
    pub generated_at: String,

    pub model: TraceModel,
}

impl ModelDocument {
    pub fn new(model: TraceModel) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            model,
        }
    }
}

/// Borrowing twin of `ModelDocument` so writing never clones the model
#[derive(Serialize)]
struct ModelDocumentRef<'a> {
    version: &'a str,
    generated_at: String,
    model: &'a TraceModel,
}

/// Write a model to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `model` - finished model to write
/// * `output_path` - path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - path cannot be created or is invalid
pub fn write_model(model: &TraceModel, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing model to: {}", output_path.display());

    super::validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    let document = ModelDocumentRef {
        version: SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        model,
    };
    serde_json::to_writer_pretty(writer, &document).map_err(OutputError::SerializationFailed)?;

    info!(
        "Model written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Read a model document from a JSON file
///
/// **Public** - used by `validate` and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - file read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_model(input_path: impl AsRef<Path>) -> Result<ModelDocument, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading model from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let document: ModelDocument =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    if document.version != SCHEMA_VERSION {
        warn!(
            "Model schema version {} differs from current version {}",
            document.version, SCHEMA_VERSION
        );
    }

    debug!(
        "Model loaded: version {}, {} processes",
        document.version,
        document.model.processes.len()
    );

    Ok(document)
}

/// Serialize a bare model (no envelope)
///
/// **Public** - useful for tests and piping
pub fn model_to_string(model: &TraceModel) -> Result<String, OutputError> {
    serde_json::to_string_pretty(model).map_err(OutputError::SerializationFailed)
}

/// Parse a bare model produced by `model_to_string`
pub fn model_from_str(json: &str) -> Result<TraceModel, OutputError> {
    serde_json::from_str(json).map_err(OutputError::SerializationFailed)
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Slice, ThreadRef};
    use tempfile::NamedTempFile;

    fn create_test_model() -> TraceModel {
        let mut model = TraceModel::new();
        model
            .get_or_create_thread(ThreadRef::new(1, 2))
            .push_slice(Slice::new("cat", "work", 1.0, 2.0, Default::default()));
        model.update_bounds();
        model.update_categories();
        model
    }

    #[test]
    fn test_write_and_read_model() {
        let model = create_test_model();
        let temp_file = NamedTempFile::new().unwrap();

        write_model(&model, temp_file.path()).unwrap();
        let loaded = read_model(temp_file.path()).unwrap();

        assert_eq!(loaded.version, SCHEMA_VERSION);
        assert_eq!(loaded.model, model);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/model.json");

        write_model(&create_test_model(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_model_string_round_trip() {
        let model = create_test_model();
        let json = model_to_string(&model).unwrap();
        assert_eq!(model_from_str(&json).unwrap(), model);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            read_model("/definitely/not/here.json"),
            Err(OutputError::WriteFailed(_))
        ));
    }
}
