use crate::utils::config::ImportOptions;
use std::path::PathBuf;

/// Arguments for the import command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ImportArgs {
    /// Trace files, imported in order as one model
    pub inputs: Vec<PathBuf>,

    /// Output path for the JSON model (None = do not write)
    pub output_json: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Shift all timestamps so the model starts at zero
    pub shift_world_to_zero: bool,

    /// Fail when any import error was recorded
    pub strict: bool,
}

impl ImportArgs {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::new().with_shift_world_to_zero(self.shift_world_to_zero)
    }
}

impl Default for ImportArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_json: Some(PathBuf::from("model.json")),
            print_summary: false,
            shift_world_to_zero: false,
            strict: false,
        }
    }
}
