//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod import;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use import::{execute_import, validate_args};
pub use models::ImportArgs;
pub use utils::{display_schema, display_version, render_summary, validate_model_file};
