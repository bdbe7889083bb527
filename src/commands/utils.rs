use crate::model::TraceModel;
use crate::output::read_model;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a model JSON file
pub fn validate_model_file(file_path: &Path) -> Result<()> {
    println!("Validating model: {}", file_path.display());

    let document = read_model(file_path)
        .with_context(|| format!("Failed to read model {}", file_path.display()))?;

    println!("✓ Valid model JSON");
    println!("  Version: {}", document.version);
    println!("  Generated: {}", document.generated_at);
    println!("{}", render_summary(&document.model));

    Ok(())
}

/// Human readable overview of a model
pub fn render_summary(model: &TraceModel) -> String {
    let threads = model.get_all_threads();
    let slices: usize = threads.iter().map(|t| t.slices.len()).sum();
    let async_slices: usize = threads.iter().map(|t| t.async_slices.len()).sum();
    let cpu_slices: usize = model.cpus.values().map(|c| c.slices.len()).sum();
    let remapped = threads.iter().filter(|t| t.remapped_from.is_some()).count();

    let bounds = match &model.bounds {
        Some(bounds) => format!(
            "{:.3}ms .. {:.3}ms ({:.3}ms)",
            bounds.min,
            bounds.max,
            bounds.range()
        ),
        None => "(empty)".to_string(),
    };

    format!(
        "  Processes: {}\n  Threads: {} ({} remapped)\n  CPUs: {}\n  Slices: {}\n  \
         Async Slices: {}\n  CPU Slices: {}\n  Counters: {}\n  Categories: {}\n  \
         Bounds: {}\n  Import Errors: {}",
        model.processes.len(),
        threads.len(),
        remapped,
        model.cpus.len(),
        slices,
        async_slices,
        cpu_slices,
        model.get_all_counters().len(),
        model.categories.join(", "),
        bounds,
        model.import_errors.len()
    )
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Systrace Studio Model Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string       - ISO 8601 timestamp");
        println!("  model: object");
        println!("    processes: object        - Processes keyed by pid");
        println!("      name: string?          - Process name");
        println!("      threads: object        - Threads keyed by tid");
        println!("        name: string?        - Thread name");
        println!("        slices: array        - {{category, title, start, duration, args}}");
        println!("        async_slices: array  - {{category, name, id?, start, start_thread, end, end_thread, args}}");
        println!("        remapped_from: number? - Original tid of a remapped thread");
        println!("      counters: array        - {{category, name, series_names, series_colors, timestamps, samples}}");
        println!("    cpus: object             - CPUs keyed by id, with slices and counters");
        println!("    bounds: object?          - {{min, max}} in milliseconds");
        println!("    categories: array        - Sorted slice categories");
        println!("    import_errors: array     - Recoverable import diagnostics");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Systrace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Model Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Builds trace models from systrace text and JSON trace events.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_empty_model() {
        let summary = render_summary(&TraceModel::new());
        assert!(summary.contains("Processes: 0"));
        assert!(summary.contains("Bounds: (empty)"));
        assert!(summary.ends_with("Import Errors: 0"));
    }
}
