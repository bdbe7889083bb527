//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Import problems come in two flavours. `ImportError` is fatal: the input
//! could not be read as any known container, and no model is produced.
//! `RecoverableError` describes a single bad line or event; its text is
//! appended to `TraceModel::import_errors` and the import carries on.

use thiserror::Error;

/// Fatal errors that abort a whole import
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("trace JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),
}

/// Per-line / per-event problems recorded in `import_errors`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecoverableError {
    #[error("line {line}: unrecognized trace line: {text}")]
    UnrecognizedLine { line: usize, text: String },

    #[error("unsupported kernel event '{name}' (further occurrences ignored)")]
    UnsupportedEvent { name: String },

    #[error("malformed {name} event: {payload}")]
    MalformedKernelEvent { name: String, payload: String },

    #[error("unknown event kind '{kind}' in payload: {payload}")]
    UnknownEventKind { kind: String, payload: String },

    #[error("malformed '{kind}' payload ({reason}): {payload}")]
    MalformedPayload {
        kind: char,
        reason: String,
        payload: String,
    },

    #[error("unmatched end on thread {tid} at {timestamp}ms")]
    UnmatchedEnd { tid: i64, timestamp: f64 },

    #[error("duplicate async start for '{name}' in process {pid} at {timestamp}ms")]
    DuplicateAsyncStart {
        pid: i64,
        name: String,
        timestamp: f64,
    },

    #[error("unmatched async finish for '{name}' in process {pid} at {timestamp}ms")]
    UnmatchedAsyncFinish {
        pid: i64,
        name: String,
        timestamp: f64,
    },

    #[error("counter '{name}' expects {expected} series but sample has {found}; sample dropped")]
    CounterCardinality {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("counter '{name}' timestamp went backwards ({previous}ms -> {timestamp}ms)")]
    CounterRegression {
        name: String,
        previous: f64,
        timestamp: f64,
    },

    #[error("trace event {index}: {reason}")]
    InvalidTraceEvent { index: usize, reason: String },

    #[error("counter '{name}' has conflicting series across sub-traces; later samples dropped")]
    CounterSeriesConflict { name: String },

    #[error("no free synthetic tid for colliding thread {pid}:{tid}; threads merged")]
    SyntheticTidExhausted { pid: i64, tid: i64 },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_end_message() {
        let err = RecoverableError::UnmatchedEnd {
            tid: 4831,
            timestamp: 12.5,
        };
        assert_eq!(err.to_string(), "unmatched end on thread 4831 at 12.5ms");
    }

    #[test]
    fn test_import_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{garbage").unwrap_err();
        let err: ImportError = json_err.into();
        assert!(err.to_string().starts_with("trace JSON could not be parsed"));
    }
}
