//! Systrace Studio
//!
//! Builds an in-memory trace model (processes, threads, CPUs, slices,
//! async slices and counters) from systrace text, JSON trace-event arrays,
//! and combined `{traceEvents, systemTraceEvents}` objects.
//!
//! This crate provides the core implementation for the
//! `systrace-studio` CLI tool.
//!
//! ## Getting Started
//!
//! ```ignore
//! use systrace_studio::TraceModel;
//!
//! let model = TraceModel::from_trace(&std::fs::read_to_string("trace.txt")?)?;
//! for thread in model.get_all_threads() {
//!     println!("{}: {} slices", thread.user_friendly_name(), thread.slices.len());
//! }
//! ```

pub mod aggregator;
pub mod commands;
pub mod model;
pub mod output;
pub mod parser;
pub mod utils;

pub use model::TraceModel;
pub use utils::{ImportError, ImportOptions, RecoverableError};
