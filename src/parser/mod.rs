//! Trace parsing.
//!
//! This module handles:
//! - Matching systrace header lines
//! - Decoding `tracing_mark_write` payloads
//! - Building slices, async slices and counters from decoded events
//! - Importing JSON trace-event arrays

pub mod async_slices;
pub mod context;
pub mod counters;
pub mod event;
pub mod kernel;
pub mod line;
pub mod slice_stack;
pub mod systrace;
pub mod trace_event;

// Re-export main types and functions
pub use async_slices::{AsyncEvent, AsyncKey, AsyncSliceStitcher};
pub use context::ImportContext;
pub use event::{parse_marker, EventKind, MarkerEvent};
pub use line::{match_line, EventSource, TraceLine};
pub use slice_stack::{OpenSlice, SliceClose, SliceStackManager};
pub use systrace::import_systrace;
pub use trace_event::{import_trace_events, TraceEvent};
