//! In-memory trace model.
//!
//! This module defines:
//! - `TraceModel`, the root owning processes and CPUs
//! - `Process` / `Thread` / `Cpu` registries
//! - `Slice` and `AsyncSlice` timed intervals
//! - `Counter` multi-series samples

pub mod counter;
pub mod process;
pub mod slice;
pub mod trace_model;

// Re-export main types
pub use counter::{Counter, CounterKey, Counters};
pub use process::{Cpu, Process, Thread};
pub use slice::{Args, AsyncSlice, Slice, ThreadRef, ThreadSlice};
pub use trace_model::{Bounds, CounterOwner, TraceModel};
