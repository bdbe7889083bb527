//! Timed intervals: nested thread slices and cross-thread async slices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slice arguments. Ordered so serialization is stable.
pub type Args = BTreeMap<String, String>;

/// Identifies a thread by (process id, thread id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThreadRef {
    pub pid: i64,
    pub tid: i64,
}

impl ThreadRef {
    pub fn new(pid: i64, tid: i64) -> Self {
        Self { pid, tid }
    }
}

/// A completed, named interval of execution.
///
/// Thread slices live in `Thread::slices`; CPU slices in `Cpu::slices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Category, empty when the event carried none
    #[serde(default)]
    pub category: String,

    pub title: String,

    /// Start time in milliseconds
    pub start: f64,

    /// Duration in milliseconds, never negative
    pub duration: f64,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: Args,
}

/// Slices recorded on a thread
pub type ThreadSlice = Slice;

impl Slice {
    pub fn new(
        category: impl Into<String>,
        title: impl Into<String>,
        start: f64,
        duration: f64,
        args: Args,
    ) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            start,
            duration: duration.max(0.0),
            args,
        }
    }

    /// End time (start + duration)
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// True when `other` lies entirely within this slice
    pub fn contains(&self, other: &Slice) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }
}

/// An interval whose start and finish may be observed on different threads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncSlice {
    #[serde(default)]
    pub category: String,

    pub name: String,

    /// Cookie / id carried by the start or finish event, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub start: f64,
    pub start_thread: ThreadRef,

    pub end: f64,
    pub end_thread: ThreadRef,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: Args,
}

impl AsyncSlice {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the span crossed a thread boundary
    pub fn is_cross_thread(&self) -> bool {
        self.start_thread != self.end_thread
    }
}
