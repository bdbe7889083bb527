//! Per-thread stacks of open slices.
//!
//! Begin pushes, End pops. A popped slice becomes a completed `Slice` on its
//! thread, so slices appear in completion order and every slice closed while
//! others are open nests inside them. The stacks are import-time state only;
//! anything still open when the stacks are dropped is discarded.

use crate::model::{Args, Slice, ThreadRef, TraceModel};
use crate::utils::error::RecoverableError;
use std::collections::HashMap;

/// A slice that has begun but not ended
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSlice {
    pub category: String,
    pub title: String,
    pub start: f64,
    pub args: Args,
}

/// Extra data carried by an End event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceClose {
    /// Used only when the begin had no category
    pub category: Option<String>,
    /// Merged over the begin args
    pub args: Args,
}

#[derive(Debug, Default)]
pub struct SliceStackManager {
    stacks: HashMap<ThreadRef, Vec<OpenSlice>>,
}

impl SliceStackManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, thread: ThreadRef, slice: OpenSlice) {
        self.stacks.entry(thread).or_default().push(slice);
    }

    /// Close the innermost open slice on `thread` at `timestamp`
    ///
    /// # Errors
    /// * `RecoverableError::UnmatchedEnd` - nothing is open on the thread; no
    ///   slice is touched
    pub fn end(
        &mut self,
        model: &mut TraceModel,
        thread: ThreadRef,
        timestamp: f64,
        close: SliceClose,
    ) -> Result<(), RecoverableError> {
        let Some(open) = self.stacks.get_mut(&thread).and_then(Vec::pop) else {
            return Err(RecoverableError::UnmatchedEnd {
                tid: thread.tid,
                timestamp,
            });
        };

        let category = if open.category.is_empty() {
            close.category.unwrap_or_default()
        } else {
            open.category
        };
        let mut args = open.args;
        args.extend(close.args);

        model.get_or_create_thread(thread).push_slice(Slice::new(
            category,
            open.title,
            open.start,
            timestamp - open.start,
            args,
        ));
        Ok(())
    }

    /// Current nesting depth on `thread`
    pub fn depth(&self, thread: ThreadRef) -> usize {
        self.stacks.get(&thread).map_or(0, Vec::len)
    }

    /// Total open slices across all threads
    pub fn open_slice_count(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }
}
