//! Stitches async start/finish markers into `AsyncSlice`s.
//!
//! Starts and finishes are matched on (pid, name) and may come from different
//! threads. At most one start per key is pending at a time.

use crate::model::{Args, AsyncSlice, ThreadRef, TraceModel};
use crate::utils::error::RecoverableError;
use std::collections::HashMap;

/// Matching key for async markers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsyncKey {
    pub pid: i64,
    pub name: String,
}

/// One async start or finish observation
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncEvent {
    pub thread: ThreadRef,
    pub timestamp: f64,
    pub name: String,
    pub id: Option<String>,
    pub category: String,
    pub args: Args,
}

impl AsyncEvent {
    pub fn key(&self) -> AsyncKey {
        AsyncKey {
            pid: self.thread.pid,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AsyncSliceStitcher {
    pending: HashMap<AsyncKey, AsyncEvent>,
}

impl AsyncSliceStitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending start
    ///
    /// # Errors
    /// * `RecoverableError::DuplicateAsyncStart` - a start for the same key was
    ///   already pending; it has been replaced by this one
    pub fn start(&mut self, event: AsyncEvent) -> Result<(), RecoverableError> {
        let key = event.key();
        let timestamp = event.timestamp;

        match self.pending.insert(key.clone(), event) {
            Some(_) => Err(RecoverableError::DuplicateAsyncStart {
                pid: key.pid,
                name: key.name,
                timestamp,
            }),
            None => Ok(()),
        }
    }

    /// Complete the pending start matching `event`
    ///
    /// The finished slice is attached to the thread the start was seen on.
    ///
    /// # Errors
    /// * `RecoverableError::UnmatchedAsyncFinish` - no start is pending for the key
    pub fn finish(
        &mut self,
        model: &mut TraceModel,
        event: AsyncEvent,
    ) -> Result<(), RecoverableError> {
        let key = event.key();
        let Some(start) = self.pending.remove(&key) else {
            return Err(RecoverableError::UnmatchedAsyncFinish {
                pid: key.pid,
                name: key.name,
                timestamp: event.timestamp,
            });
        };

        let mut args = start.args;
        args.extend(event.args);
        let category = if start.category.is_empty() {
            event.category
        } else {
            start.category
        };

        model
            .get_or_create_thread(start.thread)
            .async_slices
            .push(AsyncSlice {
                category,
                name: start.name,
                id: start.id.or(event.id),
                start: start.timestamp,
                start_thread: start.thread,
                end: event.timestamp.max(start.timestamp),
                end_thread: event.thread,
                args,
            });
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tid: i64, timestamp: f64, name: &str) -> AsyncEvent {
        AsyncEvent {
            thread: ThreadRef::new(10, tid),
            timestamp,
            name: name.to_string(),
            id: None,
            category: String::new(),
            args: Args::new(),
        }
    }

    #[test]
    fn test_cross_thread_span() {
        let mut model = TraceModel::new();
        let mut stitcher = AsyncSliceStitcher::new();

        stitcher.start(event(1, 1.0, "load")).unwrap();
        stitcher.finish(&mut model, event(2, 4.0, "load")).unwrap();

        let slice = &model.thread(10, 1).unwrap().async_slices[0];
        assert_eq!(slice.start, 1.0);
        assert_eq!(slice.end, 4.0);
        assert_eq!(slice.duration(), 3.0);
        assert_eq!(slice.end_thread, ThreadRef::new(10, 2));
        assert!(slice.is_cross_thread());
        assert_eq!(stitcher.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_start_overwrites() {
        let mut model = TraceModel::new();
        let mut stitcher = AsyncSliceStitcher::new();

        stitcher.start(event(1, 1.0, "load")).unwrap();
        let err = stitcher.start(event(1, 2.0, "load")).unwrap_err();
        assert!(err.to_string().contains("duplicate async start"));

        stitcher.finish(&mut model, event(1, 5.0, "load")).unwrap();
        assert_eq!(model.thread(10, 1).unwrap().async_slices[0].start, 2.0);
    }

    #[test]
    fn test_unmatched_finish() {
        let mut model = TraceModel::new();
        let mut stitcher = AsyncSliceStitcher::new();

        let err = stitcher
            .finish(&mut model, event(1, 1.0, "load"))
            .unwrap_err();
        assert!(err.to_string().contains("unmatched async finish"));
        assert!(model.processes.is_empty());
    }

    #[test]
    fn test_finish_args_override_start_args() {
        let mut model = TraceModel::new();
        let mut stitcher = AsyncSliceStitcher::new();

        let mut start = event(1, 1.0, "load");
        start.args.insert("k".to_string(), "start".to_string());
        start.args.insert("only_start".to_string(), "x".to_string());
        let mut finish = event(1, 2.0, "load");
        finish.args.insert("k".to_string(), "finish".to_string());

        stitcher.start(start).unwrap();
        stitcher.finish(&mut model, finish).unwrap();

        let args = &model.thread(10, 1).unwrap().async_slices[0].args;
        assert_eq!(args["k"], "finish");
        assert_eq!(args["only_start"], "x");
    }
}
