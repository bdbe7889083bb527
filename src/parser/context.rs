//! Working state for importing one sub-trace.
//!
//! Holds the partial model being built together with the transient import
//! structures (open slice stacks, pending async starts). Only the model
//! survives `finish`.

use super::async_slices::{AsyncEvent, AsyncSliceStitcher};
use super::counters::append_sample;
use super::event::CounterValue;
use super::slice_stack::{OpenSlice, SliceClose, SliceStackManager};
use crate::model::{CounterOwner, Slice, ThreadRef, TraceModel};
use crate::utils::error::RecoverableError;
use log::debug;

#[derive(Debug, Default)]
pub struct ImportContext {
    pub model: TraceModel,
    pub slices: SliceStackManager,
    pub async_slices: AsyncSliceStitcher,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable problem and keep going
    pub fn report(&mut self, error: RecoverableError) {
        debug!("Import error: {}", error);
        self.model.import_errors.push(error.to_string());
    }

    /// Unwrap `result`, reporting the error if there is one
    pub fn record<T>(&mut self, result: Result<T, RecoverableError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error);
                None
            }
        }
    }

    pub fn begin_slice(&mut self, thread: ThreadRef, slice: OpenSlice) {
        self.model.get_or_create_thread(thread);
        self.slices.begin(thread, slice);
    }

    pub fn end_slice(&mut self, thread: ThreadRef, timestamp: f64, close: SliceClose) {
        let result = self.slices.end(&mut self.model, thread, timestamp, close);
        self.record(result);
    }

    /// A slice whose duration is known up front; it bypasses the stack
    pub fn complete_slice(&mut self, thread: ThreadRef, slice: Slice) {
        self.model.get_or_create_thread(thread).push_slice(slice);
    }

    pub fn start_async(&mut self, event: AsyncEvent) {
        self.model.get_or_create_thread(event.thread);
        let result = self.async_slices.start(event);
        self.record(result);
    }

    pub fn finish_async(&mut self, event: AsyncEvent) {
        self.model.get_or_create_thread(event.thread);
        let result = self.async_slices.finish(&mut self.model, event);
        self.record(result);
    }

    pub fn add_counter_sample(
        &mut self,
        owner: CounterOwner,
        category: &str,
        name: &str,
        timestamp: f64,
        values: &[CounterValue<'_>],
    ) {
        let counter = self.model.get_or_create_counter(owner, category, name);
        let result = append_sample(counter, timestamp, values);
        self.record(result);
    }

    /// Drop transient state and hand back the partial model.
    ///
    /// Slices still open and async starts still pending belong to a truncated
    /// trace and are discarded without diagnostics.
    pub fn finish(self) -> TraceModel {
        let open = self.slices.open_slice_count();
        let pending = self.async_slices.pending_count();
        if open > 0 || pending > 0 {
            debug!(
                "Discarding {} open slices and {} pending async starts at end of trace",
                open, pending
            );
        }
        self.model
    }
}
