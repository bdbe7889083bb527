//! Systrace text importer.
//!
//! Walks the text line by line, matches each header, and routes the payload:
//! marker writes go through the event dispatcher into the slice, async and
//! counter builders; `sched_switch` / `cpu_frequency` feed CPU data.
//! Nothing here is fatal: every bad line becomes one import error.

use super::async_slices::AsyncEvent;
use super::context::ImportContext;
use super::event::{parse_marker, MarkerEvent};
use super::kernel::CpuScheduleTracker;
use super::line::{match_line, EventSource, TraceLine};
use super::slice_stack::{OpenSlice, SliceClose};
use crate::model::{CounterOwner, Slice, ThreadRef, TraceModel};
use crate::utils::config::{CPU_FREQUENCY_EVENT_NAME, SCHED_SWITCH_EVENT_NAME};
use crate::utils::error::RecoverableError;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Import one systrace text blob into a fresh partial model
///
/// **Public** - used by the sub-trace merger
pub fn import_systrace(text: &str) -> TraceModel {
    SystraceImporter::new().import(text)
}

struct SystraceImporter {
    ctx: ImportContext,
    cpus: CpuScheduleTracker,
    /// pid for every tid seen with a pid-bearing payload or TGID column
    tid_to_pid: HashMap<i64, i64>,
    /// Kernel events already reported as unsupported
    unsupported: HashSet<String>,
}

impl SystraceImporter {
    fn new() -> Self {
        Self {
            ctx: ImportContext::new(),
            cpus: CpuScheduleTracker::new(),
            tid_to_pid: HashMap::new(),
            unsupported: HashSet::new(),
        }
    }

    fn import(mut self, text: &str) -> TraceModel {
        let mut matched = 0usize;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end();
            let content = line.trim_start();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            match match_line(line) {
                Some(trace_line) => {
                    matched += 1;
                    self.handle_line(&trace_line);
                }
                None => self.ctx.report(RecoverableError::UnrecognizedLine {
                    line: index + 1,
                    text: line.to_string(),
                }),
            }
        }

        debug!(
            "Matched {} systrace lines ({} import errors, {} tasks still on cpu)",
            matched,
            self.ctx.model.import_errors.len(),
            self.cpus.running_count()
        );
        self.ctx.finish()
    }

    fn handle_line(&mut self, line: &TraceLine<'_>) {
        if let Some(tgid) = line.tgid {
            self.tid_to_pid.insert(line.tid, tgid);
        }

        match line.source {
            EventSource::MarkerWrite | EventSource::LegacyMarker(_) => self.handle_marker(line),
            EventSource::Kernel(SCHED_SWITCH_EVENT_NAME) => {
                self.cpus
                    .sched_switch(&mut self.ctx, line.cpu, line.timestamp, line.payload)
            }
            EventSource::Kernel(CPU_FREQUENCY_EVENT_NAME) => {
                self.cpus
                    .cpu_frequency(&mut self.ctx, line.timestamp, line.payload)
            }
            EventSource::Kernel(name) => {
                if self.unsupported.insert(name.to_string()) {
                    self.ctx.report(RecoverableError::UnsupportedEvent {
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    fn handle_marker(&mut self, line: &TraceLine<'_>) {
        let event = match parse_marker(line.payload) {
            Ok(event) => event,
            Err(error) => {
                self.ctx.report(error);
                return;
            }
        };

        match event {
            MarkerEvent::Begin(begin) => {
                let thread = self.touch_thread(line, begin.pid);
                self.ctx.begin_slice(
                    thread,
                    OpenSlice {
                        category: begin.category.unwrap_or_default().to_string(),
                        title: begin.title.to_string(),
                        start: line.timestamp,
                        args: begin.args,
                    },
                );
            }
            MarkerEvent::End(end) => {
                let pid = end
                    .pid
                    .or_else(|| self.tid_to_pid.get(&line.tid).copied());
                let Some(pid) = pid else {
                    self.ctx.report(RecoverableError::UnmatchedEnd {
                        tid: line.tid,
                        timestamp: line.timestamp,
                    });
                    return;
                };
                let thread = ThreadRef::new(pid, line.tid);
                self.ctx.end_slice(
                    thread,
                    line.timestamp,
                    SliceClose {
                        category: end.category.map(str::to_string),
                        args: end.args,
                    },
                );
                // Name only threads that already exist; an unmatched end adds nothing
                if self.ctx.model.thread(pid, line.tid).is_some() {
                    self.touch_thread(line, pid);
                }
            }
            MarkerEvent::Counter(sample) => {
                self.touch_thread(line, sample.pid);
                self.ctx.add_counter_sample(
                    CounterOwner::Process(sample.pid),
                    sample.category.unwrap_or_default(),
                    sample.name,
                    line.timestamp,
                    &sample.values,
                );
            }
            MarkerEvent::AsyncStart(marker) => {
                let thread = self.touch_thread(line, marker.pid);
                self.ctx.start_async(AsyncEvent {
                    thread,
                    timestamp: line.timestamp,
                    name: marker.name.to_string(),
                    id: marker.id.map(str::to_string),
                    category: marker.category.unwrap_or_default().to_string(),
                    args: marker.args,
                });
            }
            MarkerEvent::AsyncFinish(marker) => {
                let thread = self.touch_thread(line, marker.pid);
                self.ctx.finish_async(AsyncEvent {
                    thread,
                    timestamp: line.timestamp,
                    name: marker.name.to_string(),
                    id: marker.id.map(str::to_string),
                    category: marker.category.unwrap_or_default().to_string(),
                    args: marker.args,
                });
            }
            MarkerEvent::Complete(complete) => {
                let thread = self.touch_thread(line, complete.pid);
                self.ctx.complete_slice(
                    thread,
                    Slice::new(
                        complete.category.unwrap_or_default(),
                        complete.title,
                        line.timestamp,
                        complete.duration,
                        complete.args,
                    ),
                );
            }
        }
    }

    /// Create (or find) the thread behind `line` in process `pid`, record the
    /// tid->pid association, and apply the header's thread name.
    fn touch_thread(&mut self, line: &TraceLine<'_>, pid: i64) -> ThreadRef {
        self.tid_to_pid.insert(line.tid, pid);
        let thread = ThreadRef::new(pid, line.tid);
        self.ctx
            .model
            .get_or_create_thread(thread)
            .set_name(line.thread_name);
        thread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_end_pair() {
        let model = import_systrace(
            "SurfaceFlinger-4831  [001] ...1 80909.598590: tracing_mark_write: B|4829|latchBuffer\n\
             SurfaceFlinger-4831  [001] ...1 80909.598604: tracing_mark_write: E\n",
        );

        assert!(model.import_errors.is_empty());
        let thread = model.thread(4829, 4831).unwrap();
        assert_eq!(thread.name.as_deref(), Some("SurfaceFlinger"));
        assert_eq!(thread.slices.len(), 1);
        assert!((thread.slices[0].duration - 0.014).abs() < 1e-6);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let model = import_systrace("# tracer: nop\n#\n\n   \n");
        assert!(model.import_errors.is_empty());
        assert!(model.processes.is_empty());
    }

    #[test]
    fn test_unrecognized_line_reports_line_number() {
        let model = import_systrace("# header\nnot a trace line\n");
        assert_eq!(model.import_errors.len(), 1);
        assert!(model.import_errors[0].starts_with("line 2:"));
    }

    #[test]
    fn test_end_without_known_pid() {
        let model = import_systrace("Thread-7  [000] 1.000000: tracing_mark_write: E\n");
        assert_eq!(model.import_errors.len(), 1);
        assert!(model.import_errors[0].contains("unmatched end"));
        assert!(model.processes.is_empty());
    }

    #[test]
    fn test_unsupported_kernel_event_reported_once() {
        let model = import_systrace(
            "kworker-12  [000] 1.000000: sched_wakeup: comm=a pid=1\n\
             kworker-12  [000] 2.000000: sched_wakeup: comm=b pid=2\n",
        );
        assert_eq!(model.import_errors.len(), 1);
        assert!(model.import_errors[0].contains("sched_wakeup"));
    }

    #[test]
    fn test_complete_event_bypasses_stack() {
        let model = import_systrace("RenderThread-20  [002] 3.000000: tracing_mark_write: X|10|draw|1.5|gfx\n");
        let slice = &model.thread(10, 20).unwrap().slices[0];
        assert_eq!(slice.title, "draw");
        assert_eq!(slice.category, "gfx");
        assert_eq!(slice.start, 3000.0);
        assert_eq!(slice.duration, 1.5);
    }
}
