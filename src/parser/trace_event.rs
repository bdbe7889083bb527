//! JSON trace-event importer.
//!
//! Consumes an already-parsed array of trace events (timestamps in
//! microseconds) and feeds them through the same builders as the systrace
//! importer. An element that is not a usable event is one import error;
//! the rest of the array is still imported.

use super::async_slices::AsyncEvent;
use super::context::ImportContext;
use super::event::CounterValue;
use super::slice_stack::{OpenSlice, SliceClose};
use crate::model::{Args, CounterOwner, Slice, ThreadRef, TraceModel};
use crate::utils::config::MICROSECONDS_TO_MS;
use crate::utils::error::RecoverableError;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One element of a `traceEvents` array
#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    pub ph: String,

    #[serde(default)]
    pub ts: Option<f64>,

    #[serde(default)]
    pub dur: Option<f64>,

    #[serde(default)]
    pub pid: Option<i64>,

    #[serde(default)]
    pub tid: Option<i64>,

    #[serde(default)]
    pub cat: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub args: Option<Map<String, Value>>,
}

impl TraceEvent {
    fn thread(&self) -> ThreadRef {
        ThreadRef::new(self.pid.unwrap_or(0), self.tid.unwrap_or(0))
    }

    fn category(&self) -> &str {
        self.cat.as_deref().unwrap_or_default()
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn args(&self) -> Args {
        self.args.as_ref().map(convert_args).unwrap_or_default()
    }

    fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::Null => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Import a trace-event array into a fresh partial model
///
/// **Public** - used by the sub-trace merger
pub fn import_trace_events(events: &[Value]) -> TraceModel {
    let mut ctx = ImportContext::new();

    for (index, value) in events.iter().enumerate() {
        match TraceEvent::deserialize(value) {
            Ok(event) => handle_event(&mut ctx, index, &event),
            Err(e) => ctx.report(RecoverableError::InvalidTraceEvent {
                index,
                reason: e.to_string(),
            }),
        }
    }

    debug!(
        "Imported {} trace events ({} import errors)",
        events.len(),
        ctx.model.import_errors.len()
    );
    ctx.finish()
}

fn handle_event(ctx: &mut ImportContext, index: usize, event: &TraceEvent) {
    if event.ph == "M" {
        apply_metadata(ctx, event);
        return;
    }
    // Steps of async slices carry nothing the model keeps
    if matches!(event.ph.as_str(), "T" | "p" | "n") {
        return;
    }

    let Some(ts) = event.ts else {
        ctx.report(invalid(index, format!("phase '{}' event has no ts", event.ph)));
        return;
    };
    let timestamp = ts * MICROSECONDS_TO_MS;
    let thread = event.thread();

    match event.ph.as_str() {
        "B" => ctx.begin_slice(
            thread,
            OpenSlice {
                category: event.category().to_string(),
                title: event.name().to_string(),
                start: timestamp,
                args: event.args(),
            },
        ),
        "E" => ctx.end_slice(
            thread,
            timestamp,
            SliceClose {
                category: event.cat.clone().filter(|c| !c.is_empty()),
                args: event.args(),
            },
        ),
        "X" => {
            let duration = event.dur.unwrap_or(0.0) * MICROSECONDS_TO_MS;
            ctx.complete_slice(
                thread,
                Slice::new(event.category(), event.name(), timestamp, duration, event.args()),
            );
        }
        "I" | "i" => ctx.complete_slice(
            thread,
            Slice::new(event.category(), event.name(), timestamp, 0.0, event.args()),
        ),
        "C" => add_counter(ctx, index, event, timestamp),
        "S" | "b" => ctx.start_async(async_event(event, thread, timestamp)),
        "F" | "e" => ctx.finish_async(async_event(event, thread, timestamp)),
        other => ctx.report(invalid(index, format!("unsupported phase '{}'", other))),
    }
}

fn add_counter(ctx: &mut ImportContext, index: usize, event: &TraceEvent, timestamp: f64) {
    let Some(args) = event.args.as_ref().filter(|args| !args.is_empty()) else {
        ctx.report(invalid(index, "counter event has no values".to_string()));
        return;
    };

    // serde_json's Map is ordered by key, which fixes the series order
    let mut values = Vec::with_capacity(args.len());
    for (series, value) in args {
        let Some(value) = value.as_f64() else {
            ctx.report(invalid(
                index,
                format!("counter value '{}' is not a number", series),
            ));
            return;
        };
        values.push(CounterValue {
            series: Some(series.as_str()),
            value,
        });
    }

    ctx.add_counter_sample(
        CounterOwner::Process(event.pid.unwrap_or(0)),
        event.category(),
        event.name(),
        timestamp,
        &values,
    );
}

fn async_event(event: &TraceEvent, thread: ThreadRef, timestamp: f64) -> AsyncEvent {
    AsyncEvent {
        thread,
        timestamp,
        name: event.name().to_string(),
        id: event.id(),
        category: event.category().to_string(),
        args: event.args(),
    }
}

fn apply_metadata(ctx: &mut ImportContext, event: &TraceEvent) {
    let Some(name) = event
        .args
        .as_ref()
        .and_then(|args| args.get("name"))
        .and_then(Value::as_str)
    else {
        return;
    };

    match event.name() {
        "thread_name" => ctx.model.get_or_create_thread(event.thread()).set_name(name),
        "process_name" => {
            ctx.model
                .get_or_create_process(event.pid.unwrap_or(0))
                .name = Some(name.to_string());
        }
        _ => {}
    }
}

/// Flatten event args to strings. Object args carrying an `id_ref` collapse
/// to that reference; anything else non-string becomes compact JSON.
fn convert_args(args: &Map<String, Value>) -> Args {
    args.iter()
        .map(|(key, value)| (key.clone(), arg_to_string(value)))
        .collect()
}

fn arg_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(object) => match object.get("id_ref") {
            Some(Value::String(id)) => id.clone(),
            Some(id) => id.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn invalid(index: usize, reason: String) -> RecoverableError {
    RecoverableError::InvalidTraceEvent { index, reason }
}
