//! Container detection.
//!
//! An input is one of:
//! - systrace text
//! - a JSON array of trace events (possibly truncated, missing its `]`)
//! - a JSON object with `traceEvents` and/or `systemTraceEvents`
//!
//! A combined object yields two sub-traces, trace events first.

use crate::model::TraceModel;
use crate::parser::{import_systrace, import_trace_events};
use crate::utils::error::ImportError;
use log::debug;
use serde_json::Value;
use std::borrow::Cow;

const TRACE_EVENTS_KEY: &str = "traceEvents";
const SYSTEM_TRACE_EVENTS_KEY: &str = "systemTraceEvents";

/// One independently importable piece of an input
#[derive(Debug, Clone, PartialEq)]
pub enum SubTrace<'a> {
    Systrace(Cow<'a, str>),
    TraceEvents(Vec<Value>),
}

impl SubTrace<'_> {
    /// Build the partial model for this sub-trace
    pub fn import(&self) -> TraceModel {
        match self {
            SubTrace::Systrace(text) => import_systrace(text),
            SubTrace::TraceEvents(events) => import_trace_events(events),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubTrace::Systrace(_) => "systrace",
            SubTrace::TraceEvents(_) => "trace events",
        }
    }
}

/// Split one input into its sub-traces
///
/// **Public** - first stage of `import_traces`
///
/// # Returns
/// Sub-traces in import order. Empty or whitespace-only input yields none.
///
/// # Errors
/// * `ImportError::Json` - input looks like JSON but does not parse
/// * `ImportError::InvalidFormat` - JSON of an unexpected shape
pub fn split_subtraces(input: &str) -> Result<Vec<SubTrace<'_>>, ImportError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(vec![SubTrace::TraceEvents(parse_event_array(trimmed)?)]);
    }
    if trimmed.starts_with('{') {
        return split_object(trimmed);
    }

    Ok(vec![SubTrace::Systrace(Cow::Borrowed(input))])
}

/// Parse a trace-event array, closing it first if the writer was cut off
fn parse_event_array(text: &str) -> Result<Vec<Value>, ImportError> {
    let repaired: Cow<'_, str> = if text.ends_with(']') {
        Cow::Borrowed(text)
    } else {
        debug!("Trace event array is not terminated; closing it");
        let body = text.trim_end_matches(|c: char| c == ',' || c.is_whitespace());
        Cow::Owned(format!("{}]", body))
    };

    match serde_json::from_str::<Value>(&repaired)? {
        Value::Array(events) => Ok(events),
        other => Err(ImportError::InvalidFormat(format!(
            "expected a trace event array, found {}",
            json_type(&other)
        ))),
    }
}

fn split_object(text: &str) -> Result<Vec<SubTrace<'static>>, ImportError> {
    let mut object = match serde_json::from_str::<Value>(text)? {
        Value::Object(object) => object,
        other => {
            return Err(ImportError::InvalidFormat(format!(
                "expected a trace object, found {}",
                json_type(&other)
            )))
        }
    };

    let mut subtraces = Vec::new();

    match object.remove(TRACE_EVENTS_KEY) {
        None => {}
        Some(Value::Array(events)) => subtraces.push(SubTrace::TraceEvents(events)),
        Some(other) => {
            return Err(ImportError::InvalidFormat(format!(
                "'{}' must be an array, found {}",
                TRACE_EVENTS_KEY,
                json_type(&other)
            )))
        }
    }

    match object.remove(SYSTEM_TRACE_EVENTS_KEY) {
        None => {}
        Some(Value::String(text)) => subtraces.push(SubTrace::Systrace(Cow::Owned(text))),
        Some(other) => {
            return Err(ImportError::InvalidFormat(format!(
                "'{}' must be a string, found {}",
                SYSTEM_TRACE_EVENTS_KEY,
                json_type(&other)
            )))
        }
    }

    if subtraces.is_empty() {
        return Err(ImportError::InvalidFormat(format!(
            "object has neither '{}' nor '{}'",
            TRACE_EVENTS_KEY, SYSTEM_TRACE_EVENTS_KEY
        )));
    }

    Ok(subtraces)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
