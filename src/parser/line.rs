//! Systrace line matcher.
//!
//! A line looks like
//!
//! ```text
//! Surface Flinger -4831  (  4829) [001] ...1 80909.598554: tracing_mark_write: B|4829|latchBuffer
//! ```
//!
//! The thread name is free-form, so the tid is taken from the *last* `-<digits>`
//! that still lets the rest of the header match. The TGID and irq-flag columns
//! are optional. The event name before the payload is either the marker token
//! `tracing_mark_write`, a small integer code (legacy kernels), or the name of
//! some other kernel event.

use crate::utils::config::{MARKER_EVENT_NAME, SECONDS_TO_MS};
use regex::Regex;
use std::sync::LazyLock;

/// Header grammar. `(.+)` is greedy so the name keeps any inner hyphens.
static TRACE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(.+)-(\d+)\s+",                     // thread name, tid
        r"(?:\(\s*(\d+|-+)\)\s+)?",               // optional tgid column
        r"\[(\d+)\]",                             // cpu
        r"(?:\s+[dXx.][Nnp.][Hhs.][0-9a-f.]+)?", // optional irq flags
        r"\s+(\d+\.\d+):\s+",                     // timestamp in seconds
        r"(\S+):\s?(.*)$",                        // event name, payload
    ))
    .expect("Invalid trace line regex pattern")
});

/// What kind of event produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource<'a> {
    /// `tracing_mark_write: <payload>`
    MarkerWrite,
    /// `<code>: <payload>` as written by older kernels
    LegacyMarker(u32),
    /// Any other kernel event, e.g. `sched_switch`
    Kernel(&'a str),
}

impl EventSource<'_> {
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::MarkerWrite | Self::LegacyMarker(_))
    }
}

/// One matched systrace line
#[derive(Debug, Clone, PartialEq)]
pub struct TraceLine<'a> {
    pub thread_name: &'a str,
    pub tid: i64,
    /// Thread group (process) id when the TGID column is present and numeric
    pub tgid: Option<i64>,
    pub cpu: u32,
    /// Milliseconds
    pub timestamp: f64,
    pub source: EventSource<'a>,
    pub payload: &'a str,
}

/// Match a single line against the header grammars
///
/// Returns `None` when the line fits neither form.
pub fn match_line(line: &str) -> Option<TraceLine<'_>> {
    let caps = TRACE_LINE_RE.captures(line)?;

    let thread_name = caps.get(1)?.as_str();
    let tid = caps.get(2)?.as_str().parse().ok()?;
    let tgid = caps.get(3).and_then(|m| m.as_str().parse().ok());
    let cpu = caps.get(4)?.as_str().parse().ok()?;
    let seconds = caps
        .get(5)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())?;
    let event_name = caps.get(6)?.as_str();
    let payload = caps.get(7).map_or("", |m| m.as_str());

    Some(TraceLine {
        thread_name,
        tid,
        tgid,
        cpu,
        timestamp: seconds * SECONDS_TO_MS,
        source: classify_event_name(event_name),
        payload,
    })
}

fn classify_event_name(name: &str) -> EventSource<'_> {
    if name == MARKER_EVENT_NAME {
        EventSource::MarkerWrite
    } else if let Ok(code) = name.parse::<u32>() {
        EventSource::LegacyMarker(code)
    } else {
        EventSource::Kernel(name)
    }
}
