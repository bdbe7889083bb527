//! Marker payload dispatcher.
//!
//! The first character of a marker payload selects the event kind:
//!
//! | kind | payload                                        |
//! |------|------------------------------------------------|
//! | `B`  | `B|pid|title[|k=v;k=v...][|category]`          |
//! | `E`  | `E[|pid[|title[|k=v...][|category]]]`          |
//! | `C`  | `C|pid|name|v1[|v2...][|category]`             |
//! | `S`  | `S|pid|name[|cookie][|k=v...][|category]`     |
//! | `F`  | `F|pid|name[|cookie][|k=v...][|category]` (`T` is accepted as finish) |
//! | `X`  | `X|pid|title|duration_ms[|k=v...][|category]` |
//!
//! Fields are pipe-delimited. An argument field holds one or more `key=value`
//! pairs separated by `;`; a value keeps any further `=` characters.

use crate::model::Args;
use crate::utils::error::RecoverableError;

/// Closed set of event kinds understood in marker payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Begin,
    End,
    Counter,
    AsyncStart,
    AsyncFinish,
    Complete,
}

impl EventKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(Self::Begin),
            'E' => Some(Self::End),
            'C' => Some(Self::Counter),
            'S' => Some(Self::AsyncStart),
            'F' | 'T' => Some(Self::AsyncFinish),
            'X' => Some(Self::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceBegin<'a> {
    pub pid: i64,
    pub title: &'a str,
    pub category: Option<&'a str>,
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SliceEnd<'a> {
    pub pid: Option<i64>,
    pub title: Option<&'a str>,
    pub category: Option<&'a str>,
    pub args: Args,
}

/// One numeric field of a counter sample, optionally `series=value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterValue<'a> {
    pub series: Option<&'a str>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterSample<'a> {
    pub pid: i64,
    pub name: &'a str,
    pub category: Option<&'a str>,
    pub values: Vec<CounterValue<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsyncMarker<'a> {
    pub pid: i64,
    pub name: &'a str,
    pub id: Option<&'a str>,
    pub category: Option<&'a str>,
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompleteSlice<'a> {
    pub pid: i64,
    pub title: &'a str,
    /// Milliseconds
    pub duration: f64,
    pub category: Option<&'a str>,
    pub args: Args,
}

/// A parsed marker payload, one variant per `EventKind`
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEvent<'a> {
    Begin(SliceBegin<'a>),
    End(SliceEnd<'a>),
    Counter(CounterSample<'a>),
    AsyncStart(AsyncMarker<'a>),
    AsyncFinish(AsyncMarker<'a>),
    Complete(CompleteSlice<'a>),
}

/// Classify and parse a marker payload
///
/// # Errors
/// * `RecoverableError::UnknownEventKind` - leading token is not a known kind
/// * `RecoverableError::MalformedPayload` - required fields missing or invalid
pub fn parse_marker(payload: &str) -> Result<MarkerEvent<'_>, RecoverableError> {
    let trimmed = payload.trim_start();
    let fields: Vec<&str> = trimmed.split('|').collect();
    let head = fields.first().copied().unwrap_or("").trim_end();

    let mut chars = head.chars();
    let kind = match (chars.next(), chars.next()) {
        (Some(c), None) => EventKind::from_char(c),
        _ => None,
    };
    let Some(kind) = kind else {
        return Err(RecoverableError::UnknownEventKind {
            kind: head.to_string(),
            payload: payload.to_string(),
        });
    };

    let fields = PayloadFields {
        kind: head.chars().next().unwrap_or('?'),
        payload,
        fields: &fields,
    };

    match kind {
        EventKind::Begin => parse_begin(&fields).map(MarkerEvent::Begin),
        EventKind::End => parse_end(&fields).map(MarkerEvent::End),
        EventKind::Counter => parse_counter(&fields).map(MarkerEvent::Counter),
        EventKind::AsyncStart => parse_async(&fields).map(MarkerEvent::AsyncStart),
        EventKind::AsyncFinish => parse_async(&fields).map(MarkerEvent::AsyncFinish),
        EventKind::Complete => parse_complete(&fields).map(MarkerEvent::Complete),
    }
}

/// Split fields of one payload, plus context for error messages
struct PayloadFields<'p, 'a> {
    kind: char,
    payload: &'a str,
    fields: &'p [&'a str],
}

impl<'p, 'a> PayloadFields<'p, 'a> {
    fn malformed(&self, reason: impl Into<String>) -> RecoverableError {
        RecoverableError::MalformedPayload {
            kind: self.kind,
            reason: reason.into(),
            payload: self.payload.to_string(),
        }
    }

    fn get(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    fn required(&self, index: usize, what: &str) -> Result<&'a str, RecoverableError> {
        self.get(index)
            .ok_or_else(|| self.malformed(format!("missing {}", what)))
    }

    fn pid(&self) -> Result<i64, RecoverableError> {
        let raw = self.required(1, "pid")?;
        raw.trim()
            .parse()
            .map_err(|_| self.malformed(format!("invalid pid '{}'", raw)))
    }

    fn rest(&self, from: usize) -> &'p [&'a str] {
        self.fields.get(from..).unwrap_or(&[])
    }
}

/// Argument pairs plus bare (non `k=v`) tokens, in order
#[derive(Debug, Default)]
struct TrailingFields<'a> {
    args: Args,
    bare: Vec<&'a str>,
    /// Last non-empty field, when it is bare
    category: Option<&'a str>,
}

fn parse_trailing<'a>(fields: &[&'a str]) -> TrailingFields<'a> {
    let mut trailing = TrailingFields::default();
    for &field in fields {
        if field.is_empty() {
            continue;
        }
        if field.contains('=') {
            parse_args_into(field, &mut trailing.args);
            trailing.category = None;
        } else {
            trailing.bare.push(field);
            trailing.category = Some(field);
        }
    }
    trailing
}

/// Parse a number that can be written back out as JSON
fn parse_finite(raw: &str) -> Option<Result<f64, ()>> {
    let value = raw.trim().parse::<f64>().ok()?;
    Some(if value.is_finite() { Ok(value) } else { Err(()) })
}

/// `k1=v1;k2=v2`, each pair split on its first `=`
fn parse_args_into(field: &str, args: &mut Args) {
    for pair in field.split(';') {
        if let Some((key, value)) = pair.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                args.insert(key.to_string(), value.to_string());
            }
        }
    }
}

fn parse_begin<'a>(fields: &PayloadFields<'_, 'a>) -> Result<SliceBegin<'a>, RecoverableError> {
    let pid = fields.pid()?;
    let title = fields.required(2, "title")?;
    let trailing = parse_trailing(fields.rest(3));

    Ok(SliceBegin {
        pid,
        title,
        category: trailing.category,
        args: trailing.args,
    })
}

fn parse_end<'a>(fields: &PayloadFields<'_, 'a>) -> Result<SliceEnd<'a>, RecoverableError> {
    let pid = match fields.get(1).map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| fields.malformed(format!("invalid pid '{}'", raw)))?,
        ),
    };
    let title = fields.get(2).filter(|t| !t.is_empty());
    let trailing = parse_trailing(fields.rest(3));

    Ok(SliceEnd {
        pid,
        title,
        category: trailing.category,
        args: trailing.args,
    })
}

fn parse_counter<'a>(fields: &PayloadFields<'_, 'a>) -> Result<CounterSample<'a>, RecoverableError> {
    let pid = fields.pid()?;
    let name = fields.required(2, "counter name")?;
    let rest = fields.rest(3);

    let mut values: Vec<CounterValue<'a>> = Vec::with_capacity(rest.len());
    let mut category = None;
    for (i, &field) in rest.iter().enumerate() {
        let field = field.trim();
        let non_finite = || fields.malformed(format!("non-finite counter value '{}'", field));
        if let Some(value) = parse_finite(field) {
            values.push(CounterValue {
                series: None,
                value: value.map_err(|_| non_finite())?,
            });
            continue;
        }
        if let Some((series, raw)) = field.split_once('=') {
            if let Some(value) = parse_finite(raw) {
                let series = series.trim();
                if values.iter().any(|v| v.series == Some(series)) {
                    return Err(fields.malformed(format!("duplicate series '{}'", series)));
                }
                values.push(CounterValue {
                    series: Some(series),
                    value: value.map_err(|_| non_finite())?,
                });
                continue;
            }
        }
        if i + 1 == rest.len() && !field.is_empty() && !field.contains('=') {
            category = Some(field);
        } else {
            return Err(fields.malformed(format!("non-numeric counter value '{}'", field)));
        }
    }

    if values.is_empty() {
        return Err(fields.malformed("counter sample has no values"));
    }

    Ok(CounterSample {
        pid,
        name,
        category,
        values,
    })
}

fn parse_async<'a>(fields: &PayloadFields<'_, 'a>) -> Result<AsyncMarker<'a>, RecoverableError> {
    let pid = fields.pid()?;
    let name = fields.required(2, "async slice name")?;
    let trailing = parse_trailing(fields.rest(3));

    Ok(AsyncMarker {
        pid,
        name,
        id: trailing.bare.first().copied(),
        category: trailing.bare.get(1).copied(),
        args: trailing.args,
    })
}

fn parse_complete<'a>(
    fields: &PayloadFields<'_, 'a>,
) -> Result<CompleteSlice<'a>, RecoverableError> {
    let pid = fields.pid()?;
    let title = fields.required(2, "title")?;
    let raw = fields.required(3, "duration")?;
    let duration = parse_finite(raw)
        .and_then(Result::ok)
        .ok_or_else(|| fields.malformed(format!("invalid duration '{}'", raw)))?;
    if duration < 0.0 {
        return Err(fields.malformed("negative duration"));
    }
    let trailing = parse_trailing(fields.rest(4));

    Ok(CompleteSlice {
        pid,
        title,
        duration,
        category: trailing.category,
        args: trailing.args,
    })
}
