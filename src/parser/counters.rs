//! Counter series builder.
//!
//! The first sample of a counter fixes its series. Later samples must carry
//! the same number of values or they are dropped, which keeps `timestamps`
//! and `samples` aligned.

use super::event::CounterValue;
use crate::model::Counter;
use crate::utils::config::DEFAULT_SERIES_NAME;
use crate::utils::error::RecoverableError;

/// Append one sample row to `counter`
///
/// # Errors
/// * `RecoverableError::CounterCardinality` - value count differs from the
///   counter's series count; nothing was appended
/// * `RecoverableError::CounterRegression` - timestamp is earlier than the
///   previous sample; the sample *was* appended
pub fn append_sample(
    counter: &mut Counter,
    timestamp: f64,
    values: &[CounterValue<'_>],
) -> Result<(), RecoverableError> {
    if counter.num_series() == 0 {
        declare_series(counter, values);
    }

    if values.len() != counter.num_series() {
        return Err(RecoverableError::CounterCardinality {
            name: counter.name.clone(),
            expected: counter.num_series(),
            found: values.len(),
        });
    }

    let row = arrange_row(counter, values);
    let previous = counter.last_timestamp();
    counter.push_row(timestamp, &row);

    match previous {
        Some(previous) if timestamp < previous => Err(RecoverableError::CounterRegression {
            name: counter.name.clone(),
            previous,
            timestamp,
        }),
        _ => Ok(()),
    }
}

fn declare_series(counter: &mut Counter, values: &[CounterValue<'_>]) {
    let all_named = values.iter().all(|v| v.series.is_some());
    for (i, value) in values.iter().enumerate() {
        match value.series {
            Some(name) if all_named => counter.add_series(name),
            _ if values.len() == 1 => counter.add_series(DEFAULT_SERIES_NAME),
            _ => counter.add_series(format!("{}{}", DEFAULT_SERIES_NAME, i)),
        }
    }
}

/// Order values by series. Named values go to their series when every name
/// is known; otherwise values are taken positionally.
fn arrange_row(counter: &Counter, values: &[CounterValue<'_>]) -> Vec<f64> {
    let indices: Option<Vec<usize>> = values
        .iter()
        .map(|v| v.series.and_then(|name| counter.series_index(name)))
        .collect();

    match indices {
        Some(indices) => {
            let mut row = vec![0.0; counter.num_series()];
            for (index, value) in indices.into_iter().zip(values) {
                row[index] = value.value;
            }
            row
        }
        None => values.iter().map(|v| v.value).collect(),
    }
}
