//! Multi-series numeric counters.
//!
//! A counter stores one row per timestamp. Samples are flattened row-major:
//! `samples[row * num_series + series]`.

use crate::utils::config::COUNTER_COLOR_PALETTE_SIZE;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Composite lookup key for counters owned by a process or CPU
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterKey {
    pub category: String,
    pub name: String,
}

impl CounterKey {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(default)]
    pub category: String,
    pub name: String,
    pub series_names: Vec<String>,
    pub series_colors: Vec<u32>,
    pub timestamps: Vec<f64>,
    pub samples: Vec<f64>,
}

impl Counter {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            series_names: Vec::new(),
            series_colors: Vec::new(),
            timestamps: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.category.clone(), self.name.clone())
    }

    pub fn num_series(&self) -> usize {
        self.series_names.len()
    }

    /// Number of sample rows (one per timestamp)
    pub fn num_samples(&self) -> usize {
        self.timestamps.len()
    }

    /// Register a series, keeping names and colors the same length
    pub fn add_series(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.series_colors.push(series_color_id(&name));
        self.series_names.push(name);
    }

    pub fn series_index(&self, name: &str) -> Option<usize> {
        self.series_names.iter().position(|n| n == name)
    }

    /// Value of `series` at sample row `row`
    pub fn get_sample_value(&self, row: usize, series: usize) -> Option<f64> {
        if series >= self.num_series() || row >= self.num_samples() {
            return None;
        }
        self.samples.get(row * self.num_series() + series).copied()
    }

    /// All series values for one row
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let width = self.num_series();
        if row >= self.num_samples() {
            return None;
        }
        self.samples.get(row * width..(row + 1) * width)
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// Append a row without validation. Callers guarantee `values.len() == num_series()`.
    pub(crate) fn push_row(&mut self, timestamp: f64, values: &[f64]) {
        debug_assert_eq!(values.len(), self.num_series());
        self.timestamps.push(timestamp);
        self.samples.extend_from_slice(values);
    }

    /// (first timestamp, last timestamp)
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.timestamps.first()?;
        let min = self.timestamps.iter().copied().fold(*first, f64::min);
        let max = self.timestamps.iter().copied().fold(*first, f64::max);
        Some((min, max))
    }
}

/// Stable color id for a series name
fn series_color_id(name: &str) -> u32 {
    let hash = name
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    hash % COUNTER_COLOR_PALETTE_SIZE
}

/// Counters owned by one process or CPU, keyed by (category, name).
///
/// Serialized as a plain array; keys are rebuilt from each counter on read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counters(BTreeMap<CounterKey, Counter>);

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, category: &str, name: &str) -> &mut Counter {
        self.0
            .entry(CounterKey::new(category, name))
            .or_insert_with(|| Counter::new(category, name))
    }

    pub fn get(&self, category: &str, name: &str) -> Option<&Counter> {
        self.0.get(&CounterKey::new(category, name))
    }

    pub fn get_mut(&mut self, key: &CounterKey) -> Option<&mut Counter> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, counter: Counter) -> Option<Counter> {
        self.0.insert(counter.key(), counter)
    }

    pub fn values(&self) -> impl Iterator<Item = &Counter> {
        self.0.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Counter> {
        self.0.values_mut()
    }

    pub fn into_values(self) -> impl Iterator<Item = Counter> {
        self.0.into_values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Counters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

impl<'de> Deserialize<'de> for Counters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let counters = Vec::<Counter>::deserialize(deserializer)?;
        Ok(Self(counters.into_iter().map(|c| (c.key(), c)).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_series_counter() -> Counter {
        let mut counter = Counter::new("", "ProcessCounter");
        counter.add_series("a");
        counter.add_series("b");
        for (ts, row) in [[5.0, 10.0], [6.0, 15.0], [5.0, 12.0], [7.0, 16.0]]
            .iter()
            .enumerate()
        {
            counter.push_row(ts as f64, row);
        }
        counter
    }

    #[test]
    fn test_sample_lookup_is_row_major() {
        let counter = two_series_counter();

        assert_eq!(counter.num_samples(), 4);
        assert_eq!(counter.samples, vec![5.0, 10.0, 6.0, 15.0, 5.0, 12.0, 7.0, 16.0]);
        assert_eq!(counter.get_sample_value(0, 1), Some(10.0));
        assert_eq!(counter.get_sample_value(2, 0), Some(5.0));
        assert_eq!(counter.get_sample_value(4, 0), None);
        assert_eq!(counter.get_sample_value(0, 2), None);
        assert_eq!(counter.row(3), Some(&[7.0, 16.0][..]));
    }

    #[test]
    fn test_series_colors_track_names() {
        let counter = two_series_counter();
        assert_eq!(counter.series_colors.len(), counter.series_names.len());
        assert!(counter
            .series_colors
            .iter()
            .all(|c| *c < COUNTER_COLOR_PALETTE_SIZE));
    }

    #[test]
    fn test_counters_serialize_as_array() {
        let mut counters = Counters::new();
        counters.get_or_create("cat", "b");
        counters.get_or_create("", "a");

        let value = serde_json::to_value(&counters).unwrap();
        assert!(value.is_array());

        let back: Counters = serde_json::from_value(value).unwrap();
        assert_eq!(back, counters);
        assert!(back.get("cat", "b").is_some());
    }
}
