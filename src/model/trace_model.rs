//! The root of the imported model.
//!
//! Entities are created lazily through get-or-create accessors and live as
//! long as the model. `finalize` recomputes the derived aggregates (bounds and
//! categories) from scratch; after it runs the model is read-only for callers.

use super::counter::Counter;
use super::process::{Cpu, Process, Thread};
use super::slice::ThreadRef;
use crate::utils::config::ImportOptions;
use crate::utils::error::ImportError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Global time bounds in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn at(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

fn extend_bounds(bounds: &mut Option<Bounds>, value: f64) {
    match bounds {
        Some(b) => b.include(value),
        None => *bounds = Some(Bounds::at(value)),
    }
}

/// Entity owning a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOwner {
    Process(i64),
    Cpu(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceModel {
    #[serde(default)]
    pub processes: BTreeMap<i64, Process>,

    #[serde(default)]
    pub cpus: BTreeMap<u32, Cpu>,

    /// Absent when the model holds no timed entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,

    /// Sorted, de-duplicated, non-empty slice categories
    #[serde(default)]
    pub categories: Vec<String>,

    /// Diagnostics gathered while importing, in order
    #[serde(default)]
    pub import_errors: Vec<String>,
}

impl TraceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a single trace blob with default options
    pub fn from_trace(trace: &str) -> Result<Self, ImportError> {
        let mut model = Self::new();
        model.import_traces(&[trace])?;
        Ok(model)
    }

    /// Replace this model's contents with the import of `traces`
    pub fn import_traces(&mut self, traces: &[&str]) -> Result<(), ImportError> {
        self.import_traces_with_options(traces, ImportOptions::default())
    }

    /// Re-run the whole pipeline. On a fatal error the model is left empty.
    pub fn import_traces_with_options(
        &mut self,
        traces: &[&str],
        options: ImportOptions,
    ) -> Result<(), ImportError> {
        *self = Self::new();
        *self = crate::aggregator::import_traces(traces, options)?;
        Ok(())
    }

    pub fn get_or_create_process(&mut self, pid: i64) -> &mut Process {
        self.processes
            .entry(pid)
            .or_insert_with(|| Process::new(pid))
    }

    pub fn process(&self, pid: i64) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn get_or_create_thread(&mut self, thread: ThreadRef) -> &mut Thread {
        self.get_or_create_process(thread.pid)
            .get_or_create_thread(thread.tid)
    }

    pub fn thread(&self, pid: i64, tid: i64) -> Option<&Thread> {
        self.process(pid)?.thread(tid)
    }

    pub fn get_or_create_cpu(&mut self, id: u32) -> &mut Cpu {
        self.cpus.entry(id).or_insert_with(|| Cpu::new(id))
    }

    pub fn cpu(&self, id: u32) -> Option<&Cpu> {
        self.cpus.get(&id)
    }

    pub fn get_or_create_counter(
        &mut self,
        owner: CounterOwner,
        category: &str,
        name: &str,
    ) -> &mut Counter {
        match owner {
            CounterOwner::Process(pid) => self
                .get_or_create_process(pid)
                .get_or_create_counter(category, name),
            CounterOwner::Cpu(id) => self.get_or_create_cpu(id).get_or_create_counter(category, name),
        }
    }

    /// Every thread of every process, ordered by (pid, tid)
    pub fn get_all_threads(&self) -> Vec<&Thread> {
        self.processes
            .values()
            .flat_map(|p| p.threads.values())
            .collect()
    }

    /// Process counters followed by CPU counters
    pub fn get_all_counters(&self) -> Vec<&Counter> {
        self.processes
            .values()
            .flat_map(|p| p.counters.values())
            .chain(self.cpus.values().flat_map(|c| c.counters.values()))
            .collect()
    }

    pub fn get_all_cpus(&self) -> Vec<&Cpu> {
        self.cpus.values().collect()
    }

    pub fn find_all_threads_named(&self, name: &str) -> Vec<&Thread> {
        self.get_all_threads()
            .into_iter()
            .filter(|t| t.name.as_deref() == Some(name))
            .collect()
    }

    pub fn has_import_errors(&self) -> bool {
        !self.import_errors.is_empty()
    }

    /// Recompute bounds and categories, optionally moving the origin to zero
    pub fn finalize(&mut self, options: ImportOptions) {
        self.update_bounds();
        if options.shift_world_to_zero {
            if let Some(bounds) = self.bounds {
                debug!("Shifting timestamps by {}ms", -bounds.min);
                self.shift_timestamps(-bounds.min);
                self.update_bounds();
            }
        }
        self.update_categories();
    }

    pub fn update_bounds(&mut self) {
        let mut bounds = None;

        for process in self.processes.values() {
            for thread in process.threads.values() {
                for slice in &thread.slices {
                    extend_bounds(&mut bounds, slice.start);
                    extend_bounds(&mut bounds, slice.end());
                }
                for slice in &thread.async_slices {
                    extend_bounds(&mut bounds, slice.start);
                    extend_bounds(&mut bounds, slice.end);
                }
            }
        }
        for cpu in self.cpus.values() {
            for slice in &cpu.slices {
                extend_bounds(&mut bounds, slice.start);
                extend_bounds(&mut bounds, slice.end());
            }
        }
        for counter in self.get_all_counters() {
            if let Some((first, last)) = counter.time_range() {
                extend_bounds(&mut bounds, first);
                extend_bounds(&mut bounds, last);
            }
        }

        self.bounds = bounds;
    }

    pub fn update_categories(&mut self) {
        let mut categories = BTreeSet::new();

        for thread in self.processes.values().flat_map(|p| p.threads.values()) {
            categories.extend(thread.slices.iter().map(|s| s.category.as_str()));
            categories.extend(thread.async_slices.iter().map(|s| s.category.as_str()));
        }
        for cpu in self.cpus.values() {
            categories.extend(cpu.slices.iter().map(|s| s.category.as_str()));
        }

        self.categories = categories
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Add `delta` milliseconds to every timestamp in the model
    pub fn shift_timestamps(&mut self, delta: f64) {
        for process in self.processes.values_mut() {
            for thread in process.threads.values_mut() {
                for slice in &mut thread.slices {
                    slice.start += delta;
                }
                for slice in &mut thread.async_slices {
                    slice.start += delta;
                    slice.end += delta;
                }
            }
            for counter in process.counters.values_mut() {
                counter.timestamps.iter_mut().for_each(|ts| *ts += delta);
            }
        }
        for cpu in self.cpus.values_mut() {
            for slice in &mut cpu.slices {
                slice.start += delta;
            }
            for counter in cpu.counters.values_mut() {
                counter.timestamps.iter_mut().for_each(|ts| *ts += delta);
            }
        }
        if let Some(bounds) = &mut self.bounds {
            bounds.min += delta;
            bounds.max += delta;
        }
    }
}
