//! Processes, threads, and CPUs.

use super::counter::{Counter, Counters};
use super::slice::{AsyncSlice, Slice, ThreadRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub pid: i64,
    pub tid: i64,

    /// Display name, last writer wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Completed slices in completion order
    #[serde(default)]
    pub slices: Vec<Slice>,

    /// Async spans that started on this thread
    #[serde(default)]
    pub async_slices: Vec<AsyncSlice>,

    /// Original tid when this thread was renumbered during a sub-trace merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remapped_from: Option<i64>,
}

impl Thread {
    pub fn new(pid: i64, tid: i64) -> Self {
        Self {
            pid,
            tid,
            name: None,
            slices: Vec::new(),
            async_slices: Vec::new(),
            remapped_from: None,
        }
    }

    pub fn thread_ref(&self) -> ThreadRef {
        ThreadRef::new(self.pid, self.tid)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn push_slice(&mut self, slice: Slice) {
        self.slices.push(slice);
    }

    /// True when the thread carries any timed data
    pub fn has_timed_data(&self) -> bool {
        !self.slices.is_empty() || !self.async_slices.is_empty()
    }

    /// Name if known, otherwise the tid
    pub fn user_friendly_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.tid),
            None => format!("Thread {}", self.tid),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub pid: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub threads: BTreeMap<i64, Thread>,

    #[serde(default)]
    pub counters: Counters,
}

impl Process {
    pub fn new(pid: i64) -> Self {
        Self {
            pid,
            name: None,
            threads: BTreeMap::new(),
            counters: Counters::new(),
        }
    }

    pub fn get_or_create_thread(&mut self, tid: i64) -> &mut Thread {
        let pid = self.pid;
        self.threads
            .entry(tid)
            .or_insert_with(|| Thread::new(pid, tid))
    }

    pub fn thread(&self, tid: i64) -> Option<&Thread> {
        self.threads.get(&tid)
    }

    pub fn get_or_create_counter(&mut self, category: &str, name: &str) -> &mut Counter {
        self.counters.get_or_create(category, name)
    }

    pub fn counter(&self, category: &str, name: &str) -> Option<&Counter> {
        self.counters.get(category, name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cpu {
    pub id: u32,

    /// Slices observed running on this CPU, in completion order
    #[serde(default)]
    pub slices: Vec<Slice>,

    #[serde(default)]
    pub counters: Counters,
}

impl Cpu {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            slices: Vec::new(),
            counters: Counters::new(),
        }
    }

    pub fn get_or_create_counter(&mut self, category: &str, name: &str) -> &mut Counter {
        self.counters.get_or_create(category, name)
    }

    pub fn counter(&self, category: &str, name: &str) -> Option<&Counter> {
        self.counters.get(category, name)
    }
}
