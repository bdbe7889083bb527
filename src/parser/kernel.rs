//! Kernel scheduler events: CPU slices and CPU counters.

use super::context::ImportContext;
use super::event::CounterValue;
use crate::model::{Args, CounterOwner, Slice};
use crate::utils::config::{
    CPU_FREQUENCY_COUNTER_NAME, CPU_FREQUENCY_EVENT_NAME, SCHED_SWITCH_EVENT_NAME,
};
use crate::utils::error::RecoverableError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static SCHED_SWITCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"prev_comm=(.+) prev_pid=(\d+) prev_prio=(\d+) prev_state=(\S+) ==> ",
        r"next_comm=(.+) next_pid=(\d+) next_prio=(\d+)",
    ))
    .expect("Invalid sched_switch regex pattern")
});

static CPU_FREQUENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^state=(\d+) cpu_id=(\d+)").expect("Invalid cpu_frequency regex pattern")
});

/// Task currently switched in on a CPU
#[derive(Debug, Clone)]
struct RunningTask {
    comm: String,
    tid: i64,
    prio: i64,
    start: f64,
}

/// Turns sched_switch pairs into CPU slices
#[derive(Debug, Default)]
pub struct CpuScheduleTracker {
    running: HashMap<u32, RunningTask>,
}

impl CpuScheduleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the task running on `cpu` and switch in the next one.
    /// Switching to pid 0 (idle) opens nothing.
    pub fn sched_switch(
        &mut self,
        ctx: &mut ImportContext,
        cpu: u32,
        timestamp: f64,
        payload: &str,
    ) {
        let Some(caps) = SCHED_SWITCH_RE.captures(payload) else {
            ctx.report(malformed(SCHED_SWITCH_EVENT_NAME, payload));
            return;
        };
        let prev_state = caps.get(4).map_or("", |m| m.as_str());
        let next_comm = caps.get(5).map_or("", |m| m.as_str());
        let next_pid = caps.get(6).and_then(|m| m.as_str().parse::<i64>().ok());
        let next_prio = caps.get(7).and_then(|m| m.as_str().parse::<i64>().ok());
        let (Some(next_pid), Some(next_prio)) = (next_pid, next_prio) else {
            ctx.report(malformed(SCHED_SWITCH_EVENT_NAME, payload));
            return;
        };

        let cpu_entry = ctx.model.get_or_create_cpu(cpu);
        if let Some(task) = self.running.remove(&cpu) {
            let mut args = Args::new();
            args.insert("tid".to_string(), task.tid.to_string());
            args.insert("prio".to_string(), task.prio.to_string());
            args.insert("prev_state".to_string(), prev_state.to_string());
            cpu_entry.slices.push(Slice::new(
                "",
                task.comm,
                task.start,
                timestamp - task.start,
                args,
            ));
        }

        if next_pid != 0 {
            self.running.insert(
                cpu,
                RunningTask {
                    comm: next_comm.to_string(),
                    tid: next_pid,
                    prio: next_prio,
                    start: timestamp,
                },
            );
        }
    }

    /// Sample the `Clock Frequency` counter of the CPU named in the payload
    pub fn cpu_frequency(&mut self, ctx: &mut ImportContext, timestamp: f64, payload: &str) {
        let parsed = CPU_FREQUENCY_RE.captures(payload).and_then(|caps| {
            let state = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let cpu = caps.get(2)?.as_str().parse::<u32>().ok()?;
            Some((state, cpu))
        });
        let Some((state, cpu)) = parsed else {
            ctx.report(malformed(CPU_FREQUENCY_EVENT_NAME, payload));
            return;
        };

        let value = [CounterValue {
            series: Some("state"),
            value: state,
        }];
        ctx.add_counter_sample(
            CounterOwner::Cpu(cpu),
            "",
            CPU_FREQUENCY_COUNTER_NAME,
            timestamp,
            &value,
        );
    }

    /// Tasks still switched in; their slices are never completed
    pub fn running_count(&self) -> usize {
        self.running.len()
    }
}

fn malformed(name: &str, payload: &str) -> RecoverableError {
    RecoverableError::MalformedKernelEvent {
        name: name.to_string(),
        payload: payload.to_string(),
    }
}
