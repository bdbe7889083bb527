//! Merge partial models into the final model.
//!
//! Sub-traces are imported independently and then folded into one model in
//! import order. Processes, threads, counters and CPUs with the same ids are
//! unioned. When two sub-traces both carry timed data for the same (pid, tid)
//! but disagree on the thread's identity, the later thread is moved to a
//! synthetic tid so neither loses its slices.

use crate::model::{Counter, Counters, Thread, ThreadRef, TraceModel};
use crate::utils::config::SYNTHETIC_TID_STRIDE;
use crate::utils::error::RecoverableError;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::iter;

/// Fold `partial` into `target`
///
/// **Public** - called once per sub-trace by `import_traces`
///
/// # Arguments
/// * `target` - model accumulated so far
/// * `partial` - model of one sub-trace
/// * `subtrace_index` - position of the sub-trace in import order; seeds
///   the synthetic tid range so remaps stay deterministic
pub fn merge_partial(target: &mut TraceModel, mut partial: TraceModel, subtrace_index: usize) {
    let mut conflicts = Vec::new();

    let remaps = plan_remaps(target, &partial, subtrace_index, &mut conflicts);
    if !remaps.is_empty() {
        info!(
            "Sub-trace {} reuses {} thread id(s) already in the model; remapping",
            subtrace_index,
            remaps.len()
        );
        apply_remaps(&mut partial, &remaps);
    }

    for (pid, process) in partial.processes {
        let target_process = target.get_or_create_process(pid);
        if process.name.is_some() {
            target_process.name = process.name;
        }
        for (tid, thread) in process.threads {
            merge_thread(target_process.get_or_create_thread(tid), thread);
        }
        merge_counters(&mut target_process.counters, process.counters, &mut conflicts);
    }

    for (id, cpu) in partial.cpus {
        let target_cpu = target.get_or_create_cpu(id);
        target_cpu.slices.extend(cpu.slices);
        merge_counters(&mut target_cpu.counters, cpu.counters, &mut conflicts);
    }

    target.import_errors.extend(partial.import_errors);
    target
        .import_errors
        .extend(conflicts.into_iter().map(|e| e.to_string()));
}

/// Two threads describe different tasks when both have timed data and their
/// names are not the same known name.
fn is_distinct_thread(existing: &Thread, incoming: &Thread) -> bool {
    if !existing.has_timed_data() || !incoming.has_timed_data() {
        return false;
    }
    match (&existing.name, &incoming.name) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

fn plan_remaps(
    target: &TraceModel,
    partial: &TraceModel,
    subtrace_index: usize,
    conflicts: &mut Vec<RecoverableError>,
) -> BTreeMap<ThreadRef, ThreadRef> {
    let mut remaps = BTreeMap::new();

    for (&pid, process) in &partial.processes {
        let Some(existing) = target.process(pid) else {
            continue;
        };

        let mut taken: HashSet<i64> = existing
            .threads
            .keys()
            .chain(process.threads.keys())
            .copied()
            .collect();

        for (&tid, thread) in &process.threads {
            let Some(other) = existing.thread(tid) else {
                continue;
            };
            if !is_distinct_thread(other, thread) {
                continue;
            }

            let Some(synthetic) = allocate_synthetic_tid(tid, subtrace_index, &taken) else {
                conflicts.push(RecoverableError::SyntheticTidExhausted { pid, tid });
                continue;
            };
            taken.insert(synthetic);
            debug!(
                "Thread {}:{} collides with an existing thread; using synthetic tid {}",
                pid, tid, synthetic
            );
            remaps.insert(ThreadRef::new(pid, tid), ThreadRef::new(pid, synthetic));
        }
    }

    remaps
}

/// First free tid on the `tid + stride * (index + 1 + k)` ladder. Tids too
/// close to `i64::MAX` walk the same ladder downwards instead.
fn allocate_synthetic_tid(tid: i64, subtrace_index: usize, taken: &HashSet<i64>) -> Option<i64> {
    let step = i64::try_from(subtrace_index).ok()?.checked_add(1)?;
    let offset = SYNTHETIC_TID_STRIDE.checked_mul(step)?;

    let upward = iter::successors(tid.checked_add(offset), |c| {
        c.checked_add(SYNTHETIC_TID_STRIDE)
    });
    let downward = iter::successors(tid.checked_sub(offset), |c| {
        c.checked_sub(SYNTHETIC_TID_STRIDE)
    });
    upward.chain(downward).find(|c| !taken.contains(c))
}

fn apply_remaps(partial: &mut TraceModel, remaps: &BTreeMap<ThreadRef, ThreadRef>) {
    for (from, to) in remaps {
        let Some(process) = partial.processes.get_mut(&from.pid) else {
            continue;
        };
        if let Some(mut thread) = process.threads.remove(&from.tid) {
            thread.tid = to.tid;
            thread.remapped_from = Some(from.tid);
            process.threads.insert(to.tid, thread);
        }
    }

    // Async slices refer to threads by value
    for process in partial.processes.values_mut() {
        for thread in process.threads.values_mut() {
            for slice in &mut thread.async_slices {
                if let Some(to) = remaps.get(&slice.start_thread) {
                    slice.start_thread = *to;
                }
                if let Some(to) = remaps.get(&slice.end_thread) {
                    slice.end_thread = *to;
                }
            }
        }
    }
}

fn merge_thread(target: &mut Thread, incoming: Thread) {
    if let Some(name) = incoming.name {
        target.name = Some(name);
    }
    if incoming.remapped_from.is_some() {
        target.remapped_from = incoming.remapped_from;
    }
    target.slices.extend(incoming.slices);
    target.async_slices.extend(incoming.async_slices);
}

fn merge_counters(target: &mut Counters, incoming: Counters, conflicts: &mut Vec<RecoverableError>) {
    for counter in incoming.into_values() {
        merge_counter(target, counter, conflicts);
    }
}

/// Append `incoming`'s rows to the counter with the same key. Rows can only
/// be appended when both sides agree on the series. Rows that start before
/// the existing ones end are still appended, with a regression reported.
fn merge_counter(target: &mut Counters, incoming: Counter, conflicts: &mut Vec<RecoverableError>) {
    let Some(existing) = target.get_mut(&incoming.key()) else {
        target.insert(incoming);
        return;
    };

    if existing.num_series() == 0 {
        existing.series_names = incoming.series_names;
        existing.series_colors = incoming.series_colors;
    } else if incoming.num_series() > 0 && existing.series_names != incoming.series_names {
        conflicts.push(RecoverableError::CounterSeriesConflict {
            name: incoming.name,
        });
        return;
    }

    if let (Some(previous), Some(&timestamp)) =
        (existing.last_timestamp(), incoming.timestamps.first())
    {
        if timestamp < previous {
            conflicts.push(RecoverableError::CounterRegression {
                name: incoming.name.clone(),
                previous,
                timestamp,
            });
        }
    }

    existing.timestamps.extend(incoming.timestamps);
    existing.samples.extend(incoming.samples);
}
