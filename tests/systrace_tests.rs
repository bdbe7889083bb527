use systrace_studio::TraceModel;

const USERLAND_TRACE: &[&str] = &[
    "SurfaceFlinger-4831  [001] ...1 80909.598554: tracing_mark_write: B|4829|onMessageReceived",
    "SurfaceFlinger-4831  [001] ...1 80909.598572: tracing_mark_write: B|4829|handleMessageInvalidate",
    "SurfaceFlinger-4831  [001] ...1 80909.598590: tracing_mark_write: B|4829|latchBuffer",
    "SurfaceFlinger-4831  [001] ...1 80909.598604: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598627: tracing_mark_write: B|4829|latchBuffer",
    "SurfaceFlinger-4831  [001] ...1 80909.598651: tracing_mark_write: B|4829|updateTexImage",
    "SurfaceFlinger-4831  [001] ...1 80909.598675: tracing_mark_write: B|4829|acquireBuffer",
    "SurfaceFlinger-4831  [001] ...1 80909.598695: tracing_mark_write: B|4829|com.android.launcher/com.android.launcher2.Launcher: 0",
    "SurfaceFlinger-4831  [001] ...1 80909.598709: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598733: tracing_mark_write: C|4829|com.android.launcher/com.android.launcher2.Launcher|0",
    "SurfaceFlinger-4831  [001] ...1 80909.598746: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598844: tracing_mark_write: B|4829|releaseBuffer",
    "SurfaceFlinger-4831  [001] ...1 80909.598862: tracing_mark_write: B|4829|com.android.launcher/com.android.launcher2.Launcher: 2",
    "SurfaceFlinger-4831  [001] ...1 80909.598876: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598892: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598925: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598955: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.598988: tracing_mark_write: B|4829|latchBuffer",
    "SurfaceFlinger-4831  [001] ...1 80909.599001: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.599021: tracing_mark_write: B|4829|latchBuffer",
    "SurfaceFlinger-4831  [001] ...1 80909.599036: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.599068: tracing_mark_write: E",
    "SurfaceFlinger-4831  [001] ...1 80909.599087: tracing_mark_write: E",
];

fn import_lines(lines: &[&str]) -> TraceModel {
    TraceModel::from_trace(&lines.join("\n")).unwrap()
}

#[test]
fn test_userland_import() {
    let model = import_lines(USERLAND_TRACE);
    assert!(model.import_errors.is_empty(), "{:?}", model.import_errors);

    let threads = model.get_all_threads();
    assert_eq!(threads.len(), 1);

    let thread = threads[0];
    assert_eq!(thread.pid, 4829);
    assert_eq!(thread.tid, 4831);
    assert_eq!(thread.name.as_deref(), Some("SurfaceFlinger"));
    assert_eq!(thread.slices.len(), 11);

    // Completion order: the innermost slice closes first
    assert_eq!(thread.slices[0].title, "latchBuffer");
    assert_eq!(thread.slices.last().unwrap().title, "onMessageReceived");
}

#[test]
fn test_userland_import_with_trailing_unmatched_end() {
    let mut lines = USERLAND_TRACE.to_vec();
    lines.push("SurfaceFlinger-4831  [001] ...1 80909.599104: tracing_mark_write: E");

    let model = import_lines(&lines);

    assert_eq!(model.import_errors.len(), 1);
    assert!(model.import_errors[0].contains("unmatched end"));
    assert_eq!(model.thread(4829, 4831).unwrap().slices.len(), 11);
}

#[test]
fn test_userland_import_with_spaces_in_thread_name() {
    let model = import_lines(&[
        "Surface Flinger -4831  [001] ...1 80909.598590: tracing_mark_write: B|4829|latchBuffer",
        "Surface Flinger -4831  [001] ...1 80909.598604: tracing_mark_write: E",
    ]);
    assert!(model.import_errors.is_empty());

    let thread = model.thread(4829, 4831).unwrap();
    assert_eq!(thread.name.as_deref(), Some("Surface Flinger "));
    assert_eq!(thread.slices.len(), 1);
}

#[test]
fn test_thread_name_with_hyphens() {
    let model = import_lines(&[
        "binder-thread-2-812  [003] ...1 10.000000: tracing_mark_write: B|800|transact",
        "binder-thread-2-812  [003] ...1 10.001000: tracing_mark_write: E",
    ]);

    let thread = model.thread(800, 812).unwrap();
    assert_eq!(thread.name.as_deref(), Some("binder-thread-2"));
}

#[test]
fn test_legacy_marker_import() {
    let legacy: Vec<String> = USERLAND_TRACE
        .iter()
        .map(|line| line.replace("tracing_mark_write:", "0:"))
        .collect();
    let lines: Vec<&str> = legacy.iter().map(String::as_str).collect();

    let model = import_lines(&lines);

    assert!(model.import_errors.is_empty(), "{:?}", model.import_errors);
    let thread = model.thread(4829, 4831).unwrap();
    assert_eq!(thread.name.as_deref(), Some("SurfaceFlinger"));
    assert_eq!(thread.slices.len(), 11);
}

#[test]
fn test_chromium_style_args_and_categories() {
    let model = import_lines(&[
        "SandboxedProces-2894  [001] ...1   253.780659: tracing_mark_write: B|2867|DoWorkLoop|arg1=1|cat1",
        "SandboxedProces-2894  [001] ...1   253.780671: tracing_mark_write: B|2867|DeferOrRunPendingTask|source=test=test;task=xyz|cat2",
        "SandboxedProces-2894  [001] ...1   253.780671: tracing_mark_write: E|2867|DeferOrRunPendingTask||cat1",
        "SandboxedProces-2894  [001] ...1   253.780686: tracing_mark_write: B|2867|MessageLoop::RunTask|source=ipc/ipc_sync_message_filter.cc:Send|cat2",
        "SandboxedProces-2894  [001] ...1   253.780700: tracing_mark_write: E|2867|MessageLoop::RunTask||cat1",
        "SandboxedProces-2894  [001] ...1   253.780750: tracing_mark_write: C|2867|counter1|10|cat1",
        "SandboxedProces-2894  [001] ...1   253.780859: tracing_mark_write: E|2867|DoWorkLoop|arg2=2|cat2",
    ]);
    assert!(model.import_errors.is_empty(), "{:?}", model.import_errors);

    let threads = model.get_all_threads();
    assert_eq!(threads.len(), 1);
    let thread = threads[0];
    assert_eq!(thread.pid, 2867);
    assert_eq!(thread.tid, 2894);
    assert_eq!(thread.name.as_deref(), Some("SandboxedProces"));
    assert_eq!(thread.slices.len(), 3);

    assert_eq!(thread.slices[0].title, "DeferOrRunPendingTask");
    assert_eq!(thread.slices[0].category, "cat2");
    assert_eq!(thread.slices[0].args["source"], "test=test");
    assert_eq!(thread.slices[0].args["task"], "xyz");
    assert_eq!(
        thread.slices[1].args["source"],
        "ipc/ipc_sync_message_filter.cc:Send"
    );
    assert_eq!(thread.slices[2].args["arg1"], "1");
    assert_eq!(thread.slices[2].args["arg2"], "2");

    let counters = model.get_all_counters();
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].category, "cat1");
    assert_eq!(counters[0].name, "counter1");
    assert_eq!(counters[0].num_samples(), 1);
    assert_eq!(counters[0].get_sample_value(0, 0), Some(10.0));
}

#[test]
fn test_nesting_depth_and_durations() {
    let model = import_lines(&[
        "app-10  [000] 1.000: tracing_mark_write: B|1|outer",
        "app-10  [000] 1.001: tracing_mark_write: B|1|inner",
        "app-10  [000] 1.002: tracing_mark_write: E",
        "app-10  [000] 1.004: tracing_mark_write: E",
    ]);

    let slices = &model.thread(1, 10).unwrap().slices;
    assert_eq!(slices.len(), 2);
    let (inner, outer) = (&slices[0], &slices[1]);
    assert!(outer.contains(inner));
    assert!((outer.start - 1000.0).abs() < 1e-6);
    assert!((outer.duration - 4.0).abs() < 1e-6);
}

#[test]
fn test_async_slice_across_threads() {
    let model = import_lines(&[
        "main-100  [000] 5.000000: tracing_mark_write: S|100|loadImage|42",
        "worker-101  [001] 5.010000: tracing_mark_write: F|100|loadImage|42",
    ]);
    assert!(model.import_errors.is_empty(), "{:?}", model.import_errors);

    let thread = model.thread(100, 100).unwrap();
    assert_eq!(thread.async_slices.len(), 1);
    let slice = &thread.async_slices[0];
    assert_eq!(slice.name, "loadImage");
    assert_eq!(slice.id.as_deref(), Some("42"));
    assert!(slice.is_cross_thread());
    assert!((slice.duration() - 10.0).abs() < 1e-6);
}

#[test]
fn test_unmatched_async_finish() {
    let model = import_lines(&["main-100  [000] 5.000000: tracing_mark_write: F|100|never|1"]);
    assert_eq!(model.import_errors.len(), 1);
    assert!(model.import_errors[0].contains("unmatched async finish"));
}

#[test]
fn test_open_slices_dropped_silently() {
    let model = import_lines(&[
        "app-10  [000] 1.000: tracing_mark_write: B|1|neverClosed",
        "app-10  [000] 1.500: tracing_mark_write: S|1|neverFinished|7",
    ]);

    assert!(model.import_errors.is_empty());
    let thread = model.thread(1, 10).unwrap();
    assert!(thread.slices.is_empty());
    assert!(thread.async_slices.is_empty());
}

#[test]
fn test_counter_cardinality_mismatch_drops_sample() {
    let model = import_lines(&[
        "app-10  [000] 1.000: tracing_mark_write: C|1|mem|1|2",
        "app-10  [000] 2.000: tracing_mark_write: C|1|mem|3",
        "app-10  [000] 3.000: tracing_mark_write: C|1|mem|4|5",
    ]);

    assert_eq!(model.import_errors.len(), 1);
    let counter = model.process(1).unwrap().counter("", "mem").unwrap();
    assert_eq!(counter.num_samples(), 2);
    assert_eq!(counter.timestamps, vec![1000.0, 3000.0]);
}

#[test]
fn test_sched_switch_builds_cpu_slices() {
    let model = import_lines(&[
        "<idle>-0  [000] d..3 1.000000: sched_switch: prev_comm=swapper/0 prev_pid=0 prev_prio=120 prev_state=R ==> next_comm=app next_pid=10 next_prio=120",
        "app-10  [000] d..3 1.002000: sched_switch: prev_comm=app prev_pid=10 prev_prio=120 prev_state=S ==> next_comm=swapper/0 next_pid=0 next_prio=120",
        "<idle>-0  [000] d..3 1.003000: cpu_frequency: state=1500000 cpu_id=0",
    ]);
    assert!(model.import_errors.is_empty(), "{:?}", model.import_errors);

    let cpu = model.cpu(0).unwrap();
    assert_eq!(cpu.slices.len(), 1);
    assert_eq!(cpu.slices[0].title, "app");
    assert!((cpu.slices[0].duration - 2.0).abs() < 1e-6);
    assert_eq!(
        cpu.counter("", "Clock Frequency").unwrap().get_sample_value(0, 0),
        Some(1_500_000.0)
    );
}

#[test]
fn test_tgid_column_resolves_bare_end() {
    let model = import_lines(&[
        "RenderThread-21  ( 20) [002] ...1 3.000000: tracing_mark_write: B|20|draw",
        "RenderThread-21  ( 20) [002] ...1 3.000500: tracing_mark_write: E",
    ]);

    assert!(model.import_errors.is_empty(), "{:?}", model.import_errors);
    assert_eq!(model.thread(20, 21).unwrap().slices.len(), 1);
}

#[test]
fn test_bad_lines_do_not_abort() {
    let model = import_lines(&[
        "this is not systrace",
        "app-10  [000] 1.000: tracing_mark_write: Q|1|what",
        "app-10  [000] 2.000: tracing_mark_write: B|1|fine",
        "app-10  [000] 3.000: tracing_mark_write: E",
    ]);

    assert_eq!(model.import_errors.len(), 2);
    assert_eq!(model.thread(1, 10).unwrap().slices.len(), 1);
}
