use pretty_assertions::assert_eq;
use serde_json::json;
use systrace_studio::output::{model_from_str, model_to_string, read_model, write_model, ModelDocument};
use systrace_studio::utils::config::SCHEMA_VERSION;
use systrace_studio::TraceModel;
use tempfile::NamedTempFile;

fn populated_model() -> TraceModel {
    let systrace = "\
app-10  ( 1) [000] ...1 1.000000: tracing_mark_write: B|1|outer|k=v|cat
app-10  ( 1) [000] ...1 1.001000: tracing_mark_write: B|1|inner
app-10  ( 1) [000] ...1 1.002000: tracing_mark_write: E
app-10  ( 1) [000] ...1 1.003000: tracing_mark_write: E
app-10  ( 1) [000] ...1 1.004000: tracing_mark_write: C|1|mem|heap=1.5|stack=2
app-10  ( 1) [000] ...1 1.005000: tracing_mark_write: S|1|load|7
bg-11   ( 1) [001] ...1 1.009000: tracing_mark_write: F|1|load|7
<idle>-0 [002] d..3 1.000000: sched_switch: prev_comm=swapper/2 prev_pid=0 prev_prio=120 prev_state=R ==> next_comm=app next_pid=10 next_prio=120
app-10 [002] d..3 1.010000: sched_switch: prev_comm=app prev_pid=10 prev_prio=120 prev_state=S ==> next_comm=swapper/2 next_pid=0 next_prio=120
garbage line
";
    let events = json!({
        "traceEvents": [
            {"name": "process_name", "ph": "M", "pid": 1, "args": {"name": "app"}},
            {"name": "draw", "ph": "X", "pid": 1, "tid": 12, "ts": 1000.25, "dur": 3,
             "cat": "gfx", "args": {"frame": {"id_ref": "0x1"}}}
        ],
        "systemTraceEvents": systrace,
    })
    .to_string();

    TraceModel::from_trace(&events).unwrap()
}

#[test]
fn test_model_round_trips_through_string() {
    let model = populated_model();
    assert!(!model.import_errors.is_empty());
    assert!(model.bounds.is_some());

    let json = model_to_string(&model).unwrap();
    let parsed = model_from_str(&json).unwrap();

    assert_eq!(parsed, model);
}

#[test]
fn test_model_round_trips_through_file() {
    let model = populated_model();
    let temp_file = NamedTempFile::new().unwrap();

    write_model(&model, temp_file.path()).unwrap();
    let document = read_model(temp_file.path()).unwrap();

    assert_eq!(document.version, SCHEMA_VERSION);
    assert!(!document.generated_at.is_empty());
    assert_eq!(document.model, model);
}

#[test]
fn test_document_envelope() {
    let document = ModelDocument::new(populated_model());
    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(value["version"], SCHEMA_VERSION);
    assert!(value["model"]["processes"]["1"]["threads"]["10"].is_object());
    assert!(value["model"]["processes"]["1"]["counters"].is_array());
}

#[test]
fn test_import_state_is_not_serialized() {
    let json = model_to_string(&populated_model()).unwrap();
    assert!(!json.contains("stacks"));
    assert!(!json.contains("pending"));
}

#[test]
fn test_non_finite_values_do_not_break_round_trip() {
    let systrace = "\
app-10  ( 1) [000] ...1 1.000000: tracing_mark_write: C|1|mem|NaN
app-10  ( 1) [000] ...1 1.001000: tracing_mark_write: C|1|mem|inf
app-10  ( 1) [000] ...1 1.002000: tracing_mark_write: C|1|mem|4
app-10  ( 1) [000] ...1 1.003000: tracing_mark_write: X|1|draw|inf
";
    let model = TraceModel::from_trace(systrace).unwrap();

    assert_eq!(model.import_errors.len(), 3);
    let counter = model.process(1).unwrap().counter("", "mem").unwrap();
    assert_eq!(counter.samples, vec![4.0]);
    assert!(model.bounds.unwrap().max.is_finite());

    let parsed = model_from_str(&model_to_string(&model).unwrap()).unwrap();
    assert_eq!(parsed, model);
}
