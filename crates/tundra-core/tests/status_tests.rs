//! Wrap status and detection helpers

use serde_json::json;
use tundra_core::{
    contains_frost, contains_sandbox, frost, is_frost, is_sandbox, sandbox, status, Coverage,
    SandboxParams,
};
use tundra_test_utils::{capture_warnings, init_tracing, nested_fixture, value};
use tundra_value::{Shape, Value, ViewKind};

fn sandboxed_record(v: &Value) -> bool {
    v.view_kind() == Some(ViewKind::Sandbox) && v.shape() == Some(Shape::Record)
}

#[test]
fn test_sandbox_is_fully_wrapped() {
    init_tracing();
    let s = sandbox(nested_fixture(), SandboxParams::default());
    assert!(is_sandbox(&s, Coverage::Every));
    assert!(contains_sandbox(&s));
    assert!(!is_frost(&s, Coverage::Any));
}

#[test]
fn test_plain_values_are_not_wrapped() {
    let plain = nested_fixture();
    assert!(!is_sandbox(&plain, Coverage::Any));
    assert!(!contains_sandbox(&plain));
    assert!(!contains_frost(&plain));
    assert!(!is_sandbox(&Value::from(1), Coverage::Every));
}

#[test]
fn test_frost_detection_reads_through_sandbox() {
    let f = frost(nested_fixture()).unwrap();
    let sf = sandbox(f.clone(), SandboxParams::default());

    assert!(is_frost(&f, Coverage::Every));
    assert!(is_frost(&sf, Coverage::Every));
    assert!(is_sandbox(&sf, Coverage::Every));
    assert!(contains_frost(&sf));
}

#[test]
fn test_partial_wrap_is_reported() {
    let plain = value(json!({"a": {"b": 1}, "c": {}}));
    let frosted_child = frost(plain.get("a").unwrap()).unwrap();
    let mixed = value(json!({"c": {}}));
    mixed.set("a", frosted_child).unwrap();

    let report = status(&mixed, |v| v.is_view_of(ViewKind::Frost), true);
    assert!(!report.root);
    let properties = report.properties.unwrap();
    assert!(properties.some);
    assert!(!properties.every);
    assert!(is_frost(&mixed, Coverage::Any));
    assert!(!is_frost(&mixed, Coverage::Every));
}

#[test]
fn test_partial_wrap_warns_once() {
    let s = sandbox(nested_fixture(), SandboxParams::default());
    let (report, warnings) = capture_warnings(|| status(&s, sandboxed_record, true));

    assert!(report.is_partial());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Partially wrapped"));
}

#[test]
fn test_full_wrap_does_not_warn() {
    let s = sandbox(nested_fixture(), SandboxParams::default());
    let (covered, warnings) = capture_warnings(|| is_sandbox(&s, Coverage::Every));
    assert!(covered);
    assert!(warnings.is_empty());

    let shallow = sandbox(value(json!({"a": {"b": 1}})), SandboxParams::default());
    let (report, warnings) = capture_warnings(|| status(&shallow, sandboxed_record, true));
    assert!(!report.is_partial());
    assert!(warnings.is_empty());
}

#[test]
fn test_unwrapped_root_does_not_warn() {
    let mixed = value(json!({"c": {}}));
    mixed.set("a", frost(value(json!({"b": 1}))).unwrap()).unwrap();
    let (covered, warnings) = capture_warnings(|| is_frost(&mixed, Coverage::Any));
    assert!(covered);
    assert!(warnings.is_empty());
}

#[test]
fn test_inspection_does_not_stage() {
    let s = sandbox(nested_fixture(), SandboxParams::default());
    let _ = status(&s, |v| v.view_kind() == Some(ViewKind::Sandbox), true);
    let view = tundra_core::SandboxView::from_value(&s).unwrap();
    assert!(!view.is_dirty());
    assert!(view.changes().is_empty());
}
