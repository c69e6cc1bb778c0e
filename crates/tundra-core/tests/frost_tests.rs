//! Frost protection and sandbox-over-frost composition

use serde_json::json;
use tundra_core::{cement, defrost, frost, sandbox, FrostView, SandboxParams, TundraError};
use tundra_test_utils::{assert_json, at, init_tracing, nested_fixture, value};
use tundra_value::{AccessError, Key, Value, ViewKind};

#[test]
fn test_direct_writes_are_unauthorized() {
    init_tracing();
    let f = frost(value(json!({"a": 1}))).unwrap();

    assert_eq!(
        f.set("a", 2),
        Err(AccessError::UnauthorizedMutation {
            key: Key::from("a")
        })
    );
    assert!(matches!(
        f.delete("a"),
        Err(AccessError::UnauthorizedMutation { .. })
    ));
    assert_eq!(f.get("a"), Some(Value::from(1)));
}

#[test]
fn test_frost_is_deep() {
    let f = frost(nested_fixture()).unwrap();
    let list = at(&f, "outer.list").unwrap();

    assert_eq!(list.view_kind(), Some(ViewKind::Frost));
    assert!(list.set(0_usize, 9).is_err());
    assert!(at(&f, "outer").unwrap().delete("inner").is_err());
}

#[test]
fn test_children_share_protocol() {
    let f = frost(nested_fixture()).unwrap();
    let root = FrostView::from_value(&f).unwrap();
    let child = FrostView::from_value(&f.get("outer").unwrap()).unwrap();

    assert_eq!(root.protocol().id(), child.protocol().id());
    assert_ne!(root.id(), child.id());
}

#[test]
fn test_frosting_twice_is_an_error() {
    let f = frost(value(json!({}))).unwrap();
    assert_eq!(frost(f.clone()).unwrap_err(), TundraError::AlreadyFrosted);

    let layered = sandbox(f, SandboxParams::default());
    assert_eq!(frost(layered).unwrap_err(), TundraError::AlreadyFrosted);
}

#[test]
fn test_sandbox_over_frost_commits_through_verification() {
    let f = frost(value(json!({"a": 1}))).unwrap();
    let sf = sandbox(f.clone(), SandboxParams::default());

    sf.set("a", 2).unwrap();
    assert_eq!(f.get("a"), Some(Value::from(1)));

    let committed = cement(sf).unwrap();
    assert_eq!(committed.get("a"), Some(Value::from(2)));
    assert_eq!(f.get("a"), Some(Value::from(2)));
    assert!(committed.is_same(&f));
    assert!(f.set("a", 3).is_err());
}

#[test]
fn test_sandbox_over_frost_deep_commit() {
    let f = frost(nested_fixture()).unwrap();
    let sf = sandbox(f.clone(), SandboxParams::default());

    at(&sf, "outer").unwrap().set("inner", 5).unwrap();
    at(&sf, "outer.list").unwrap().delete(2_usize).unwrap();
    sf.delete("flags").unwrap();
    cement(sf).unwrap();

    assert_json(
        &f,
        json!({"name": "tundra", "outer": {"inner": 5, "list": [1, 2, null]}}),
    );
    assert_eq!(at(&f, "outer").unwrap().view_kind(), Some(ViewKind::Frost));
}

#[test]
fn test_defrost_unwraps_one_layer() {
    let original = nested_fixture();
    let f = frost(original.clone()).unwrap();

    assert!(defrost(f).is_same(&original));
    assert!(defrost(original.clone()).is_same(&original));
}

#[test]
fn test_frost_passes_opaque_values() {
    assert_eq!(frost(Value::from(7)).unwrap(), Value::from(7));
}
