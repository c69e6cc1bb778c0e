use proptest::prelude::*;
use serde_json::json;
use tundra_value::{classify, Eligibility, Key, Value};

#[test]
fn test_clones_share_storage() {
    let config = Value::from(json!({"db": {"host": "localhost"}}));
    let alias = config.clone();
    alias.get("db").unwrap().set("host", "db.internal").unwrap();

    assert_eq!(
        config.get("db").unwrap().get("host"),
        Some(Value::from("db.internal"))
    );
}

#[test]
fn test_deep_clone_is_distinct_and_equal() {
    let shared = Value::from(json!({"x": 1}));
    let original = Value::record([("a", shared.clone()), ("b", shared)]);
    let copy = original.deep_clone();

    assert_eq!(copy, original);
    assert!(!copy.is_same(&original));
    // Sharing inside the graph survives the copy
    assert!(copy.get("a").unwrap().is_same(&copy.get("b").unwrap()));
    assert!(!copy.get("a").unwrap().is_same(&original.get("a").unwrap()));
}

#[test]
fn test_only_composites_are_wrappable() {
    assert_eq!(classify(&Value::from(json!({}))), Eligibility::PlainRecord);
    assert_eq!(classify(&Value::from(json!([]))), Eligibility::ArrayOfAny);
    assert_eq!(classify(&Value::from(json!(1))), Eligibility::Opaque);
}

proptest! {
    #[test]
    fn prop_index_keys_are_canonical(index in 0_usize..100_000) {
        prop_assert_eq!(Key::parse(&index.to_string()), Key::Index(index));
        prop_assert_eq!(Key::from(index).to_field(), index.to_string());
    }

    #[test]
    fn prop_json_import_export_round_trips(
        items in prop::collection::vec(any::<i32>(), 0..16),
        label in "[a-z]{0,12}",
    ) {
        let source = json!({"label": label, "items": items});
        let value = Value::from(source.clone());
        prop_assert_eq!(value.to_json().unwrap(), source);
    }

    #[test]
    fn prop_fingerprint_ignores_key_order(a in any::<i64>(), b in any::<i64>()) {
        let forward = Value::record([("a", Value::from(a)), ("b", Value::from(b))]);
        let reverse = Value::record([("b", Value::from(b)), ("a", Value::from(a))]);
        prop_assert_eq!(forward.fingerprint().unwrap(), reverse.fingerprint().unwrap());
    }
}
