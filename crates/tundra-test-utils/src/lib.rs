//! Testing utilities for the tundra workspace
//!
//! Shared fixtures, strategies, assertions and tracing setup, plus a
//! capturing layer for asserting on emitted warnings.

#![allow(missing_docs)]

use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::json;
use std::fmt;
use std::sync::{Arc, Once};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::{EnvFilter, Registry};
use tundra_core::{sandbox, CommitMode, SandboxParams};
use tundra_value::{Key, Value};

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary
///
/// Honors `RUST_LOG`; defaults to `warn` so partial-wrap diagnostics show up
/// in failing test output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Layer that keeps the message of every `WARN` event
#[derive(Clone, Default)]
pub struct WarningCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl WarningCapture {
    /// Messages captured so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl<S: Subscriber> Layer<S> for WarningCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.messages.lock().push(visitor.message);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Run `f` with a capturing subscriber on this thread
///
/// Returns the closure's result with the warnings it emitted.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let capture = WarningCapture::default();
    let subscriber = Registry::default().with(capture.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, capture.messages())
}

/// Build a value graph from JSON
pub fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Two-level record used across integration tests
pub fn nested_fixture() -> Value {
    value(json!({
        "name": "tundra",
        "outer": {"inner": 1, "list": [1, 2, 3]},
        "flags": {"enabled": true}
    }))
}

/// Sandbox with the given commit mode
pub fn staged(original: &Value, mode: CommitMode) -> Value {
    sandbox(original.clone(), SandboxParams::new().with_mode(mode))
}

/// Read a dotted path such as `"outer.list.1"`
pub fn at(root: &Value, path: &str) -> Option<Value> {
    path.split('.')
        .try_fold(root.clone(), |current, segment| current.get(Key::parse(segment)))
}

/// Assert the JSON export of `actual` equals `expected`
pub fn assert_json(actual: &Value, expected: serde_json::Value) {
    assert_eq!(actual.to_json().unwrap(), expected);
}

/// Record keys that are safe identifiers
pub fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Small nested JSON records
pub fn record_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i32>().prop_map(serde_json::Value::from),
        "[a-z ]{0,8}".prop_map(serde_json::Value::from),
    ];
    let tree = leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map(key_strategy(), inner, 0..4)
            .prop_map(|map| serde_json::Value::Object(map.into_iter().collect()))
    });
    prop::collection::btree_map(key_strategy(), tree, 1..5)
        .prop_map(|map| serde_json::Value::Object(map.into_iter().collect()))
}
