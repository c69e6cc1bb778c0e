//! The value type
//!
//! [`Value`] is a cheap-to-clone handle. Leaves are held by value or behind
//! shared pointers; records and arrays are shared [`Node`]s; wrapper layers
//! are shared [`View`]s. Cloning never copies a composite, so identity is
//! preserved across clones and [`Value::is_same`] can answer "same object?".

use crate::error::AccessError;
use crate::key::Key;
use crate::node::{Node, ObjectId, Shape};
use crate::opaque::{Binary, Callable, ErrorValue, Pending};
use crate::view::{View, ViewKind};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_json::Number;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Original node id to its copy, shared across [`Value::deep_clone_in`] calls
#[derive(Debug, Default)]
pub struct CloneMemo(HashMap<ObjectId, Node>);

impl CloneMemo {
    /// Empty memo
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy made for the node `original`, if any
    #[must_use]
    pub fn copy_of(&self, original: ObjectId) -> Option<Value> {
        self.0.get(&original).cloned().map(Value::Node)
    }

    /// Number of nodes copied
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A node in a value graph
#[derive(Clone, Default)]
pub enum Value {
    /// Absent / undefined (distinct from `Null`)
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Temporal value
    Timestamp(DateTime<Utc>),
    /// Pattern-matching value
    Pattern(Regex),
    /// Key-keyed collection built-in
    Map(Arc<IndexMap<String, Value>>),
    /// Unique-item collection built-in
    Set(Arc<IndexSet<String>>),
    /// Binary buffer or typed view over one
    Binary(Binary),
    /// Pending computation
    Pending(Pending),
    Callable(Callable),
    Error(ErrorValue),
    /// Plain record or array
    Node(Node),
    /// Wrapper layer over a record or array
    View(Arc<dyn View>),
}

impl Value {
    /// Record from ordered entries
    #[must_use]
    pub fn record<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Node(Node::from_entries(entries))
    }

    /// Array from items
    #[must_use]
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Node(Node::from_items(items))
    }

    /// Short name of the variant, for diagnostics
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Pattern(_) => "pattern",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Binary(_) => "binary",
            Self::Pending(_) => "pending",
            Self::Callable(_) => "callable",
            Self::Error(_) => "error",
            Self::Node(node) => match node.shape() {
                Shape::Record => "record",
                Shape::Array => "array",
            },
            Self::View(view) => match view.kind() {
                ViewKind::Sandbox => "sandbox",
                ViewKind::Frost => "frost",
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Plain node, if this is an unwrapped record or array
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Wrapper view, if this is one
    #[must_use]
    pub fn as_view(&self) -> Option<&Arc<dyn View>> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }

    /// Outermost wrapper kind
    #[must_use]
    pub fn view_kind(&self) -> Option<ViewKind> {
        self.as_view().map(|view| view.kind())
    }

    /// Whether any wrapper layer of this value is of `kind`
    #[must_use]
    pub fn is_view_of(&self, kind: ViewKind) -> bool {
        self.as_view().is_some_and(|view| view.is_layered(kind))
    }

    /// Shape of a record, array or view over one
    #[must_use]
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Self::Node(node) => Some(node.shape()),
            Self::View(view) => Some(view.shape()),
            _ => None,
        }
    }

    /// Identity of a node or view
    #[must_use]
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Node(node) => Some(node.id()),
            Self::View(view) => Some(view.object_id()),
            _ => None,
        }
    }

    /// Reference identity
    ///
    /// Composites and shared built-ins compare by allocation; scalars compare
    /// by value.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(_) | Self::View(_), Self::Node(_) | Self::View(_)) => {
                self.object_id() == other.object_id()
            }
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Set(a), Self::Set(b)) => Arc::ptr_eq(a, b),
            (Self::Pending(a), Self::Pending(b)) => a.ptr_eq(b),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Error(a), Self::Error(b)) => a.ptr_eq(b),
            _ => self == other,
        }
    }

    /// Read one entry
    ///
    /// Leaves have no entries.
    #[must_use]
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        match self {
            Self::Node(node) => node.get(&key),
            Self::View(view) => view.get(&key),
            _ => None,
        }
    }

    /// Read one entry without staging anything through wrapper layers
    #[must_use]
    pub fn peek(&self, key: &Key) -> Option<Value> {
        match self {
            Self::Node(node) => node.get(key),
            Self::View(view) => view.peek(key),
            _ => None,
        }
    }

    /// Write one entry
    ///
    /// # Errors
    /// - [`AccessError::Opaque`] on leaves
    /// - [`AccessError::InvalidKey`] for a named key on an array
    /// - [`AccessError::UnauthorizedMutation`] on write-protected views
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), AccessError> {
        let (key, value) = (key.into(), value.into());
        match self {
            Self::Node(node) => node.set(key, value),
            Self::View(view) => view.set(key, value),
            _ => Err(AccessError::Opaque {
                kind: self.kind_name(),
            }),
        }
    }

    /// Delete one entry
    ///
    /// # Errors
    /// - [`AccessError::Opaque`] on leaves
    /// - [`AccessError::UnauthorizedMutation`] on write-protected views
    pub fn delete(&self, key: impl Into<Key>) -> Result<(), AccessError> {
        let key = key.into();
        match self {
            Self::Node(node) => {
                node.delete(&key);
                Ok(())
            }
            Self::View(view) => view.delete(&key),
            _ => Err(AccessError::Opaque {
                kind: self.kind_name(),
            }),
        }
    }

    /// Visible keys; empty for leaves
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Self::Node(node) => node.keys(),
            Self::View(view) => view.keys(),
            _ => Vec::new(),
        }
    }

    /// Whether `key` is visible
    #[must_use]
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        match self {
            Self::Node(node) => node.contains_key(&key),
            Self::View(view) => view.peek(&key).is_some(),
            _ => false,
        }
    }

    /// Number of visible keys
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Node(node) => node.len(),
            Self::View(view) => view.keys().len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of visible entries, read through [`Value::peek`]
    #[must_use]
    pub fn entries(&self) -> Vec<(Key, Value)> {
        match self {
            Self::Node(node) => node.entries(),
            Self::View(view) => view
                .keys()
                .into_iter()
                .filter_map(|key| view.peek(&key).map(|v| (key, v)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Structural deep clone
    ///
    /// Every reachable plain node is copied once; shared children stay
    /// shared and cycles are reproduced. Leaves and wrapper views are kept by
    /// reference.
    #[must_use]
    pub fn deep_clone(&self) -> Value {
        let mut memo = HashMap::new();
        self.deep_clone_with(&mut memo)
    }

    /// Deep clone that reuses copies already recorded in `memo`
    ///
    /// Nodes cloned earlier through the same memo are not copied again, so
    /// several clones taken from one graph keep sharing each other's nodes.
    #[must_use]
    pub fn deep_clone_in(&self, memo: &mut CloneMemo) -> Value {
        self.deep_clone_with(&mut memo.0)
    }

    pub(crate) fn deep_clone_with(&self, memo: &mut HashMap<ObjectId, Node>) -> Value {
        match self {
            Self::Node(node) => Self::Node(node.deep_clone_with(memo)),
            other => other.clone(),
        }
    }
}

impl PartialEq for Value {
    /// Deep structural equality
    ///
    /// Records compare regardless of key order; views compare by what they
    /// present. Not cycle-safe.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Pending(a), Self::Pending(b)) => a.ptr_eq(b),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Error(a), Self::Error(b)) => a.ptr_eq(b),
            (Self::Node(_) | Self::View(_), Self::Node(_) | Self::View(_)) => {
                composite_eq(self, other)
            }
            _ => false,
        }
    }
}

fn composite_eq(a: &Value, b: &Value) -> bool {
    if a.object_id() == b.object_id() {
        return true;
    }
    if a.shape() != b.shape() {
        return false;
    }
    let keys = a.keys();
    keys.len() == b.keys().len() && keys.iter().all(|key| a.peek(key) == b.peek(key))
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Timestamp(t) => write!(f, "Timestamp({})", t.to_rfc3339()),
            Self::Pattern(p) => write!(f, "Pattern({:?})", p.as_str()),
            Self::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Self::Set(s) => f.debug_set().entries(s.iter()).finish(),
            Self::Binary(b) => write!(f, "{b:?}"),
            Self::Pending(p) => write!(f, "{p:?}"),
            Self::Callable(c) => write!(f, "{c:?}"),
            Self::Error(e) => write!(f, "{e:?}"),
            Self::Node(n) => write!(f, "{n:?}"),
            Self::View(v) => write!(f, "View({} {})", v.kind(), v.object_id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no number form and become `Null`
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl From<Regex> for Value {
    fn from(p: Regex) -> Self {
        Self::Pattern(p)
    }
}

impl From<Binary> for Value {
    fn from(b: Binary) -> Self {
        Self::Binary(b)
    }
}

impl From<Pending> for Value {
    fn from(p: Pending) -> Self {
        Self::Pending(p)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Self::Callable(c)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Self::Error(e)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Value {
        Value::record([
            ("a", Value::from(1)),
            ("outer", Value::record([("inner", Value::from(1))])),
        ])
    }

    #[test]
    fn clones_share_identity() {
        let x = sample();
        let y = x.clone();
        assert!(x.is_same(&y));
        y.set("a", 2).unwrap();
        assert_eq!(x.get("a"), Some(Value::from(2)));
    }

    #[test]
    fn deep_clone_is_equal_but_distinct() {
        let x = sample();
        let copy = x.deep_clone();
        assert_eq!(copy, x);
        assert!(!copy.is_same(&x));
        assert!(!copy.get("outer").unwrap().is_same(&x.get("outer").unwrap()));

        copy.get("outer").unwrap().set("inner", 5).unwrap();
        assert_eq!(x.get("outer").unwrap().get("inner"), Some(Value::from(1)));
    }

    #[test]
    fn shared_memo_keeps_sharing_across_clones() {
        let x = sample();
        let mut memo = CloneMemo::new();
        let whole = x.deep_clone_in(&mut memo);
        let part = x.get("outer").unwrap().deep_clone_in(&mut memo);

        assert!(part.is_same(&whole.get("outer").unwrap()));
        let outer_id = x.get("outer").unwrap().object_id().unwrap();
        assert!(memo.copy_of(outer_id).unwrap().is_same(&part));
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn record_equality_ignores_key_order() {
        let a = Value::record([("x", Value::from(1)), ("y", Value::from(2))]);
        let b = Value::record([("y", Value::from(2)), ("x", Value::from(1))]);
        assert_eq!(a, b);
        assert_ne!(a, Value::record([("x", Value::from(1))]));
    }

    #[test]
    fn undefined_and_null_differ() {
        assert_ne!(Value::Undefined, Value::Null);
        assert!(Value::default().is_undefined());
    }

    #[test]
    fn leaves_refuse_mutation() {
        let err = Value::from(42).set("a", 1).unwrap_err();
        assert_eq!(err, AccessError::Opaque { kind: "number" });
        assert!(Value::from("s").delete("a").is_err());
        assert_eq!(Value::from(true).get("a"), None);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
    }

    #[test]
    fn shared_builtins_compare_by_identity() {
        let map = Value::Map(Arc::new(IndexMap::new()));
        assert!(map.is_same(&map.clone()));
        assert!(!map.is_same(&Value::Map(Arc::new(IndexMap::new()))));
        assert!(Value::from(3).is_same(&Value::from(3)));
    }
}
