//! Shared composite storage
//!
//! A [`Node`] is the storage behind every plain record and array. Cloning a
//! node shares it: all clones observe the same body and report the same
//! [`ObjectId`], which is how reference identity is modelled.

use crate::error::AccessError;
use crate::key::Key;
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a node or wrapper view
///
/// Allocated once when the node or view is created and never reused, so it
/// can key identity caches and visited sets in place of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric form
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural shape of a composite value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Insertion-ordered key/value record
    Record,
    /// Index-addressed array
    Array,
}

#[derive(Clone)]
enum Body {
    Record(IndexMap<String, Value>),
    Array(Vec<Value>),
}

struct NodeInner {
    id: ObjectId,
    body: RwLock<Body>,
}

/// Shared record or array storage
///
/// Accessors take the lock only for the duration of one read or write and
/// never call back into other values while holding it, so graphs that point
/// back at themselves do not deadlock.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    fn with_body(body: Body) -> Self {
        Self(Arc::new(NodeInner {
            id: ObjectId::next(),
            body: RwLock::new(body),
        }))
    }

    /// Empty record
    #[must_use]
    pub fn record() -> Self {
        Self::with_body(Body::Record(IndexMap::new()))
    }

    /// Empty array
    #[must_use]
    pub fn array() -> Self {
        Self::with_body(Body::Array(Vec::new()))
    }

    /// Record from ordered entries
    #[must_use]
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::with_body(Body::Record(map))
    }

    /// Array from items
    #[must_use]
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::with_body(Body::Array(items.into_iter().collect()))
    }

    /// Identity of this node
    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Record or array
    #[must_use]
    pub fn shape(&self) -> Shape {
        match &*self.0.body.read() {
            Body::Record(_) => Shape::Record,
            Body::Array(_) => Shape::Array,
        }
    }

    /// Number of entries (array length including holes)
    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.0.body.read() {
            Body::Record(map) => map.len(),
            Body::Array(items) => items.len(),
        }
    }

    /// Whether the node has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles share the same storage
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read one entry
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<Value> {
        match &*self.0.body.read() {
            Body::Record(map) => map.get(&key.to_field()).cloned(),
            Body::Array(items) => key.as_index().and_then(|i| items.get(i).cloned()),
        }
    }

    /// Whether an entry exists for `key`
    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        match &*self.0.body.read() {
            Body::Record(map) => map.contains_key(&key.to_field()),
            Body::Array(items) => key.as_index().is_some_and(|i| i < items.len()),
        }
    }

    /// Write one entry
    ///
    /// Writing past the end of an array pads the gap with
    /// [`Value::Undefined`] holes.
    ///
    /// # Errors
    /// Returns [`AccessError::InvalidKey`] for a non-index key on an array
    pub fn set(&self, key: Key, value: Value) -> Result<(), AccessError> {
        let mut body = self.0.body.write();
        match &mut *body {
            Body::Record(map) => {
                map.insert(key.to_field(), value);
                Ok(())
            }
            Body::Array(items) => {
                let Some(index) = key.as_index() else {
                    return Err(AccessError::InvalidKey {
                        key,
                        shape: Shape::Array,
                    });
                };
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
        }
    }

    /// Remove one entry, returning the previous value
    ///
    /// Record entries are removed preserving the order of the rest. Array
    /// slots become [`Value::Undefined`] holes so later indices do not shift.
    pub fn delete(&self, key: &Key) -> Option<Value> {
        let mut body = self.0.body.write();
        match &mut *body {
            Body::Record(map) => map.shift_remove(&key.to_field()),
            Body::Array(items) => {
                let slot = items.get_mut(key.as_index()?)?;
                Some(std::mem::replace(slot, Value::Undefined))
            }
        }
    }

    /// Keys in storage order
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        match &*self.0.body.read() {
            Body::Record(map) => map.keys().map(|k| Key::parse(k)).collect(),
            Body::Array(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    /// Snapshot of all entries in storage order
    #[must_use]
    pub fn entries(&self) -> Vec<(Key, Value)> {
        match &*self.0.body.read() {
            Body::Record(map) => map
                .iter()
                .map(|(k, v)| (Key::parse(k), v.clone()))
                .collect(),
            Body::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v.clone()))
                .collect(),
        }
    }

    /// Structural copy, memoised by identity
    ///
    /// Each source node is copied once, so shared children stay shared and
    /// cycles are reproduced in the copy instead of recursing forever.
    pub(crate) fn deep_clone_with(&self, memo: &mut HashMap<ObjectId, Node>) -> Node {
        if let Some(done) = memo.get(&self.id()) {
            return done.clone();
        }

        let snapshot = self.0.body.read().clone();
        let copy = match snapshot {
            Body::Record(_) => Node::record(),
            Body::Array(_) => Node::array(),
        };
        memo.insert(self.id(), copy.clone());

        let filled = match snapshot {
            Body::Record(map) => Body::Record(
                map.into_iter()
                    .map(|(k, v)| (k, v.deep_clone_with(memo)))
                    .collect(),
            ),
            Body::Array(items) => Body::Array(
                items
                    .into_iter()
                    .map(|v| v.deep_clone_with(memo))
                    .collect(),
            ),
        };
        *copy.0.body.write() = filled;
        copy
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Node({} {:?} len={})", self.id(), self.shape(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_are_unique() {
        let a = Node::record();
        let b = Node::record();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn record_set_get_delete() {
        let node = Node::record();
        node.set(Key::from("a"), Value::from(1)).unwrap();
        node.set(Key::from("b"), Value::from(2)).unwrap();
        assert_eq!(node.get(&Key::from("a")), Some(Value::from(1)));
        assert_eq!(node.delete(&Key::from("a")), Some(Value::from(1)));
        assert!(!node.contains_key(&Key::from("a")));
        assert_eq!(node.keys(), vec![Key::from("b")]);
    }

    #[test]
    fn numeric_record_fields_use_index_keys() {
        let node = Node::from_entries([("0", Value::from("zero"))]);
        assert_eq!(node.keys(), vec![Key::Index(0)]);
        assert_eq!(node.get(&Key::Index(0)), Some(Value::from("zero")));
    }

    #[test]
    fn array_writes_pad_with_holes() {
        let node = Node::from_items([Value::from(1)]);
        node.set(Key::Index(3), Value::from(4)).unwrap();
        assert_eq!(node.len(), 4);
        assert_eq!(node.get(&Key::Index(2)), Some(Value::Undefined));
    }

    #[test]
    fn array_rejects_named_keys() {
        let node = Node::array();
        let err = node.set(Key::from("name"), Value::Null).unwrap_err();
        assert!(matches!(err, AccessError::InvalidKey { shape: Shape::Array, .. }));
    }

    #[test]
    fn array_delete_leaves_hole() {
        let node = Node::from_items([Value::from(1), Value::from(2)]);
        assert_eq!(node.delete(&Key::Index(0)), Some(Value::from(1)));
        assert_eq!(node.len(), 2);
        assert_eq!(node.get(&Key::Index(0)), Some(Value::Undefined));
        assert_eq!(node.delete(&Key::Index(9)), None);
    }

    #[test]
    fn deep_clone_preserves_sharing_and_cycles() {
        let shared = Node::from_entries([("v", Value::from(1))]);
        let root = Node::from_entries([
            ("left", Value::Node(shared.clone())),
            ("right", Value::Node(shared.clone())),
        ]);
        root.set(Key::from("me"), Value::Node(root.clone())).unwrap();

        let mut memo = HashMap::new();
        let copy = root.deep_clone_with(&mut memo);
        assert!(!copy.ptr_eq(&root));

        let left = copy.get(&Key::from("left")).unwrap();
        let right = copy.get(&Key::from("right")).unwrap();
        assert!(left.is_same(&right));
        assert!(!left.is_same(&Value::Node(shared)));

        let me = copy.get(&Key::from("me")).unwrap();
        assert!(me.is_same(&Value::Node(copy)));
    }
}
