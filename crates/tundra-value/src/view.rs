//! Wrapper view seam
//!
//! [`View`] is the explicit accessor interface that stands in for transparent
//! property interception. Wrapper layers (staging, write protection) live in
//! other crates and plug into [`Value::View`](crate::Value::View) through it.

use crate::error::AccessError;
use crate::key::Key;
use crate::node::{ObjectId, Shape};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Kind of wrapper layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Staged, non-destructive mutation capture
    Sandbox,
    /// Deep write protection
    Frost,
}

impl Display for ViewKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => f.write_str("sandbox"),
            Self::Frost => f.write_str("frost"),
        }
    }
}

/// Accessor interface implemented by wrapper layers
///
/// # Contract
/// - `get` may materialize and remember lazily wrapped children
/// - `peek` answers the same question and never stages a change; children
///   it hands out are remembered like those from `get`
/// - `keys` lists what `get` would find, in a stable order
/// - `object_id` is allocated once per view and never shared with the
///   wrapped value
pub trait View: Send + Sync {
    /// Identity of this view
    fn object_id(&self) -> ObjectId;

    /// Outermost layer kind
    fn kind(&self) -> ViewKind;

    /// Whether this view, or any view it wraps, is of `kind`
    fn is_layered(&self, kind: ViewKind) -> bool;

    /// Shape of the wrapped composite
    fn shape(&self) -> Shape;

    /// Read one entry
    fn get(&self, key: &Key) -> Option<Value>;

    /// Read one entry without staging anything
    fn peek(&self, key: &Key) -> Option<Value>;

    /// Write one entry
    ///
    /// # Errors
    /// Layer specific; write-protected layers refuse every direct write
    fn set(&self, key: Key, value: Value) -> Result<(), AccessError>;

    /// Delete one entry
    ///
    /// # Errors
    /// Layer specific; write-protected layers refuse every direct delete
    fn delete(&self, key: &Key) -> Result<(), AccessError>;

    /// Visible keys
    fn keys(&self) -> Vec<Key>;

    /// Upcast for recovering the concrete layer type
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
