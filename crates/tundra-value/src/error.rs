//! Errors raised by value accessors

use crate::key::Key;
use crate::node::Shape;

/// Errors from `set`/`delete` on a value or view
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Direct write or delete on a write-protected view
    #[error("unauthorized mutation of protected key '{key}'")]
    UnauthorizedMutation {
        /// Offending key
        key: Key,
    },

    /// Key cannot address the target shape
    #[error("key '{key}' cannot address a {shape:?}")]
    InvalidKey {
        /// Offending key
        key: Key,
        /// Shape of the target
        shape: Shape,
    },

    /// Mutation attempted on a leaf value
    #[error("cannot mutate opaque {kind} value")]
    Opaque {
        /// Kind name of the leaf
        kind: &'static str,
    },
}

impl AccessError {
    /// Key the error refers to, if any
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::UnauthorizedMutation { key } | Self::InvalidKey { key, .. } => Some(key),
            Self::Opaque { .. } => None,
        }
    }
}
