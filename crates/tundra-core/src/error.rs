//! Error types for tundra core
//!
//! Provides error handling for:
//! - Frosting values that are already frosted
//! - Refused writes on frosted views
//! - Token mismatches on the verified write channel
//! - Commit recursion limits

use tundra_value::{AccessError, Key};

/// Main tundra error type
///
/// Staged writes on a sandbox never fail; every variant here comes from
/// frost protection, verification or commit replay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TundraError {
    /// Frosting a value that already carries a frost layer
    #[error("value is already frosted")]
    AlreadyFrosted,

    /// Verified write presented a token that is not the view's basis
    #[error("invalid verification for key '{key}'")]
    InvalidVerification {
        /// Key the write targeted
        key: Key,
    },

    /// Nested commit recursion went past the configured limit
    #[error("commit depth exceeded limit of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Accessor failure (including unauthorized direct mutation)
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl TundraError {
    /// Check if the error is an authorization failure
    #[inline]
    #[must_use]
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidVerification { .. }
                | Self::Access(AccessError::UnauthorizedMutation { .. })
        )
    }

    /// Key the error refers to, if any
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::InvalidVerification { key } => Some(key),
            Self::Access(inner) => inner.key(),
            Self::AlreadyFrosted | Self::DepthExceeded { .. } => None,
        }
    }
}
