//! Verified write channel for frosted values
//!
//! A [`VerificationProtocol`] is shared by every frost view in one call
//! tree. It issues each view a [`BasisToken`] at construction time. A write
//! reaches a frosted value's storage only when it arrives as a
//! [`VerificationMessage`] carrying that exact token.
//!
//! Tokens are freshly allocated handles compared by allocation, not by the
//! ids they carry, so they cannot be rebuilt from anything observable.

use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tundra_value::{Key, ObjectId, Value};
use uuid::Uuid;

struct TokenHandle {
    id: Uuid,
    protocol: Uuid,
}

/// Unforgeable capability for one frost view's write channel
#[derive(Clone)]
pub struct BasisToken(Arc<TokenHandle>);

impl BasisToken {
    /// Token id, for logs only
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// Id of the protocol that issued this token
    #[inline]
    #[must_use]
    pub fn protocol_id(&self) -> Uuid {
        self.0.protocol
    }
}

impl PartialEq for BasisToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for BasisToken {}

impl Debug for BasisToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BasisToken").field(&self.0.id).finish()
    }
}

/// Token issuer shared across one frost call tree
pub struct VerificationProtocol {
    id: Uuid,
    issued: AtomicU64,
}

impl VerificationProtocol {
    /// Create a protocol for a new top-level `frost` call
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            issued: AtomicU64::new(0),
        }
    }

    /// Protocol id
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tokens issued so far
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Issue the basis token for a newly built frost view
    pub(crate) fn issue(&self, view: ObjectId) -> BasisToken {
        let token = BasisToken(Arc::new(TokenHandle {
            id: Uuid::new_v4(),
            protocol: self.id,
        }));
        self.issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(protocol = %self.id, %view, token = %token.id(), "Issued basis token");
        token
    }

    /// Check a presented token against a view's basis
    #[must_use]
    pub fn verify(&self, basis: &BasisToken, presented: &BasisToken) -> bool {
        basis.protocol_id() == self.id && basis == presented
    }
}

impl Debug for VerificationProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationProtocol")
            .field("id", &self.id)
            .field("issued", &self.issued())
            .finish()
    }
}

/// Write carried by a verification message
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Store a value
    Set(Value),
    /// Remove the entry
    Delete,
}

/// One-shot authorized write
///
/// Consumed by the target frost view, accepted iff `token` is the view's
/// own basis.
#[derive(Debug)]
pub struct VerificationMessage {
    /// Target key
    pub key: Key,
    /// Operation to apply
    pub op: WriteOp,
    /// Presented capability
    pub token: BasisToken,
}

impl VerificationMessage {
    /// Authorized set
    #[must_use]
    pub fn set(key: Key, value: Value, token: BasisToken) -> Self {
        Self {
            key,
            op: WriteOp::Set(value),
            token,
        }
    }

    /// Authorized delete
    #[must_use]
    pub fn delete(key: Key, token: BasisToken) -> Self {
        Self {
            key,
            op: WriteOp::Delete,
            token,
        }
    }
}
