//! Deep write protection
//!
//! A frost view refuses every direct write or delete. Nested wrappable
//! values read through it come back as child frost views that share the
//! parent's [`VerificationProtocol`] but hold their own basis token. The
//! only way to change protected storage is [`FrostView::accept`] with a
//! [`VerificationMessage`] carrying the view's basis.

use crate::error::TundraError;
use crate::identity::IdentityCache;
use crate::verification::{BasisToken, VerificationMessage, VerificationProtocol, WriteOp};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use tundra_value::{is_wrappable, AccessError, Key, ObjectId, Shape, Value, View, ViewKind};

pub(crate) struct FrostInner {
    id: ObjectId,
    shape: Shape,
    original: Value,
    basis: BasisToken,
    protocol: Arc<VerificationProtocol>,
    cache: IdentityCache<FrostInner>,
}

impl FrostInner {
    /// Wrap `original`, reusing the tree's wrapper if one is alive
    fn wrap(
        original: Value,
        shape: Shape,
        protocol: &Arc<VerificationProtocol>,
        cache: &IdentityCache<FrostInner>,
    ) -> Arc<Self> {
        let Some(original_id) = original.object_id() else {
            return Self::build(original, shape, protocol, cache);
        };
        cache.get_or_insert_with(original_id, || Self::build(original, shape, protocol, cache))
    }

    fn build(
        original: Value,
        shape: Shape,
        protocol: &Arc<VerificationProtocol>,
        cache: &IdentityCache<FrostInner>,
    ) -> Arc<Self> {
        let id = ObjectId::next();
        let basis = protocol.issue(id);
        Arc::new(Self {
            id,
            shape,
            original,
            basis,
            protocol: Arc::clone(protocol),
            cache: cache.clone(),
        })
    }

    /// Protect a child read from the original
    fn protect(&self, child: Value) -> Value {
        if child.is_view_of(ViewKind::Frost) {
            return child;
        }
        match child.shape() {
            Some(shape) if is_wrappable(&child) => {
                Value::View(Self::wrap(child, shape, &self.protocol, &self.cache))
            }
            _ => child,
        }
    }

    fn refuse(&self, key: &Key, op: &'static str) -> AccessError {
        tracing::warn!(view = %self.id, %key, op, "Refused direct mutation of frosted value");
        AccessError::UnauthorizedMutation { key: key.clone() }
    }
}

impl View for FrostInner {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ViewKind {
        ViewKind::Frost
    }

    fn is_layered(&self, kind: ViewKind) -> bool {
        kind == ViewKind::Frost || self.original.is_view_of(kind)
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn get(&self, key: &Key) -> Option<Value> {
        self.original.get(key).map(|child| self.protect(child))
    }

    fn peek(&self, key: &Key) -> Option<Value> {
        self.original.peek(key).map(|child| self.protect(child))
    }

    fn set(&self, key: Key, _value: Value) -> Result<(), AccessError> {
        Err(self.refuse(&key, "set"))
    }

    fn delete(&self, key: &Key) -> Result<(), AccessError> {
        Err(self.refuse(key, "delete"))
    }

    fn keys(&self) -> Vec<Key> {
        self.original.keys()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Typed handle on a frost view
#[derive(Clone)]
pub struct FrostView(Arc<FrostInner>);

impl FrostView {
    /// Recover the handle when the outermost layer of `value` is frost
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.view_kind() != Some(ViewKind::Frost) {
            return None;
        }
        let any = Arc::clone(value.as_view()?).into_any();
        any.downcast::<FrostInner>().ok().map(Self)
    }

    /// Back into a [`Value`]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::View(self.0)
    }

    /// View identity
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Protected value
    #[must_use]
    pub fn original(&self) -> &Value {
        &self.0.original
    }

    /// Protocol shared by this view's call tree
    #[must_use]
    pub fn protocol(&self) -> &Arc<VerificationProtocol> {
        &self.0.protocol
    }

    pub(crate) fn basis(&self) -> &BasisToken {
        &self.0.basis
    }

    /// Protect `child` under this view's protocol and identity cache
    pub(crate) fn protect(&self, child: Value) -> Value {
        self.0.protect(child)
    }

    /// Apply an authorized write to the protected storage
    ///
    /// Values are stored with their outermost frost layer removed; reads
    /// protect them again.
    ///
    /// # Errors
    /// - [`TundraError::InvalidVerification`] when the token is not this
    ///   view's basis
    /// - [`TundraError::Access`] when the storage refuses the key
    pub fn accept(&self, message: VerificationMessage) -> Result<(), TundraError> {
        let VerificationMessage { key, op, token } = message;
        if !self.0.protocol.verify(&self.0.basis, &token) {
            tracing::warn!(
                view = %self.0.id,
                %key,
                protocol = %self.0.protocol.id(),
                "Rejected verification token"
            );
            return Err(TundraError::InvalidVerification { key });
        }

        match op {
            WriteOp::Set(value) => self.0.original.set(key, defrost(value))?,
            WriteOp::Delete => self.0.original.delete(key)?,
        }
        Ok(())
    }
}

impl Debug for FrostView {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrostView")
            .field("id", &self.0.id)
            .field("basis", &self.0.basis)
            .field("original", &self.0.original)
            .finish()
    }
}

/// Deeply write-protect a value
///
/// Opaque values pass through unchanged.
///
/// # Errors
/// Returns [`TundraError::AlreadyFrosted`] if any layer of `value` is
/// already frost
pub fn frost(value: Value) -> Result<Value, TundraError> {
    if value.is_view_of(ViewKind::Frost) {
        return Err(TundraError::AlreadyFrosted);
    }
    let Some(shape) = value.shape().filter(|_| is_wrappable(&value)) else {
        return Ok(value);
    };
    let protocol = Arc::new(VerificationProtocol::new());
    let root = FrostInner::wrap(value, shape, &protocol, &IdentityCache::new());
    tracing::debug!(view = %root.id, protocol = %protocol.id(), "Frosted value");
    Ok(Value::View(root))
}

/// Remove the outermost frost layer
///
/// Returns the original captured by the frost view, or `value` itself when
/// it is not frosted at the top.
#[must_use]
pub fn defrost(value: Value) -> Value {
    match FrostView::from_value(&value) {
        Some(view) => view.original().clone(),
        None => value,
    }
}
