//! Staged, non-destructive mutation capture
//!
//! A sandbox view records writes and deletes in a flat per-key change-log
//! and never touches the value it wraps. Reads consult the log first, then
//! fall through to the original; wrappable children found that way are
//! wrapped lazily so chained access stages deep changes too.
//!
//! Each view carries its own session id. Every sandbox reachable from one
//! root also shares that root's session id, parameters and identity cache.
//! Children handed out by any read are recorded so writes through them are
//! found again at commit.

use crate::config::{CommitMode, SandboxParams};
use crate::identity::IdentityCache;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;
use tundra_value::{is_wrappable, AccessError, Key, ObjectId, Shape, Value, View, ViewKind};
use uuid::Uuid;

/// Identifier of one staging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate new random session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get inner UUID
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one change-log entry
///
/// `Tombstone` is a marker distinct from every data value, so staging
/// [`Value::Undefined`] is not a deletion.
#[derive(Debug, Clone)]
pub enum Staged {
    /// Added or replaced
    Set(Value),
    /// Deleted
    Tombstone,
}

impl Staged {
    /// Staged value, if any
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Set(value) => Some(value),
            Self::Tombstone => None,
        }
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }
}

/// Snapshot of a session's bookkeeping
#[derive(Debug, Clone)]
pub struct SessionMeta {
    /// Session id of this view
    pub id: SessionId,
    /// Session id of the root the view was opened from
    pub root: SessionId,
    /// Commit mode
    pub mode: CommitMode,
    /// Wrapped value
    pub original: Value,
    /// Change-log of this level, in staging order
    pub changes: Vec<(Key, Staged)>,
}

pub(crate) struct SandboxInner {
    id: ObjectId,
    session: SessionId,
    root: SessionId,
    shape: Shape,
    original: Value,
    params: SandboxParams,
    log: RwLock<IndexMap<Key, Staged>>,
    nested: RwLock<IndexMap<Key, Value>>,
    cache: IdentityCache<SandboxInner>,
}

impl SandboxInner {
    fn wrap(
        original: Value,
        shape: Shape,
        root: Option<SessionId>,
        params: SandboxParams,
        cache: &IdentityCache<SandboxInner>,
    ) -> Arc<Self> {
        let build = || {
            let session = SessionId::new();
            Arc::new(Self {
                id: ObjectId::next(),
                session,
                root: root.unwrap_or(session),
                shape,
                original: original.clone(),
                params,
                log: RwLock::new(IndexMap::new()),
                nested: RwLock::new(IndexMap::new()),
                cache: cache.clone(),
            })
        };
        match original.object_id() {
            Some(original_id) => cache.get_or_insert_with(original_id, build),
            None => build(),
        }
    }

    /// Wrap an eligible value into this session; other values pass through
    fn adopt(&self, value: Value) -> Value {
        if value.view_kind() == Some(ViewKind::Sandbox) {
            return value;
        }
        match value.shape() {
            Some(shape) if is_wrappable(&value) => Value::View(Self::wrap(
                value,
                shape,
                Some(self.root),
                self.params,
                &self.cache,
            )),
            _ => value,
        }
    }

    /// Log lookup; `Some(None)` means the key is staged as absent
    fn staged(&self, key: &Key) -> Option<Option<Value>> {
        let staged = self.log.read().get(key).cloned()?;
        Some(match staged {
            Staged::Set(value) => Some(value),
            Staged::Tombstone => self.hole(key),
        })
    }

    /// Reading an unset slot inside a staged array yields a hole
    fn hole(&self, key: &Key) -> Option<Value> {
        (self.shape == Shape::Array && self.in_bounds(key)).then_some(Value::Undefined)
    }

    /// Wrap a child read from the original and remember it under `key`
    fn hand_out(&self, key: &Key, raw: Value) -> Value {
        let child = self.adopt(raw.clone());
        if !child.is_same(&raw) {
            self.nested.write().insert(key.clone(), child.clone());
        }
        child
    }

    fn in_bounds(&self, key: &Key) -> bool {
        key.as_index().is_some_and(|i| i < self.array_len())
    }

    /// Length an array will have once the log is applied
    fn array_len(&self) -> usize {
        let staged_end = self
            .log
            .read()
            .iter()
            .filter(|(_, s)| !s.is_tombstone())
            .filter_map(|(k, _)| k.as_index())
            .map(|i| i + 1)
            .max()
            .unwrap_or(0);
        self.original.len().max(staged_end)
    }
}

impl View for SandboxInner {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ViewKind {
        ViewKind::Sandbox
    }

    fn is_layered(&self, kind: ViewKind) -> bool {
        kind == ViewKind::Sandbox || self.original.is_view_of(kind)
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn get(&self, key: &Key) -> Option<Value> {
        if let Some(staged) = self.staged(key) {
            return staged;
        }
        match self.original.get(key) {
            Some(raw) => Some(self.hand_out(key, raw)),
            None => self.hole(key),
        }
    }

    fn peek(&self, key: &Key) -> Option<Value> {
        if let Some(staged) = self.staged(key) {
            return staged;
        }
        match self.original.peek(key) {
            Some(raw) => Some(self.hand_out(key, raw)),
            None => self.hole(key),
        }
    }

    fn set(&self, key: Key, value: Value) -> Result<(), AccessError> {
        let value = self.adopt(value);
        self.nested.write().shift_remove(&key);
        tracing::trace!(view = %self.id, session = %self.session, %key, "Staged set");
        self.log.write().insert(key, Staged::Set(value));
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<(), AccessError> {
        self.nested.write().shift_remove(key);
        tracing::trace!(view = %self.id, session = %self.session, %key, "Staged delete");
        self.log.write().insert(key.clone(), Staged::Tombstone);
        Ok(())
    }

    fn keys(&self) -> Vec<Key> {
        if self.shape == Shape::Array {
            return (0..self.array_len()).map(Key::Index).collect();
        }
        let log = self.log.read().clone();
        let mut keys: IndexSet<Key> = self
            .original
            .keys()
            .into_iter()
            .filter(|key| !log.get(key).is_some_and(Staged::is_tombstone))
            .collect();
        keys.extend(
            log.iter()
                .filter(|(_, staged)| !staged.is_tombstone())
                .map(|(key, _)| key.clone()),
        );
        keys.into_iter().collect()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Typed handle on a sandbox view
#[derive(Clone)]
pub struct SandboxView(Arc<SandboxInner>);

impl SandboxView {
    /// Recover the handle when the outermost layer of `value` is a sandbox
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.view_kind() != Some(ViewKind::Sandbox) {
            return None;
        }
        let any = Arc::clone(value.as_view()?).into_any();
        any.downcast::<SandboxInner>().ok().map(Self)
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

    /// Session id of this view; children get their own
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.0.session
    }

    /// Session id shared by every view opened from the same root
    #[must_use]
    pub fn root_session_id(&self) -> SessionId {
        self.0.root
    }

    #[must_use]
    pub fn mode(&self) -> CommitMode {
        self.0.params.mode
    }

    /// Wrapped value; never modified by staging
    #[must_use]
    pub fn original(&self) -> &Value {
        &self.0.original
    }

    /// Change-log of this level, in staging order
    #[must_use]
    pub fn changes(&self) -> Vec<(Key, Staged)> {
        self.0
            .log
            .read()
            .iter()
            .map(|(k, s)| (k.clone(), s.clone()))
            .collect()
    }

    /// Session bookkeeping
    #[must_use]
    pub fn session(&self) -> SessionMeta {
        SessionMeta {
            id: self.0.session,
            root: self.0.root,
            mode: self.0.params.mode,
            original: self.0.original.clone(),
            changes: self.changes(),
        }
    }

    /// Whether this view or any child it has handed out has staged changes
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        let mut visited = HashSet::new();
        self.dirty_with(&mut visited)
    }

    fn dirty_with(&self, visited: &mut HashSet<ObjectId>) -> bool {
        if !visited.insert(self.id()) {
            return false;
        }
        if !self.0.log.read().is_empty() {
            return true;
        }
        self.nested()
            .values()
            .filter_map(Self::from_value)
            .any(|child| child.dirty_with(visited))
    }

    pub(crate) fn log(&self) -> IndexMap<Key, Staged> {
        self.0.log.read().clone()
    }

    /// Children handed out by reads, keyed by where they were read
    pub(crate) fn nested(&self) -> IndexMap<Key, Value> {
        self.0.nested.read().clone()
    }

    #[cfg(test)]
    pub(crate) fn stage_unwrapped(&self, key: Key, value: Value) {
        self.0.log.write().insert(key, Staged::Set(value));
    }
}

impl Debug for SandboxView {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxView")
            .field("id", &self.0.id)
            .field("session", &self.0.session)
            .field("root", &self.0.root)
            .field("mode", &self.0.params.mode)
            .field("changes", &self.0.log.read().len())
            .finish()
    }
}

/// Wrap a value for staged mutation
///
/// Returns `value` unchanged when it is opaque or already a sandbox at the
/// top; in the latter case the existing session keeps its own parameters.
#[must_use]
pub fn sandbox(value: Value, params: SandboxParams) -> Value {
    if value.view_kind() == Some(ViewKind::Sandbox) {
        return value;
    }
    let Some(shape) = value.shape().filter(|_| is_wrappable(&value)) else {
        return value;
    };
    let root = SandboxInner::wrap(value, shape, None, params, &IdentityCache::new());
    tracing::debug!(
        view = %root.id,
        session = %root.session,
        mode = %params.mode,
        "Opened sandbox"
    );
    Value::View(root)
}
