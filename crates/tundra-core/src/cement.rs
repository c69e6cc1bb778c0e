//! Commit of staged changes
//!
//! `cement` resolves a target for the root sandbox (the original, or a
//! clone in `copy` mode) and replays the change-log onto it. Nested
//! sandboxes are committed depth first and written back in place. Writes
//! onto frost-protected targets go through the verified channel.
//!
//! Each sandbox's target is recorded before its log is replayed, so a cycle
//! that leads back to a sandbox in progress resolves to that target instead
//! of recursing. Sandboxes opened from one root resolve their targets through
//! one clone scope. A failure part way through leaves the keys already
//! written.

use crate::config::CementOptions;
use crate::error::TundraError;
use crate::frost::FrostView;
use crate::sandbox::{SandboxView, SessionId, Staged};
use crate::status::status;
use crate::strategy::CloneScope;
use crate::verification::VerificationMessage;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use tundra_value::{Key, ObjectId, Value, ViewKind};

/// Commit a sandbox with default options
///
/// Values that are not a sandbox at the top are returned unchanged.
///
/// # Errors
/// - [`TundraError::InvalidVerification`] or [`TundraError::Access`] when a
///   replayed write is refused
/// - [`TundraError::DepthExceeded`] when nesting passes the default limit
pub fn cement(value: Value) -> Result<Value, TundraError> {
    cement_with(value, &CementOptions::default())
}

/// Commit a sandbox with explicit options
///
/// # Errors
/// See [`cement`]
pub fn cement_with(value: Value, options: &CementOptions) -> Result<Value, TundraError> {
    let Some(view) = SandboxView::from_value(&value) else {
        return Ok(value);
    };

    let mut context = CementContext::new(options);
    let target = context.commit(&view, 0)?;
    if holds_sandbox(&target) {
        tracing::debug!(session = %view.session_id(), "Settling sandboxes left in committed graph");
        context.settle(&target, &mut HashSet::new())?;
    }

    tracing::debug!(
        session = %view.session_id(),
        mode = %view.mode(),
        committed = context.resolved.len(),
        "Cemented sandbox"
    );
    Ok(target)
}

struct CementContext<'a> {
    options: &'a CementOptions,
    resolved: HashMap<ObjectId, Value>,
    scopes: HashMap<SessionId, CloneScope>,
}

impl<'a> CementContext<'a> {
    fn new(options: &'a CementOptions) -> Self {
        Self {
            options,
            resolved: HashMap::new(),
            scopes: HashMap::new(),
        }
    }

    /// Commit one sandbox and return its target
    fn commit(&mut self, view: &SandboxView, depth: usize) -> Result<Value, TundraError> {
        if let Some(done) = self.resolved.get(&view.id()) {
            return Ok(done.clone());
        }
        if depth > self.options.max_depth {
            return Err(TundraError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        let strategy = view.mode().strategy();
        let scope = self.scopes.entry(view.root_session_id()).or_default();
        let target = strategy.resolve_target(view.original(), scope)?;
        self.resolved.insert(view.id(), target.clone());

        let log = view.log();
        let nested = view.nested();
        tracing::trace!(
            view = %view.id(),
            strategy = strategy.name(),
            depth,
            changes = log.len(),
            "Replaying change-log"
        );

        let mut keys: IndexSet<Key> = target.keys().into_iter().collect();
        keys.extend(log.keys().cloned());
        keys.extend(nested.keys().cloned());

        for key in keys {
            match log.get(&key) {
                Some(Staged::Tombstone) => write(&target, key, None)?,
                Some(Staged::Set(value)) => {
                    let value = self.finalize(value, depth)?;
                    write(&target, key, Some(value))?;
                }
                None => {
                    let child = nested
                        .get(&key)
                        .and_then(SandboxView::from_value)
                        .filter(SandboxView::is_dirty)
                        .or_else(|| {
                            let raw = raw_entry(&target, &key)?;
                            SandboxView::from_value(&raw)
                        });
                    if let Some(child) = child {
                        let committed = self.commit(&child, depth + 1)?;
                        write(&target, key, Some(committed))?;
                    }
                }
            }
        }
        Ok(target)
    }

    /// Commit a staged value if it is itself a sandbox
    fn finalize(&mut self, value: &Value, depth: usize) -> Result<Value, TundraError> {
        match SandboxView::from_value(value) {
            Some(view) => self.commit(&view, depth + 1),
            None => Ok(value.clone()),
        }
    }

    /// Commit every sandbox still stored somewhere under `container`
    fn settle(
        &mut self,
        container: &Value,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<(), TundraError> {
        let Some(id) = container.object_id() else {
            return Ok(());
        };
        if !visited.insert(id) {
            return Ok(());
        }

        let frosted = FrostView::from_value(container).is_some();
        for (key, raw) in storage_of(container).entries() {
            if let Some(view) = SandboxView::from_value(&raw) {
                let committed = self.commit(&view, 1)?;
                write(container, key, Some(committed))?;
            } else if raw.as_node().is_some() || FrostView::from_value(&raw).is_some() {
                // Frost children must be revisited through their own view so
                // write-backs carry the right basis.
                let next = if frosted { container.peek(&key) } else { Some(raw) };
                if let Some(next) = next {
                    self.settle(&next, visited)?;
                }
            }
        }
        Ok(())
    }
}

/// Whether a sandbox is reachable below `target`
///
/// Looks through frost layers, which re-wrap stored sandboxes on read.
fn holds_sandbox(target: &Value) -> bool {
    status(target, |v| v.is_view_of(ViewKind::Sandbox), true)
        .properties
        .is_some_and(|p| p.some)
}

/// Storage behind a target: the protected value for frost, else itself
fn storage_of(target: &Value) -> Value {
    match FrostView::from_value(target) {
        Some(view) => view.original().clone(),
        None => target.clone(),
    }
}

fn raw_entry(target: &Value, key: &Key) -> Option<Value> {
    storage_of(target).peek(key)
}

/// Write onto a commit target; `None` deletes
fn write(target: &Value, key: Key, value: Option<Value>) -> Result<(), TundraError> {
    if let Some(view) = FrostView::from_value(target) {
        let token = view.basis().clone();
        let message = match value {
            Some(value) => VerificationMessage::set(key, value, token),
            None => VerificationMessage::delete(key, token),
        };
        return view.accept(message);
    }
    match value {
        Some(value) => target.set(key, value)?,
        None => target.delete(key)?,
    }
    Ok(())
}
