//! Commit strategies
//!
//! Provides the [`CommitStrategy`] trait that decides where a commit lands:
//! - [`InPlaceStrategy`]: onto the original itself (`modify`)
//! - [`CopyStrategy`]: onto a structural clone (`copy`), keeping frost
//!   protection on the clone
//!
//! Every target resolved for one root goes through the same [`CloneScope`],
//! so copy-mode targets of nested sandboxes are the very nodes inside the
//! root's clone.

use crate::config::CommitMode;
use crate::error::TundraError;
use crate::frost::{frost, FrostView};
use std::collections::HashMap;
use std::fmt::Debug;
use tundra_value::{CloneMemo, Value};
use uuid::Uuid;

/// Clones made while committing one root
#[derive(Debug, Default)]
pub struct CloneScope {
    memo: CloneMemo,
    /// Fresh frost root per source protocol
    frost_roots: HashMap<Uuid, FrostView>,
}

impl CloneScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes cloned so far
    #[must_use]
    pub fn cloned(&self) -> usize {
        self.memo.len()
    }

    fn clone_raw(&mut self, value: &Value) -> Value {
        value.deep_clone_in(&mut self.memo)
    }

    /// Clone a frost view; children land under the clone of their root
    fn clone_frost(&mut self, view: &FrostView) -> Result<Value, TundraError> {
        let cloned = self.clone_raw(view.original());
        let source = view.protocol().id();
        if let Some(root) = self.frost_roots.get(&source) {
            return Ok(root.protect(cloned));
        }
        let target = frost(cloned)?;
        if let Some(root) = FrostView::from_value(&target) {
            self.frost_roots.insert(source, root);
        }
        Ok(target)
    }
}

/// Target resolution for a commit
pub trait CommitStrategy: Send + Sync + Debug {
    /// Value the change-log is replayed onto
    ///
    /// # Errors
    /// Strategy specific; re-protecting a cloned frost target may fail
    fn resolve_target(&self, original: &Value, scope: &mut CloneScope)
        -> Result<Value, TundraError>;

    /// Strategy name (for logs)
    fn name(&self) -> &'static str;

    /// Whether the committed result is reference-identical to the original
    fn preserves_identity(&self) -> bool;
}

/// Replay onto the original
#[derive(Debug, Clone, Copy, Default)]
pub struct InPlaceStrategy;

impl CommitStrategy for InPlaceStrategy {
    fn resolve_target(
        &self,
        original: &Value,
        _scope: &mut CloneScope,
    ) -> Result<Value, TundraError> {
        Ok(original.clone())
    }

    fn name(&self) -> &'static str {
        "in_place"
    }

    fn preserves_identity(&self) -> bool {
        true
    }
}

/// Replay onto a deep clone of the original
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStrategy;

impl CommitStrategy for CopyStrategy {
    fn resolve_target(
        &self,
        original: &Value,
        scope: &mut CloneScope,
    ) -> Result<Value, TundraError> {
        match FrostView::from_value(original) {
            Some(view) => scope.clone_frost(&view),
            None => Ok(scope.clone_raw(original)),
        }
    }

    fn name(&self) -> &'static str {
        "copy"
    }

    fn preserves_identity(&self) -> bool {
        false
    }
}

impl CommitMode {
    /// Strategy implementing this mode
    #[must_use]
    pub fn strategy(self) -> &'static dyn CommitStrategy {
        match self {
            Self::Modify => &InPlaceStrategy,
            Self::Copy => &CopyStrategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tundra_value::ViewKind;

    #[test]
    fn in_place_returns_the_original() {
        let original = Value::from(json!({"a": 1}));
        let target = InPlaceStrategy
            .resolve_target(&original, &mut CloneScope::new())
            .unwrap();
        assert!(target.is_same(&original));
        assert!(CommitMode::Modify.strategy().preserves_identity());
    }

    #[test]
    fn copy_returns_a_distinct_equal_value() {
        let original = Value::from(json!({"a": {"b": 1}}));
        let target = CopyStrategy
            .resolve_target(&original, &mut CloneScope::new())
            .unwrap();
        assert!(!target.is_same(&original));
        assert_eq!(target, original);
        assert!(!CommitMode::Copy.strategy().preserves_identity());
    }

    #[test]
    fn copy_targets_share_one_clone_per_scope() {
        let original = Value::from(json!({"a": {"b": 1}}));
        let mut scope = CloneScope::new();
        let root = CopyStrategy.resolve_target(&original, &mut scope).unwrap();
        let child = CopyStrategy
            .resolve_target(&original.get("a").unwrap(), &mut scope)
            .unwrap();

        assert!(child.is_same(&root.get("a").unwrap()));
        assert_eq!(scope.cloned(), 2);
    }

    #[test]
    fn copy_keeps_frost_on_the_clone() {
        let raw = Value::from(json!({"a": 1}));
        let protected = frost(raw.clone()).unwrap();
        let target = CopyStrategy
            .resolve_target(&protected, &mut CloneScope::new())
            .unwrap();

        assert_eq!(target.view_kind(), Some(ViewKind::Frost));
        assert!(!target.is_same(&protected));
        let clone = FrostView::from_value(&target).unwrap();
        assert!(!clone.original().is_same(&raw));
        assert!(target.set("a", 2).is_err());
    }

    #[test]
    fn frost_children_land_under_the_cloned_root() {
        let protected = frost(Value::from(json!({"a": {"b": 1}}))).unwrap();
        let mut scope = CloneScope::new();
        let root = CopyStrategy.resolve_target(&protected, &mut scope).unwrap();
        let child = CopyStrategy
            .resolve_target(&protected.get("a").unwrap(), &mut scope)
            .unwrap();

        let root = FrostView::from_value(&root).unwrap();
        let child = FrostView::from_value(&child).unwrap();
        assert!(Arc::ptr_eq(root.protocol(), child.protocol()));
        assert!(child.original().is_same(&root.original().get("a").unwrap()));
    }

    #[test]
    fn names() {
        assert_eq!(CommitMode::Modify.strategy().name(), "in_place");
        assert_eq!(CommitMode::Copy.strategy().name(), "copy");
    }
}
