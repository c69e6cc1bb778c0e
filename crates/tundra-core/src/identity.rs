//! Identity cache for lazily wrapped children
//!
//! One cache is created per top-level `sandbox`/`frost` call and shared by
//! every wrapper reachable from that root. Entries are keyed by the wrapped
//! value's [`ObjectId`] and hold weak references, so the cache never keeps a
//! wrapper alive on its own and never leaks identities across call trees.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tundra_value::ObjectId;

/// Shared original-id to wrapper map
pub(crate) struct IdentityCache<W> {
    entries: Arc<Mutex<HashMap<ObjectId, Weak<W>>>>,
}

impl<W> IdentityCache<W> {
    /// Fresh, empty cache for a new call tree
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wrapper previously built for `original`, if it is still alive
    pub(crate) fn get(&self, original: ObjectId) -> Option<Arc<W>> {
        let mut entries = self.entries.lock();
        match entries.get(&original).map(Weak::upgrade) {
            Some(Some(wrapper)) => Some(wrapper),
            Some(None) => {
                entries.remove(&original);
                None
            }
            None => None,
        }
    }

    /// Return the cached wrapper for `original`, building one if needed
    ///
    /// `build` runs without the cache lock held.
    pub(crate) fn get_or_insert_with(
        &self,
        original: ObjectId,
        build: impl FnOnce() -> Arc<W>,
    ) -> Arc<W> {
        if let Some(existing) = self.get(original) {
            return existing;
        }
        let built = build();
        let mut entries = self.entries.lock();
        // Another reader may have raced us; keep whichever landed first.
        if let Some(existing) = entries.get(&original).and_then(Weak::upgrade) {
            return existing;
        }
        entries.insert(original, Arc::downgrade(&built));
        built
    }

    /// Number of live entries
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

impl<W> Clone for IdentityCache<W> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookup_returns_same_wrapper() {
        let cache = IdentityCache::<String>::new();
        let id = ObjectId::next();
        let first = cache.get_or_insert_with(id, || Arc::new("a".to_string()));
        let second = cache.get_or_insert_with(id, || Arc::new("b".to_string()));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, "a");
    }

    #[test]
    fn clones_share_entries() {
        let cache = IdentityCache::<u32>::new();
        let shared = cache.clone();
        let id = ObjectId::next();
        let held = cache.get_or_insert_with(id, || Arc::new(7));
        assert!(Arc::ptr_eq(&shared.get(id).unwrap(), &held));
    }

    #[test]
    fn dropped_wrappers_are_evicted() {
        let cache = IdentityCache::<u32>::new();
        let id = ObjectId::next();
        drop(cache.get_or_insert_with(id, || Arc::new(1)));
        assert!(cache.get(id).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn separate_caches_do_not_share() {
        let a = IdentityCache::<u32>::new();
        let b = IdentityCache::<u32>::new();
        let id = ObjectId::next();
        let _held = a.get_or_insert_with(id, || Arc::new(1));
        assert!(b.get(id).is_none());
    }
}
