//! Concurrent compute-once map.
//!
//! Each key owns a `OnceLock` cell. The shard lock is held only long enough
//! to find or insert the cell; the computation runs outside it, so callers
//! on unrelated keys never wait on each other, and callers racing on the
//! same new key block on that key's cell until the first one finishes.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

pub(crate) struct OnceMap<K, V> {
    cells: DashMap<K, Arc<OnceLock<V>>, FxBuildHasher>,
}

impl<K: Eq + Hash + Clone, V: Clone> OnceMap<K, V> {
    pub(crate) fn new() -> Self {
        OnceMap {
            cells: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// The value for `key`, running `init` if no caller has yet.
    pub(crate) fn get_or_init<Q>(&self, key: &Q, init: impl FnOnce() -> V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        // Fast path: the cell exists.
        let cell = match self.cells.get(key) {
            Some(cell) => Arc::clone(cell.value()),
            None => Arc::clone(self.cells.entry(key.to_owned()).or_default().value()),
        };
        cell.get_or_init(init).clone()
    }

    /// The value for `key`, if it has been computed.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cells.get(key)?.value().get().cloned()
    }

    /// Keys whose value has been computed.
    pub(crate) fn keys(&self) -> Vec<K> {
        self.cells
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn clear(&self) {
        self.cells.clear();
    }
}
