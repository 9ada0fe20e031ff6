// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Concurrency control for the cache store.
//!
//! Two levels of locking cooperate here:
//!
//! 1. The store itself sits behind a [`RwLock`]. Lookups of known keys take the shared lock only.
//!    A miss takes the upgradable lock, looks the key up again and only then upgrades to insert a
//!    vacant entry, so two threads can never both insert an entry for the same key.
//! 2. Every entry carries a [`ReentrantMutex`]. The check-compute-store sequence for a key runs
//!    while holding it, which serializes computations per key while unrelated keys proceed in
//!    parallel. The same thread may lock it again, so a computation that re-enters the memoizer
//!    for its own key does not deadlock.
//!
//! The store lock is released before any user computation runs.

use std::cell::RefCell;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock, RwLockUpgradableReadGuard};

use crate::storage::{Slot, StorageKind};
use crate::store::CacheStore;

/// A single key's slot together with the lock that serializes its computation.
///
/// The `RefCell` is never borrowed while user code runs, so a re-entrant caller on the same
/// thread always finds it free.
pub(crate) struct Entry<V> {
    slot: ReentrantMutex<RefCell<Slot<V>>>,
}

impl<V> Entry<V> {
    pub(crate) fn vacant(kind: StorageKind) -> Self {
        Self {
            slot: ReentrantMutex::new(RefCell::new(Slot::vacant(kind))),
        }
    }

    /// Blocks until no other thread holds this entry.
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<Slot<V>>> {
        self.slot.lock()
    }
}

pub(crate) struct Guard<K, V, S> {
    store: RwLock<CacheStore<K, V, S>>,
}

impl<K, V, S> Guard<K, V, S> {
    pub(crate) fn new(store: CacheStore<K, V, S>) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.store.read().len()
    }
}

impl<K, V, S> Guard<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Returns the entry for `key` if one exists, under the shared lock.
    pub(crate) fn find(&self, key: &K) -> Option<Arc<Entry<V>>> {
        self.store.read().get(key)
    }

    /// Returns the entry for `key`, inserting a vacant one on first use.
    pub(crate) fn entry(&self, key: &K) -> Arc<Entry<V>>
    where
        K: Clone,
    {
        if let Some(entry) = self.find(key) {
            return entry;
        }

        let store = self.store.upgradable_read();

        // Another thread may have inserted the key between the shared and upgradable locks.
        if let Some(entry) = store.get(key) {
            return entry;
        }

        let mut store = RwLockUpgradableReadGuard::upgrade(store);
        store.get_or_insert_vacant(key.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use ahash::RandomState;

    use super::*;

    fn guard(kind: StorageKind) -> Guard<u32, u32, RandomState> {
        Guard::new(CacheStore::with_capacity_and_hasher(kind, 0, RandomState::new()))
    }

    #[test]
    fn find_does_not_insert() {
        let guard = guard(StorageKind::Permanent);
        assert!(guard.find(&1).is_none());
        assert_eq!(guard.len(), 0);
    }

    #[test]
    fn entry_inserts_once() {
        let guard = guard(StorageKind::Permanent);

        let first = guard.entry(&1);
        let second = guard.entry(&1);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn racing_threads_share_one_entry() {
        const THREADS: usize = 16;

        let guard = guard(StorageKind::Permanent);
        let barrier = Barrier::new(THREADS);

        let entries: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        guard.entry(&7)
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().expect("thread should not panic")).collect()
        });

        assert_eq!(guard.len(), 1);
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
    }

    #[test]
    fn entry_lock_is_reentrant() {
        let guard = guard(StorageKind::Expirable);
        let entry = guard.entry(&3);

        let outer = entry.lock();
        let inner = entry.lock();
        assert!(inner.borrow().contains());
        drop(inner);
        drop(outer);
    }
}
