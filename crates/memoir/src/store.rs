// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The key to entry mapping behind a memoizer.
//!
//! The store performs no synchronization of its own; [`Guard`](crate::guard::Guard) owns it and
//! decides when it is read or written.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::guard::Entry;
use crate::storage::StorageKind;

pub(crate) struct CacheStore<K, V, S> {
    entries: HashMap<K, Arc<Entry<V>>, S>,
    kind: StorageKind,
}

impl<K, V, S> CacheStore<K, V, S> {
    pub(crate) fn with_capacity_and_hasher(kind: StorageKind, capacity: usize, hasher: S) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, hasher),
            kind,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V, S> CacheStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn get(&self, key: &K) -> Option<Arc<Entry<V>>> {
        self.entries.get(key).map(Arc::clone)
    }

    /// Returns the entry for `key`, adding a vacant one if the key is new.
    ///
    /// An existing entry is never replaced.
    pub(crate) fn get_or_insert_vacant(&mut self, key: K) -> Arc<Entry<V>> {
        let kind = self.kind;
        Arc::clone(self.entries.entry(key).or_insert_with(|| Arc::new(Entry::vacant(kind))))
    }
}
