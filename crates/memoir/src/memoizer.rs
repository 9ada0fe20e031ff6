// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The memoizer and its lookup path.

use std::convert::Infallible;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;
use tracing::{Level, event};

use crate::builder::MemoizerBuilder;
use crate::guard::Guard;
use crate::storage::StorageKind;

/// The wrapped computation. It receives the memoizer itself so recursive computations can call
/// back into it.
pub(crate) type Computation<K, V, E, S> = dyn Fn(&Memoizer<K, V, E, S>, &K) -> Result<V, E> + Send + Sync;

/// A thread-safe cache in front of a computation.
///
/// Each distinct key is computed on first request and the result is stored according to the
/// memoizer's [`StorageKind`]:
///
/// - [`StorageKind::Permanent`] keeps every value until the memoizer is dropped. The computation
///   runs at most once per key, no matter how many threads ask for it concurrently.
/// - [`StorageKind::Expirable`] holds values weakly. A value lives as long as some caller holds
///   the returned [`Arc`]; once the last one is dropped the next request recomputes it.
///
/// Concurrent requests for a key that is being computed block until the computation finishes and
/// then share its result. Requests for different keys do not wait on each other. If the
/// computation fails, the error is returned to the caller, nothing is cached and the next request
/// tries again.
///
/// # Examples
///
/// ```
/// use memoir::Memoizer;
///
/// let square = Memoizer::new(|n: &u64| n * n);
///
/// assert_eq!(*square.get_or_compute(12), 144);
/// assert!(square.contains(&12));
/// ```
///
/// Recursive computations receive the memoizer as their first argument:
///
/// ```
/// use memoir::{Memoizer, StorageKind};
///
/// let fib = Memoizer::recursive(StorageKind::Permanent, |fib, n: &u64| {
///     if *n < 2 { *n } else { *fib.get_or_compute(n - 1) + *fib.get_or_compute(n - 2) }
/// });
///
/// assert_eq!(*fib.get_or_compute(50), 12_586_269_025);
/// ```
pub struct Memoizer<K, V, E = Infallible, S = RandomState> {
    guard: Guard<K, V, S>,
    compute: Box<Computation<K, V, E, S>>,
    kind: StorageKind,
    name: Option<&'static str>,
}

impl<K, V> Memoizer<K, V> {
    /// Creates a permanent memoizer for `computation`.
    #[must_use]
    pub fn new<F>(computation: F) -> Self
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        Self::with_kind(StorageKind::Permanent, computation)
    }

    /// Creates an expirable memoizer for `computation`.
    #[must_use]
    pub fn expirable<F>(computation: F) -> Self
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        Self::with_kind(StorageKind::Expirable, computation)
    }

    /// Creates a memoizer for `computation` with the given storage kind.
    ///
    /// Pass `StorageKind::from(expirable)` to select the kind from a flag.
    #[must_use]
    pub fn with_kind<F>(kind: StorageKind, computation: F) -> Self
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        Self::builder().kind(kind).build(computation)
    }

    /// Creates a memoizer whose computation can call back into the memoizer.
    #[must_use]
    pub fn recursive<F>(kind: StorageKind, computation: F) -> Self
    where
        F: Fn(&Self, &K) -> V + Send + Sync + 'static,
    {
        Self::builder().kind(kind).build_recursive(computation)
    }

    /// Creates a builder for configuring a memoizer.
    #[must_use]
    pub fn builder() -> MemoizerBuilder<K, V> {
        MemoizerBuilder::new()
    }
}

impl<K, V, E> Memoizer<K, V, E> {
    /// Creates a memoizer for a computation that can fail.
    ///
    /// Only successful results are cached.
    #[must_use]
    pub fn fallible<F>(kind: StorageKind, computation: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        MemoizerBuilder::new().kind(kind).build_fallible(computation)
    }
}

impl<K, V, E, S> Memoizer<K, V, E, S> {
    pub(crate) fn from_parts(
        guard: Guard<K, V, S>,
        compute: Box<Computation<K, V, E, S>>,
        kind: StorageKind,
        name: Option<&'static str>,
    ) -> Self {
        Self {
            guard,
            compute,
            kind,
            name,
        }
    }

    /// Returns the storage kind of this memoizer.
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Returns the diagnostic name given to the builder, if any.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Returns the number of keys the memoizer has seen.
    ///
    /// Keys whose computation failed or whose value has been reclaimed are still counted. Entries
    /// are never removed, so a memoizer over an unbounded key space grows with every distinct key
    /// it is asked for, including keys that only ever failed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Returns `true` if no key has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn label(&self) -> &'static str {
        self.name.unwrap_or("unnamed")
    }
}

impl<K, V, E, S> Memoizer<K, V, E, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Returns the value for `key`, running the computation if it is not cached.
    ///
    /// # Errors
    ///
    /// Returns the computation's error unchanged. No value is cached in that case, so a later call
    /// with the same key runs the computation again. The key itself keeps its empty entry and is
    /// still counted by [`len`](Self::len).
    pub fn try_get_or_compute(&self, key: K) -> Result<Arc<V>, E> {
        let entry = self.guard.entry(&key);
        let slot = entry.lock();

        let cached = slot.borrow().read();
        if let Some(value) = cached {
            event!(Level::TRACE, memoizer = self.label(), kind = self.kind.as_str(), "memoized value hit");
            return Ok(value);
        }

        // No borrow of the slot is held here, a re-entrant call may use it freely.
        let value = match (self.compute)(self, &key) {
            Ok(value) => Arc::new(value),
            Err(error) => {
                event!(
                    Level::DEBUG,
                    memoizer = self.label(),
                    kind = self.kind.as_str(),
                    "memoized computation failed, nothing cached"
                );
                return Err(error);
            }
        };

        let stored = slot.borrow_mut().store(value);
        // Dropped only after the borrow ends, since its destructor may call back into this key.
        let value = match stored {
            Ok(value) => value,
            Err((existing, rejected)) => {
                drop(rejected);
                existing
            }
        };
        event!(Level::DEBUG, memoizer = self.label(), kind = self.kind.as_str(), "computed memoized value");
        Ok(value)
    }

    /// Returns the cached value for `key` without computing it.
    ///
    /// Waits if the key is currently being computed by another thread. Returns `None` if the key
    /// was never computed successfully or, for expirable memoizers, its value has been reclaimed.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let entry = self.guard.find(key)?;
        entry.lock().borrow().read()
    }

    /// Returns `true` if the memoizer holds an entry for `key`.
    ///
    /// For permanent memoizers this means a value has been committed. For expirable memoizers the
    /// key only has to have been requested before; its value may have been reclaimed since.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.guard.find(key).is_some_and(|entry| entry.lock().borrow().contains())
    }
}

impl<K, V, S> Memoizer<K, V, Infallible, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Returns the value for `key`, running the computation if it is not cached.
    ///
    /// A panic in the computation propagates to the caller; the key stays uncached.
    pub fn get_or_compute(&self, key: K) -> Arc<V> {
        let Ok(value) = self.try_get_or_compute(key);
        value
    }
}

impl<K, V, E, S> fmt::Debug for Memoizer<K, V, E, S> {
    #[cfg_attr(test, mutants::skip)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoizer")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
