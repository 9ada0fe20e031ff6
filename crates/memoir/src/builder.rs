// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`Memoizer`].

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use ahash::RandomState;

use crate::guard::Guard;
use crate::memoizer::{Computation, Memoizer};
use crate::storage::StorageKind;
use crate::store::CacheStore;

/// Builder for constructing a [`Memoizer`].
///
/// Created by calling [`Memoizer::builder()`]. By default the memoizer is permanent, unnamed,
/// starts with no preallocated capacity and hashes keys with [`ahash::RandomState`].
///
/// # Examples
///
/// ```
/// use memoir::{Memoizer, StorageKind};
///
/// let lengths = Memoizer::builder()
///     .name("lengths")
///     .kind(StorageKind::Expirable)
///     .capacity(64)
///     .build(|s: &String| s.len());
///
/// let value = lengths.get_or_compute("hello".to_string());
/// assert_eq!(*value, 5);
/// ```
pub struct MemoizerBuilder<K, V, S = RandomState> {
    kind: StorageKind,
    name: Option<&'static str>,
    capacity: usize,
    hasher: S,
    _phantom: PhantomData<fn(K) -> V>,
}

impl<K, V> MemoizerBuilder<K, V, RandomState> {
    pub(crate) fn new() -> Self {
        Self {
            kind: StorageKind::default(),
            name: None,
            capacity: 0,
            hasher: RandomState::new(),
            _phantom: PhantomData,
        }
    }
}

impl<K, V, S> MemoizerBuilder<K, V, S> {
    /// Sets the storage kind.
    #[must_use]
    pub fn kind(mut self, kind: StorageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Selects [`StorageKind::Expirable`] when `expirable` is `true`, [`StorageKind::Permanent`]
    /// otherwise.
    #[must_use]
    pub fn expirable(self, expirable: bool) -> Self {
        self.kind(StorageKind::from(expirable))
    }

    /// Sets a name that identifies the memoizer in log events.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Preallocates room for `capacity` keys.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the hasher used for keys.
    #[must_use]
    pub fn hasher<H>(self, hasher: H) -> MemoizerBuilder<K, V, H> {
        MemoizerBuilder {
            kind: self.kind,
            name: self.name,
            capacity: self.capacity,
            hasher,
            _phantom: PhantomData,
        }
    }

    /// Builds a memoizer for an infallible computation.
    #[must_use]
    pub fn build<F>(self, computation: F) -> Memoizer<K, V, Infallible, S>
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        self.assemble(Box::new(move |_: &Memoizer<K, V, Infallible, S>, key: &K| {
            Ok::<V, Infallible>(computation(key))
        }))
    }

    /// Builds a memoizer for a computation that can fail. Errors are never cached.
    #[must_use]
    pub fn build_fallible<E, F>(self, computation: F) -> Memoizer<K, V, E, S>
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        self.assemble(Box::new(move |_: &Memoizer<K, V, E, S>, key: &K| computation(key)))
    }

    /// Builds a memoizer whose computation receives the memoizer itself, for recursive
    /// computations such as dynamic programming over smaller keys.
    #[must_use]
    pub fn build_recursive<F>(self, computation: F) -> Memoizer<K, V, Infallible, S>
    where
        F: Fn(&Memoizer<K, V, Infallible, S>, &K) -> V + Send + Sync + 'static,
    {
        self.assemble(Box::new(move |this: &Memoizer<K, V, Infallible, S>, key: &K| {
            Ok::<V, Infallible>(computation(this, key))
        }))
    }

    fn assemble<E>(self, compute: Box<Computation<K, V, E, S>>) -> Memoizer<K, V, E, S> {
        let store = CacheStore::with_capacity_and_hasher(self.kind, self.capacity, self.hasher);
        Memoizer::from_parts(Guard::new(store), compute, self.kind, self.name)
    }
}

impl<K, V, S> fmt::Debug for MemoizerBuilder<K, V, S> {
    #[cfg_attr(test, mutants::skip)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizerBuilder")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasherDefault, DefaultHasher};

    use super::*;

    #[test]
    fn defaults() {
        let builder = MemoizerBuilder::<u32, u32>::new();
        assert_eq!(builder.kind, StorageKind::Permanent);
        assert_eq!(builder.name, None);
        assert_eq!(builder.capacity, 0);
    }

    #[test]
    fn expirable_flag_selects_kind() {
        let builder = MemoizerBuilder::<u32, u32>::new().expirable(true);
        assert_eq!(builder.kind, StorageKind::Expirable);

        let builder = builder.expirable(false);
        assert_eq!(builder.kind, StorageKind::Permanent);
    }

    #[test]
    fn custom_hasher_is_used() {
        let memoizer = Memoizer::<u32, u32>::builder()
            .hasher(BuildHasherDefault::<DefaultHasher>::default())
            .capacity(8)
            .build(|n| n + 1);

        assert_eq!(*memoizer.get_or_compute(1), 2);
        assert_eq!(memoizer.len(), 1);
    }

    #[test]
    fn build_fallible_keeps_errors_out() {
        let memoizer = Memoizer::<u32, u32>::builder().build_fallible(|n| if *n > 10 { Err(*n) } else { Ok(*n) });

        assert_eq!(memoizer.try_get_or_compute(11).map(|v| *v), Err(11));
        assert_eq!(memoizer.try_get_or_compute(5).map(|v| *v), Ok(5));
    }

    #[test]
    fn debug_lists_settings() {
        let builder = MemoizerBuilder::<u32, u32>::new().name("cfg").capacity(4);
        let debug = format!("{builder:?}");
        assert!(debug.contains("cfg"), "got: {debug}");
        assert!(debug.contains("capacity: 4"), "got: {debug}");
    }
}
