// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Thread-safe memoization with permanent and expirable storage.
//!
//! This crate provides [`Memoizer`], a cache in front of a pure computation. The first request
//! for a key runs the computation; later requests return the stored result. Results are handed
//! out as [`Arc`](std::sync::Arc)s and shared by every caller.
//!
//! # Storage Kinds
//!
//! - [`StorageKind::Permanent`] (the default) keeps every result for the lifetime of the
//!   memoizer. The computation runs **at most once per key**, however many threads request the
//!   key at the same time.
//! - [`StorageKind::Expirable`] keeps only a [`WeakSlot`] per key. A result stays cached while
//!   some caller still holds it and is recomputed on the next request after the last holder drops
//!   it. The key itself stays known to the memoizer; only its payload comes and goes.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::thread;
//!
//! use memoir::Memoizer;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! let square = Memoizer::new(move |n: &u64| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     n * n
//! });
//!
//! thread::scope(|s| {
//!     for _ in 0..8 {
//!         s.spawn(|| assert_eq!(*square.get_or_compute(2), 4));
//!     }
//! });
//!
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```
//!
//! # Closures of Several Arguments
//!
//! The [`Memoize`] and [`TryMemoize`] traits turn closures of one to sixteen arguments into
//! memoized callables keyed on the tuple of their arguments:
//!
//! ```
//! use memoir::Memoize;
//!
//! let volume = (|x: u32, y: u32, z: u32| x * y * z).memoize();
//! assert_eq!(*volume(2, 2, 2), 8);
//! ```
//!
//! # Concurrency
//!
//! Lookups of known keys take a shared lock on the store. A miss re-checks the key under an
//! upgradable lock before inserting it, so each key gets exactly one entry. Each entry has its own
//! re-entrant lock that is held while the key is computed: concurrent requests for that key block
//! until the result is committed, while other keys proceed in parallel. The store lock is never
//! held while the computation runs, so a computation may call back into its memoizer (see
//! [`Memoizer::recursive`]).
//!
//! # Failures
//!
//! Computations built with [`Memoizer::fallible`] or [`TryMemoize`] may fail. The error is
//! returned unchanged, nothing is cached and the next request retries. A panicking computation
//! unwinds through the memoizer with all locks released.
//!
//! # Logging
//!
//! Cache hits are logged at `TRACE` and computations at `DEBUG` level through [`tracing`], tagged
//! with the memoizer's name and storage kind.

mod adapter;
mod builder;
mod guard;
mod memoizer;
mod storage;
mod store;
mod weak_slot;

pub use adapter::{Memoize, TryMemoize};
pub use builder::MemoizerBuilder;
pub use memoizer::Memoizer;
pub use storage::StorageKind;
pub use weak_slot::WeakSlot;
