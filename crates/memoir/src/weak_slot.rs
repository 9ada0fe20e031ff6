// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A reclaimable cell holding a value without keeping it alive.

use std::fmt;
use std::sync::{Arc, Weak};

/// A slot that refers to a value without owning it.
///
/// The slot never keeps its payload alive. The payload is reclaimed as soon as the last [`Arc`]
/// handed out for it is dropped, after which [`WeakSlot::get`] reports the slot as cleared.
/// Reclamation is driven entirely by the owners of those `Arc`s; the slot only observes it.
///
/// A cleared slot can be refilled in place with [`WeakSlot::replace`], so the slot itself
/// outlives any number of payloads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use memoir::WeakSlot;
///
/// let value = Arc::new(42);
/// let slot = WeakSlot::holding(&value);
/// assert_eq!(slot.get().as_deref(), Some(&42));
///
/// drop(value);
/// assert!(slot.is_cleared());
/// assert!(slot.get().is_none());
/// ```
pub struct WeakSlot<V> {
    payload: Weak<V>,
}

impl<V> WeakSlot<V> {
    /// Creates a slot with no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self { payload: Weak::new() }
    }

    /// Creates a slot referring to `value`.
    #[must_use]
    pub fn holding(value: &Arc<V>) -> Self {
        Self {
            payload: Arc::downgrade(value),
        }
    }

    /// Returns the payload if it has not been reclaimed yet.
    #[must_use]
    pub fn get(&self) -> Option<Arc<V>> {
        self.payload.upgrade()
    }

    /// Returns `true` if the slot has no live payload.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.payload.strong_count() == 0
    }

    /// Points the slot at a new payload, discarding the previous reference.
    pub fn replace(&mut self, value: &Arc<V>) {
        self.payload = Arc::downgrade(value);
    }
}

impl<V> Default for WeakSlot<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> fmt::Debug for WeakSlot<V> {
    #[cfg_attr(test, mutants::skip)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSlot").field("cleared", &self.is_cleared()).finish()
    }
}
