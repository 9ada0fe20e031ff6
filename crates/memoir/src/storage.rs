// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Storage policies for memoized values.

use std::sync::Arc;

use crate::WeakSlot;

/// Selects how a memoizer holds on to computed values.
///
/// # Examples
///
/// ```
/// use memoir::StorageKind;
///
/// assert_eq!(StorageKind::default(), StorageKind::Permanent);
/// assert_eq!(StorageKind::from(true), StorageKind::Expirable);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Values are kept for the lifetime of the memoizer and computed at most once per key.
    #[default]
    Permanent,
    /// Values are held weakly and recomputed once every caller has dropped them.
    Expirable,
}

impl StorageKind {
    /// Returns a stable name for the storage kind, used in log events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Expirable => "expirable",
        }
    }

    /// Returns `true` for [`StorageKind::Expirable`].
    #[must_use]
    pub fn is_expirable(self) -> bool {
        matches!(self, Self::Expirable)
    }
}

impl From<bool> for StorageKind {
    /// Maps an `expirable` flag onto a storage kind.
    fn from(expirable: bool) -> Self {
        if expirable { Self::Expirable } else { Self::Permanent }
    }
}

/// The stored form of a single key's value.
#[derive(Debug)]
pub(crate) enum Slot<V> {
    Permanent(Option<Arc<V>>),
    Expirable(WeakSlot<V>),
}

impl<V> Slot<V> {
    /// A slot for a key that has no committed value yet.
    pub(crate) fn vacant(kind: StorageKind) -> Self {
        match kind {
            StorageKind::Permanent => Self::Permanent(None),
            StorageKind::Expirable => Self::Expirable(WeakSlot::empty()),
        }
    }

    /// Permanent slots count only once a value is committed; expirable slots count as soon as
    /// they exist, whether or not the payload is still alive.
    pub(crate) fn contains(&self) -> bool {
        match self {
            Self::Permanent(value) => value.is_some(),
            Self::Expirable(_) => true,
        }
    }

    /// Returns the live value, or `None` if it must be computed.
    pub(crate) fn read(&self) -> Option<Arc<V>> {
        match self {
            Self::Permanent(value) => value.clone(),
            Self::Expirable(slot) => slot.get(),
        }
    }

    /// Commits a freshly computed value and returns the value callers should observe.
    ///
    /// A live value already in the slot wins over `value`. This only happens when the same
    /// thread re-entered the computation for this key and committed first. The winner and the
    /// rejected `value` are then returned as `Err((existing, value))`, so the caller can drop the
    /// rejected value once it no longer borrows the slot.
    pub(crate) fn store(&mut self, value: Arc<V>) -> Result<Arc<V>, (Arc<V>, Arc<V>)> {
        match self {
            Self::Permanent(Some(existing)) => Err((Arc::clone(existing), value)),
            Self::Permanent(vacant) => {
                *vacant = Some(Arc::clone(&value));
                Ok(value)
            }
            Self::Expirable(slot) => {
                if let Some(existing) = slot.get() {
                    return Err((existing, value));
                }
                slot.replace(&value);
                Ok(value)
            }
        }
    }
}
