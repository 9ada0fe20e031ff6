// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Memoization of plain closures taking one to sixteen arguments.
//!
//! The arguments of a call are packed into a pair of tuples, the first eight arguments and the
//! rest, which becomes the memoizer's key. Arguments must therefore be `Eq + Hash + Clone`; the
//! computation receives clones of the cached key.

use std::hash::Hash;
use std::sync::Arc;

use crate::{Memoizer, StorageKind};

/// Memoizes a closure of one to sixteen arguments.
///
/// `Args` is the tuple of argument types and is inferred from the closure.
///
/// # Examples
///
/// ```
/// use memoir::Memoize;
///
/// let area = (|w: u32, h: u32| w * h).memoize();
///
/// assert_eq!(*area(3, 4), 12);
/// assert_eq!(*area(3, 4), 12);
/// ```
pub trait Memoize<Args, R>: Sized {
    /// The memoized callable, taking the same arguments as the closure.
    type Memoized;

    /// Memoizes the closure with the given storage kind.
    fn memoize_with(self, kind: StorageKind) -> Self::Memoized;

    /// Memoizes the closure permanently.
    fn memoize(self) -> Self::Memoized {
        self.memoize_with(StorageKind::Permanent)
    }

    /// Memoizes the closure with weakly held results.
    fn memoize_expirable(self) -> Self::Memoized {
        self.memoize_with(StorageKind::Expirable)
    }
}

/// Memoizes a fallible closure of one to sixteen arguments, caching only successful results.
///
/// Arguments that failed still occupy an entry in the underlying memoizer, so memoizing a
/// fallible closure over an open input space keeps one entry per distinct input.
///
/// # Examples
///
/// ```
/// use memoir::TryMemoize;
///
/// let parse = (|s: String| s.parse::<u32>()).try_memoize();
///
/// assert_eq!(parse("42".to_string()).map(|v| *v), Ok(42));
/// assert!(parse("forty-two".to_string()).is_err());
/// ```
pub trait TryMemoize<Args, R, E>: Sized {
    /// The memoized callable, taking the same arguments as the closure.
    type Memoized;

    /// Memoizes the closure with the given storage kind.
    fn try_memoize_with(self, kind: StorageKind) -> Self::Memoized;

    /// Memoizes the closure permanently.
    fn try_memoize(self) -> Self::Memoized {
        self.try_memoize_with(StorageKind::Permanent)
    }

    /// Memoizes the closure with weakly held results.
    fn try_memoize_expirable(self) -> Self::Memoized {
        self.try_memoize_with(StorageKind::Expirable)
    }
}

// The key is split into a head of up to eight arguments and a possibly empty tail, since the
// standard library implements `Eq` and `Hash` only for tuples of up to twelve elements.
macro_rules! impl_memoize {
    ([$($head:ident $harg:ident),+] [$($tail:ident $targ:ident),*]) => {
        impl<Func, R, $($head,)+ $($tail,)*> Memoize<($($head,)+ $($tail,)*), R> for Func
        where
            Func: Fn($($head),+ $(, $tail)*) -> R + Send + Sync + 'static,
            R: Send + Sync + 'static,
            $($head: Eq + Hash + Clone + Send + Sync + 'static,)+
            $($tail: Eq + Hash + Clone + Send + Sync + 'static,)*
        {
            type Memoized = Box<dyn Fn($($head),+ $(, $tail)*) -> Arc<R> + Send + Sync>;

            fn memoize_with(self, kind: StorageKind) -> Self::Memoized {
                let memoizer = Memoizer::with_kind(
                    kind,
                    move |(($($harg,)+), ($($targ,)*)): &(($($head,)+), ($($tail,)*))| {
                        self($($harg.clone()),+ $(, $targ.clone())*)
                    },
                );
                Box::new(move |$($harg),+ $(, $targ)*| memoizer.get_or_compute((($($harg,)+), ($($targ,)*))))
            }
        }

        impl<Func, R, E, $($head,)+ $($tail,)*> TryMemoize<($($head,)+ $($tail,)*), R, E> for Func
        where
            Func: Fn($($head),+ $(, $tail)*) -> Result<R, E> + Send + Sync + 'static,
            R: Send + Sync + 'static,
            E: 'static,
            $($head: Eq + Hash + Clone + Send + Sync + 'static,)+
            $($tail: Eq + Hash + Clone + Send + Sync + 'static,)*
        {
            type Memoized = Box<dyn Fn($($head),+ $(, $tail)*) -> Result<Arc<R>, E> + Send + Sync>;

            fn try_memoize_with(self, kind: StorageKind) -> Self::Memoized {
                let memoizer = Memoizer::fallible(
                    kind,
                    move |(($($harg,)+), ($($targ,)*)): &(($($head,)+), ($($tail,)*))| {
                        self($($harg.clone()),+ $(, $targ.clone())*)
                    },
                );
                Box::new(move |$($harg),+ $(, $targ)*| memoizer.try_get_or_compute((($($harg,)+), ($($targ,)*))))
            }
        }
    };
}

impl_memoize!([A1 a1] []);
impl_memoize!([A1 a1, A2 a2] []);
impl_memoize!([A1 a1, A2 a2, A3 a3] []);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4] []);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5] []);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6] []);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7] []);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] []);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10, A11 a11]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10, A11 a11, A12 a12]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10, A11 a11, A12 a12, A13 a13]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10, A11 a11, A12 a12, A13 a13, A14 a14]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10, A11 a11, A12 a12, A13 a13, A14 a14, A15 a15]);
impl_memoize!([A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8] [A9 a9, A10 a10, A11 a11, A12 a12, A13 a13, A14 a14, A15 a15, A16 a16]);
