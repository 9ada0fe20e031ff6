// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Failing computations are never cached.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use memoir::{Memoizer, StorageKind, TryMemoize};

#[ohno::error]
#[display("lookup of key {key} failed")]
struct LookupError {
    key: u32,
}

/// A computation that fails on its first `failures` invocations and then succeeds.
fn flaky(calls: &Arc<AtomicUsize>, failures: usize) -> impl Fn(&u32) -> Result<u32, LookupError> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move |key| {
        if calls.fetch_add(1, Ordering::SeqCst) < failures {
            Err(LookupError::new(*key))
        } else {
            Ok(key * 2)
        }
    }
}

fn failure_is_retried(kind: StorageKind) {
    let calls = Arc::new(AtomicUsize::new(0));
    let memoizer = Memoizer::fallible(kind, flaky(&calls, 1));

    let error = memoizer.try_get_or_compute(7).map(|v| *v).expect_err("first call should fail");
    assert!(error.to_string().contains("lookup of key 7 failed"), "got: {error}");
    assert!(memoizer.peek(&7).is_none());

    let value = memoizer.try_get_or_compute(7).expect("second call should succeed");
    assert_eq!(*value, 14);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn permanent_failure_is_retried() {
    failure_is_retried(StorageKind::Permanent);
}

#[test]
fn expirable_failure_is_retried() {
    failure_is_retried(StorageKind::Expirable);
}

#[test]
fn permanent_success_after_failure_is_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let memoizer = Memoizer::fallible(StorageKind::Permanent, flaky(&calls, 2));

    assert!(matches!(memoizer.try_get_or_compute(1), Err(_)));
    assert!(matches!(memoizer.try_get_or_compute(1), Err(_)));
    assert!(!memoizer.contains(&1));

    let first = memoizer.try_get_or_compute(1).expect("third call should succeed");
    let second = memoizer.try_get_or_compute(1).expect("cached value should be returned");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(memoizer.contains(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn failed_keys_keep_their_entries() {
    let memoizer = Memoizer::fallible(StorageKind::Permanent, |key: &u32| Err::<u32, _>(LookupError::new(*key)));

    for key in 0..5 {
        assert!(matches!(memoizer.try_get_or_compute(key), Err(_)));
    }

    assert_eq!(memoizer.len(), 5);
    assert!((0..5).all(|key| !memoizer.contains(&key)));
}

#[test]
fn failure_does_not_block_other_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let memoizer = Memoizer::fallible(StorageKind::Permanent, flaky(&calls, 1));

    assert!(matches!(memoizer.try_get_or_compute(3), Err(_)));

    thread::scope(|s| {
        let handle = s.spawn(|| memoizer.try_get_or_compute(3).map(|v| *v).ok());
        assert_eq!(handle.join().expect("thread should not panic"), Some(6));
    });
}

#[test]
fn panic_releases_locks_and_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let memoizer = Memoizer::new(move |key: &u32| {
        assert!(counter.fetch_add(1, Ordering::SeqCst) > 0, "first computation panics");
        key + 1
    });

    let outcome = catch_unwind(AssertUnwindSafe(|| memoizer.get_or_compute(4)));
    assert!(matches!(outcome, Err(_)), "first computation should panic");
    assert!(!memoizer.contains(&4));

    // Another thread must be able to take the entry lock released by the unwinding caller.
    thread::scope(|s| {
        let handle = s.spawn(|| *memoizer.get_or_compute(4));
        assert_eq!(handle.join().expect("retry should not panic"), 5);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn memoized_closure_errors_pass_through_unchanged() {
    let parse = (|text: String| text.parse::<u16>()).try_memoize();

    let direct = "x".parse::<u16>().expect_err("not a number");
    let memoized = parse("x".to_string()).expect_err("not a number");
    assert_eq!(memoized, direct);

    assert_eq!(parse("65535".to_string()).map(|v| *v), Ok(65535));
}
