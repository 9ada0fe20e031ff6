// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Demonstrates a recursive memoizer shared by several threads.
//!
//! Every thread asks for the same Fibonacci number. The first one computes it, recursing
//! through the memoizer for smaller numbers; the others wait and reuse its result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use memoir::{Memoizer, StorageKind};

fn main() {
    let computations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&computations);

    let fib = Memoizer::builder().name("fibonacci").kind(StorageKind::Permanent).build_recursive(
        move |fib: &Memoizer<u64, u128>, n: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            if *n < 2 {
                u128::from(*n)
            } else {
                *fib.get_or_compute(n - 1) + *fib.get_or_compute(n - 2)
            }
        },
    );

    thread::scope(|s| {
        for i in 1..=4 {
            let fib = &fib;
            s.spawn(move || {
                let value = fib.get_or_compute(150);
                println!("  [thread {i}] fib(150) = {value}");
            });
        }
    });

    println!(
        "\n{} computations for {} distinct keys",
        computations.load(Ordering::SeqCst),
        fib.len()
    );
}
