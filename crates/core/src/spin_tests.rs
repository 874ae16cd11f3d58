// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicUsize;

#[test]
fn try_lock_is_exclusive() {
    let spin = SpinLock::new();
    assert!(spin.try_lock());
    assert!(!spin.try_lock());
    assert!(spin.is_held());
    assert!(spin.unlock());
    assert!(!spin.is_held());
    assert!(spin.try_lock());
}

#[test]
fn unlock_of_free_lock_reports_false() {
    let spin = SpinLock::default();
    assert!(!spin.unlock());
}

#[test]
fn lock_serializes_threads() {
    let spin = SpinLock::new();
    let inside = AtomicUsize::new(0);
    let total = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..200 {
                    spin.lock();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    total.fetch_add(1, Ordering::Relaxed);
                    inside.fetch_sub(1, Ordering::SeqCst);
                    spin.unlock();
                }
            });
        }
    });

    assert_eq!(total.load(Ordering::Relaxed), 1600);
    assert!(!spin.is_held());
}
