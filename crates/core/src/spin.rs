// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-hold spin-lock for the locked-token critical section
//!
//! Unlike a guard-based lock, acquisition and release happen in separate
//! calls: the machine acquires on `Allocated -> Locked` and releases on
//! `Unlock` or a forced free. It is never held across a blocking wait.

use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Spins before falling back to `yield_now`
const SPINS_BEFORE_YIELD: u32 = 64;

#[derive(Debug, Default)]
pub struct SpinLock {
    held: AtomicBool,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Acquire without waiting; true iff the caller now holds the lock
    pub fn try_lock(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Spin until acquired
    pub fn lock(&self) {
        let mut spins = 0u32;
        while !self.try_lock() {
            // Test before retrying the exchange to keep the line shared
            while self.held.load(Ordering::Relaxed) {
                if spins < SPINS_BEFORE_YIELD {
                    hint::spin_loop();
                    spins += 1;
                } else {
                    thread::yield_now();
                }
            }
        }
    }

    /// Release, returning whether the lock was held
    pub fn unlock(&self) -> bool {
        self.held.swap(false, Ordering::Release)
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "spin_tests.rs"]
mod tests;
