// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic status flags for tokens
//!
//! An [`AtomicFlagSet`] holds three independent atomic words:
//! - **flags** - seven named status bits (see [`Flag`])
//! - **ref_count** - number of outstanding shared holders
//! - **degradation_metrics** - packed [`DegradationMetrics`] register
//!
//! Every word is mutated only through atomic read-modify-write operations.
//! Nothing here relates one word to another; compound invariants are the
//! state machine's job.

use crate::bits::DegradationMetrics;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// A named status bit of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Nil,
    Allocated,
    Locked,
    Dirty,
    Coherent,
    Processing,
    Shared,
}

impl Flag {
    pub const ALL: [Flag; 7] = [
        Flag::Nil,
        Flag::Allocated,
        Flag::Locked,
        Flag::Dirty,
        Flag::Coherent,
        Flag::Processing,
        Flag::Shared,
    ];

    /// Bit position inside the flags word
    pub const fn bit(self) -> u32 {
        match self {
            Flag::Nil => 0,
            Flag::Allocated => 1,
            Flag::Locked => 2,
            Flag::Dirty => 3,
            Flag::Coherent => 4,
            Flag::Processing => 5,
            Flag::Shared => 6,
        }
    }

    pub const fn mask(self) -> u32 {
        1 << self.bit()
    }

    pub fn name(self) -> &'static str {
        match self {
            Flag::Nil => "nil",
            Flag::Allocated => "allocated",
            Flag::Locked => "locked",
            Flag::Dirty => "dirty",
            Flag::Coherent => "coherent",
            Flag::Processing => "processing",
            Flag::Shared => "shared",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Point-in-time copy of a flags word
///
/// Only the seven named bits are ever set; other positions are masked off
/// when the snapshot is taken.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagBits(u32);

impl FlagBits {
    pub const EMPTY: FlagBits = FlagBits(0);

    const VALID_MASK: u32 = 0x7F;

    pub fn from_flags(flags: impl IntoIterator<Item = Flag>) -> Self {
        flags.into_iter().fold(Self::EMPTY, |bits, flag| bits.with(flag))
    }

    pub fn contains(self, flag: Flag) -> bool {
        self.0 & flag.mask() != 0
    }

    pub fn with(self, flag: Flag) -> Self {
        FlagBits(self.0 | flag.mask())
    }

    pub fn without(self, flag: Flag) -> Self {
        FlagBits(self.0 & !flag.mask())
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set flags in bit order
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl fmt::Debug for FlagBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagBits({})", self)
    }
}

impl fmt::Display for FlagBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let names: Vec<&str> = self.iter().map(Flag::name).collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for FlagBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(Flag::name))
    }
}

/// The three atomic words carried by every token
#[derive(Debug, Default)]
pub struct AtomicFlagSet {
    flags: AtomicU32,
    ref_count: AtomicU32,
    degradation_metrics: AtomicU32,
}

impl AtomicFlagSet {
    /// All words zeroed
    pub const fn new() -> Self {
        Self {
            flags: AtomicU32::new(0),
            ref_count: AtomicU32::new(0),
            degradation_metrics: AtomicU32::new(0),
        }
    }

    pub fn set(&self, flag: Flag) {
        self.flags.fetch_or(flag.mask(), Ordering::AcqRel);
    }

    pub fn clear(&self, flag: Flag) {
        self.flags.fetch_and(!flag.mask(), Ordering::AcqRel);
    }

    pub fn test(&self, flag: Flag) -> bool {
        self.flags.load(Ordering::Acquire) & flag.mask() != 0
    }

    /// Set `flag`, returning true iff it was previously clear
    ///
    /// A `true` result means the caller acquired the bit.
    pub fn test_and_set(&self, flag: Flag) -> bool {
        let previous = self.flags.fetch_or(flag.mask(), Ordering::AcqRel);
        previous & flag.mask() == 0
    }

    /// Snapshot of the flags word
    pub fn bits(&self) -> FlagBits {
        FlagBits(self.flags.load(Ordering::Acquire) & FlagBits::VALID_MASK)
    }

    /// Clear every flag in `flags` with a single atomic operation
    pub fn clear_all(&self, flags: &[Flag]) {
        let mask = flags.iter().fold(0, |mask, flag| mask | flag.mask());
        self.flags.fetch_and(!mask, Ordering::AcqRel);
    }

    /// Add a holder, returning the new count
    pub fn increment_ref(&self) -> u32 {
        self.ref_count
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }

    /// Drop a holder, returning the new count
    ///
    /// Returns `None` without touching the counter when it is already zero,
    /// so exactly one caller can ever observe the transition to zero.
    pub fn decrement_ref(&self) -> Option<u32> {
        self.ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|previous| previous - 1)
    }

    pub fn get_ref(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> DegradationMetrics {
        DegradationMetrics::from_raw(self.degradation_metrics.load(Ordering::Acquire))
    }

    pub fn store_metrics(&self, metrics: DegradationMetrics) {
        self.degradation_metrics
            .swap(metrics.raw(), Ordering::AcqRel);
    }

    pub fn reset_metrics(&self) {
        self.degradation_metrics.swap(0, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[path = "flags_tests.rs"]
mod tests;
