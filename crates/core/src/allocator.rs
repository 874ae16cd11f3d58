// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Allocator contract and the zoned in-process allocator
//!
//! Tokens never allocate on their own. A [`TokenAllocator`] picks a zone,
//! hands out raw storage and a fresh id, and takes the storage back on
//! release. [`ZonedAllocator`] is the in-process implementation: sixteen
//! zones, each with a byte budget and a live-token cap.

use crate::config::AllocatorConfig;
use crate::id::{TokenId, TokenIdGen};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;

/// Number of allocation zones
pub const ZONE_COUNT: usize = 16;

/// Zone index, always below [`ZONE_COUNT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ZoneIndex(u8);

impl ZoneIndex {
    pub fn new(zone: u8) -> Result<Self, AllocError> {
        if usize::from(zone) < ZONE_COUNT {
            Ok(Self(zone))
        } else {
            Err(AllocError::InvalidZone(zone))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = ZoneIndex> {
        (0..ZONE_COUNT as u8).map(ZoneIndex)
    }

    fn slot(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for ZoneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to storage owned by an allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageHandle(u64);

impl fmt::Display for StorageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage#{}", self.0)
    }
}

/// Everything a token needs from a successful allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: TokenId,
    pub zone: ZoneIndex,
    pub handle: StorageHandle,
    pub size: usize,
}

/// Errors reported by allocators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("no zone has capacity for {requested} bytes")]
    Exhausted { requested: usize },
    #[error("zone {zone} has no capacity for {requested} bytes")]
    ZoneExhausted { zone: ZoneIndex, requested: usize },
    #[error("zone {0} is out of range (zones 0..16)")]
    InvalidZone(u8),
    #[error("zero-sized allocation")]
    ZeroSize,
    #[error("{0} is not live (already released?)")]
    UnknownHandle(StorageHandle),
}

/// Source of token storage and identity
pub trait TokenAllocator: Send + Sync {
    /// Allocate `size` bytes in a zone of the allocator's choosing
    fn allocate(&self, size: usize) -> Result<Allocation, AllocError>;

    /// Allocate `size` bytes in a specific zone
    fn allocate_in(&self, zone: ZoneIndex, size: usize) -> Result<Allocation, AllocError>;

    /// Return storage; each handle may be released exactly once
    fn release(&self, handle: StorageHandle) -> Result<(), AllocError>;

    /// Whether an allocation of `size` bytes would currently succeed
    fn has_capacity(&self, size: usize) -> bool;

    fn zone_count(&self) -> usize {
        ZONE_COUNT
    }
}

/// Per-zone usage snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoneStats {
    pub zone: u8,
    pub live_tokens: usize,
    pub live_bytes: usize,
    pub allocated: u64,
    pub released: u64,
}

impl fmt::Display for ZoneStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "zone {:>2}: {:>4} live ({:>8} bytes)  {:>6} allocated  {:>6} released",
            self.zone, self.live_tokens, self.live_bytes, self.allocated, self.released
        )
    }
}

struct Block {
    zone: ZoneIndex,
    bytes: Box<[u8]>,
}

struct Zones {
    stats: [ZoneStats; ZONE_COUNT],
    blocks: HashMap<StorageHandle, Block>,
}

/// Sixteen-zone allocator with per-zone byte and token limits
///
/// Zone choice for [`allocate`](TokenAllocator::allocate) is the least-loaded
/// zone that fits, scanning from a rotating cursor so ties spread round-robin.
pub struct ZonedAllocator {
    config: AllocatorConfig,
    ids: TokenIdGen,
    zones: Mutex<Zones>,
    next_handle: AtomicU64,
    cursor: AtomicUsize,
}

impl ZonedAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        let ids = TokenIdGen::new(config.id_base);
        Self::with_id_gen(config, ids)
    }

    /// Share an id counter with other allocators
    pub fn with_id_gen(config: AllocatorConfig, ids: TokenIdGen) -> Self {
        let mut stats = [ZoneStats::default(); ZONE_COUNT];
        for (zone, entry) in stats.iter_mut().enumerate() {
            entry.zone = zone as u8;
        }
        Self {
            config,
            ids,
            zones: Mutex::new(Zones {
                stats,
                blocks: HashMap::new(),
            }),
            next_handle: AtomicU64::new(1),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub fn id_gen(&self) -> &TokenIdGen {
        &self.ids
    }

    pub fn stats(&self) -> Vec<ZoneStats> {
        self.zones.lock().stats.to_vec()
    }

    pub fn live_tokens(&self) -> usize {
        self.zones.lock().blocks.len()
    }

    fn fits(&self, stats: &ZoneStats, size: usize) -> bool {
        stats.live_tokens < self.config.max_tokens_per_zone
            && stats
                .live_bytes
                .checked_add(size)
                .is_some_and(|total| total <= self.config.zone_capacity_bytes)
    }

    fn pick_zone(&self, zones: &Zones, size: usize) -> Option<ZoneIndex> {
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % ZONE_COUNT;
        (0..ZONE_COUNT)
            .map(|offset| (start + offset) % ZONE_COUNT)
            .filter(|&slot| self.fits(&zones.stats[slot], size))
            .min_by_key(|&slot| zones.stats[slot].live_bytes)
            .map(|slot| ZoneIndex(slot as u8))
    }

    fn commit(&self, zones: &mut Zones, zone: ZoneIndex, size: usize) -> Allocation {
        let handle = StorageHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        zones.blocks.insert(
            handle,
            Block {
                zone,
                bytes: vec![0u8; size].into_boxed_slice(),
            },
        );
        let stats = &mut zones.stats[zone.slot()];
        stats.live_tokens += 1;
        stats.live_bytes += size;
        stats.allocated += 1;

        let id = self.ids.next();
        tracing::debug!(token_id = %id, zone = %zone, size, "storage allocated");
        Allocation {
            id,
            zone,
            handle,
            size,
        }
    }
}

impl Default for ZonedAllocator {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

impl TokenAllocator for ZonedAllocator {
    fn allocate(&self, size: usize) -> Result<Allocation, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let mut zones = self.zones.lock();
        let Some(zone) = self.pick_zone(&zones, size) else {
            tracing::warn!(size, "allocator exhausted");
            return Err(AllocError::Exhausted { requested: size });
        };
        Ok(self.commit(&mut zones, zone, size))
    }

    fn allocate_in(&self, zone: ZoneIndex, size: usize) -> Result<Allocation, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let mut zones = self.zones.lock();
        if !self.fits(&zones.stats[zone.slot()], size) {
            tracing::warn!(zone = %zone, size, "zone exhausted");
            return Err(AllocError::ZoneExhausted {
                zone,
                requested: size,
            });
        }
        Ok(self.commit(&mut zones, zone, size))
    }

    fn release(&self, handle: StorageHandle) -> Result<(), AllocError> {
        let mut zones = self.zones.lock();
        let block = zones
            .blocks
            .remove(&handle)
            .ok_or(AllocError::UnknownHandle(handle))?;
        let stats = &mut zones.stats[block.zone.slot()];
        stats.live_tokens -= 1;
        stats.live_bytes -= block.bytes.len();
        stats.released += 1;
        tracing::debug!(%handle, zone = %block.zone, "storage released");
        Ok(())
    }

    fn has_capacity(&self, size: usize) -> bool {
        size > 0 && {
            let zones = self.zones.lock();
            zones.stats.iter().any(|stats| self.fits(stats, size))
        }
    }
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
