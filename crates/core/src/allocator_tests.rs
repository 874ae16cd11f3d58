// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

fn small() -> ZonedAllocator {
    ZonedAllocator::new(AllocatorConfig::for_testing())
}

#[test]
fn zone_index_rejects_out_of_range() {
    assert_eq!(ZoneIndex::new(15).unwrap().get(), 15);
    assert_eq!(ZoneIndex::new(16), Err(AllocError::InvalidZone(16)));
    assert_eq!(ZoneIndex::all().count(), ZONE_COUNT);
}

#[test]
fn allocation_assigns_monotonic_ids_from_base() {
    let allocator = ZonedAllocator::default();
    let a = allocator.allocate(64).unwrap();
    let b = allocator.allocate(64).unwrap();
    assert_eq!(a.id, TokenId(0x1000_0000));
    assert_eq!(b.id, TokenId(0x1000_0001));
    assert_ne!(a.handle, b.handle);
}

#[test]
fn empty_zones_fill_round_robin() {
    let allocator = ZonedAllocator::default();
    let zones: HashSet<u8> = (0..ZONE_COUNT)
        .map(|_| allocator.allocate(128).unwrap().zone.get())
        .collect();
    assert_eq!(zones.len(), ZONE_COUNT);
}

#[test]
fn least_loaded_zone_wins() {
    let allocator = ZonedAllocator::default();
    for zone in ZoneIndex::all().filter(|z| z.get() != 7) {
        allocator.allocate_in(zone, 512).unwrap();
    }
    let next = allocator.allocate(16).unwrap();
    assert_eq!(next.zone.get(), 7);
}

#[test]
fn zero_size_is_rejected() {
    let allocator = small();
    assert_eq!(allocator.allocate(0), Err(AllocError::ZeroSize));
    assert!(!allocator.has_capacity(0));
}

#[test]
fn token_cap_exhausts_every_zone() {
    let allocator = small();
    let per_zone = allocator.config().max_tokens_per_zone;
    for _ in 0..per_zone * ZONE_COUNT {
        allocator.allocate(8).unwrap();
    }
    assert!(!allocator.has_capacity(8));
    assert_eq!(
        allocator.allocate(8),
        Err(AllocError::Exhausted { requested: 8 })
    );
}

#[test]
fn byte_budget_limits_a_single_zone() {
    let allocator = small();
    let zone = ZoneIndex::new(3).unwrap();
    let capacity = allocator.config().zone_capacity_bytes;

    allocator.allocate_in(zone, capacity).unwrap();
    assert_eq!(
        allocator.allocate_in(zone, 1),
        Err(AllocError::ZoneExhausted {
            zone,
            requested: 1
        })
    );
    // Other zones are untouched
    assert!(allocator.has_capacity(capacity));
}

#[test]
fn release_returns_capacity_and_updates_stats() {
    let allocator = small();
    let zone = ZoneIndex::new(0).unwrap();
    let allocation = allocator.allocate_in(zone, 100).unwrap();

    let stats = allocator.stats()[0];
    assert_eq!(stats.live_tokens, 1);
    assert_eq!(stats.live_bytes, 100);

    allocator.release(allocation.handle).unwrap();
    let stats = allocator.stats()[0];
    assert_eq!(stats.live_tokens, 0);
    assert_eq!(stats.live_bytes, 0);
    assert_eq!(stats.allocated, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(allocator.live_tokens(), 0);
}

#[test]
fn double_release_is_reported() {
    let allocator = small();
    let allocation = allocator.allocate(32).unwrap();
    allocator.release(allocation.handle).unwrap();
    assert_eq!(
        allocator.release(allocation.handle),
        Err(AllocError::UnknownHandle(allocation.handle))
    );
    assert_eq!(allocator.stats().iter().map(|s| s.released).sum::<u64>(), 1);
}

#[test]
fn shared_id_gen_spans_allocators() {
    let ids = TokenIdGen::new(100);
    let first = ZonedAllocator::with_id_gen(AllocatorConfig::default(), ids.clone());
    let second = ZonedAllocator::with_id_gen(AllocatorConfig::default(), ids);
    assert_eq!(first.allocate(8).unwrap().id, TokenId(100));
    assert_eq!(second.allocate(8).unwrap().id, TokenId(101));
}
