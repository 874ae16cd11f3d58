// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use std::thread;

#[test]
fn new_set_is_all_zero() {
    let set = AtomicFlagSet::new();
    assert!(set.bits().is_empty());
    assert_eq!(set.get_ref(), 0);
    assert_eq!(set.metrics().raw(), 0);
}

#[test]
fn set_and_clear_touch_only_one_bit() {
    let set = AtomicFlagSet::new();
    set.set(Flag::Allocated);
    set.set(Flag::Coherent);
    set.clear(Flag::Allocated);

    assert!(!set.test(Flag::Allocated));
    assert!(set.test(Flag::Coherent));
    assert_eq!(set.bits(), FlagBits::from_flags([Flag::Coherent]));
}

#[test]
fn test_and_set_acquires_only_once() {
    let set = AtomicFlagSet::new();
    assert!(set.test_and_set(Flag::Locked));
    assert!(!set.test_and_set(Flag::Locked));

    set.clear(Flag::Locked);
    assert!(set.test_and_set(Flag::Locked));
}

#[test]
fn clear_all_removes_every_listed_flag() {
    let set = AtomicFlagSet::new();
    for flag in Flag::ALL {
        set.set(flag);
    }
    set.clear_all(&[Flag::Allocated, Flag::Locked, Flag::Processing]);

    let bits = set.bits();
    assert!(!bits.contains(Flag::Allocated));
    assert!(!bits.contains(Flag::Locked));
    assert!(!bits.contains(Flag::Processing));
    assert!(bits.contains(Flag::Dirty));
    assert!(bits.contains(Flag::Shared));
}

#[test]
fn flag_bits_display_lists_names_in_bit_order() {
    let bits = FlagBits::from_flags([Flag::Shared, Flag::Allocated, Flag::Locked]);
    assert_eq!(bits.to_string(), "allocated|locked|shared");
    assert_eq!(FlagBits::EMPTY.to_string(), "-");
}

#[test]
fn flag_bits_serialize_as_name_list() {
    let bits = FlagBits::from_flags([Flag::Allocated, Flag::Coherent]);
    let json = serde_json::to_string(&bits).unwrap();
    assert_eq!(json, r#"["allocated","coherent"]"#);
}

#[test]
fn decrement_ref_stops_at_zero() {
    let set = AtomicFlagSet::new();
    assert_eq!(set.increment_ref(), 1);
    assert_eq!(set.increment_ref(), 2);
    assert_eq!(set.decrement_ref(), Some(1));
    assert_eq!(set.decrement_ref(), Some(0));
    assert_eq!(set.decrement_ref(), None);
    assert_eq!(set.get_ref(), 0);
}

#[test]
fn concurrent_test_and_set_has_single_winner() {
    let set = Arc::new(AtomicFlagSet::new());
    let winners: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                s.spawn(move || set.test_and_set(Flag::Locked))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count()
    });
    assert_eq!(winners, 1);
}

#[test]
fn concurrent_decrements_observe_zero_exactly_once() {
    let set = Arc::new(AtomicFlagSet::new());
    for _ in 0..16 {
        set.increment_ref();
    }
    let zero_hits: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let set = Arc::clone(&set);
                s.spawn(move || set.decrement_ref() == Some(0))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|hit| *hit)
            .count()
    });
    assert_eq!(zero_hits, 1);
    assert_eq!(set.get_ref(), 0);
}

#[test]
fn metrics_word_round_trips_through_store() {
    let set = AtomicFlagSet::new();
    let metrics = DegradationMetrics::default().with_retries(12).with_priority(3);
    set.store_metrics(metrics);
    assert_eq!(set.metrics(), metrics);

    set.reset_metrics();
    assert_eq!(set.metrics().raw(), 0);
}
