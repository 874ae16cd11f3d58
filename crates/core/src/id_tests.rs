// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;
use std::thread;

#[test]
fn id_gen_starts_at_base() {
    let ids = TokenIdGen::default();
    assert_eq!(ids.next(), TokenId(0x1000_0000));
    assert_eq!(ids.next(), TokenId(0x1000_0001));
    assert_eq!(ids.peek(), TokenId(0x1000_0002));
}

#[test]
fn id_gen_never_returns_null() {
    let ids = TokenIdGen::new(0);
    assert_eq!(ids.next(), TokenId(1));

    let wrapping = TokenIdGen::new(u32::MAX);
    assert_eq!(wrapping.next(), TokenId(u32::MAX));
    assert!(!wrapping.next().is_null());
}

#[test]
fn id_gen_clones_share_the_counter() {
    let gen1 = TokenIdGen::new(10);
    let gen2 = gen1.clone();
    assert_eq!(gen1.next(), TokenId(10));
    assert_eq!(gen2.next(), TokenId(11));
    assert_eq!(gen1.next(), TokenId(12));
}

#[test]
fn id_gen_is_unique_across_threads() {
    let ids = TokenIdGen::default();
    let all: Vec<TokenId> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                s.spawn(move || (0..100).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(unique.len(), 400);
}

#[test]
fn token_id_displays_as_hex() {
    assert_eq!(TokenId(0x1000_00AB).to_string(), "0x100000AB");
    assert_eq!(
        serde_json::to_string(&TokenId(0x1F)).unwrap(),
        r#""0x0000001F""#
    );
}

#[test]
fn owner_for_current_thread_differs_between_threads() {
    let here = OwnerId::current_thread();
    let there = thread::spawn(OwnerId::current_thread).join().unwrap();
    assert_eq!(here, OwnerId::current_thread());
    assert_ne!(here, there);
}
