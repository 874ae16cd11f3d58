// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::parser::parse_manifest;
use pheno_core::{AllocatorConfig, ZonedAllocator};

#[test]
fn tokens_keep_manifest_identity() {
    let allocator = ZonedAllocator::default();
    let manifest =
        parse_manifest("TOKEN: 0x10000001 SENSOR 3\nTOKEN: 0x10000002 A-VERY-LONG-ACTUATOR 4\n");

    let tokens = instantiate(&manifest, &allocator, 1024).unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].id(), TokenId(0x1000_0001));
    assert_eq!(tokens[0].tag(), "SENSOR");
    assert_eq!(tokens[0].zone().get(), 3);
    assert_eq!(tokens[0].size(), 1024);
    assert!(tokens[0].flags().test(Flag::Allocated));
    assert_eq!(tokens[1].tag(), "A-VERY-LONG-ACT");
    assert_eq!(allocator.stats()[4].live_tokens, 1);
}

#[test]
fn failure_rolls_back_earlier_tokens() {
    let allocator = ZonedAllocator::new(AllocatorConfig {
        max_tokens_per_zone: 1,
        ..AllocatorConfig::default()
    });
    let manifest = parse_manifest("TOKEN: 0x1 A 2\nTOKEN: 0x2 B 5\nTOKEN: 0x3 C 2\n");

    let err = instantiate(&manifest, &allocator, 64).unwrap_err();
    let InstantiateError::Alloc { id, line, .. } = err;
    assert_eq!(id, TokenId(3));
    assert_eq!(line, 3);
    assert_eq!(allocator.live_tokens(), 0);
}
