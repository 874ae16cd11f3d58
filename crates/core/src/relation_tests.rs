// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[test]
fn map_xors_subject_ids() {
    let mut src = PhenoRelation::default();
    src.subject.id = 0x01;
    let mut dst = PhenoRelation::default();
    dst.subject.id = 0x04;

    dst.map_obj_to_obj(&src);
    assert_eq!(dst.subject.id, 0x05);
}

#[test]
fn map_merges_instance_state_and_rotates_person_state() {
    let mut src = PhenoRelation::default();
    src.class.id = 0xF0;
    src.instance.state = 0b0000_0101;
    src.person.state = 0b1100_0001;

    let mut dst = PhenoRelation::default();
    dst.class.id = 0xFF;
    dst.instance.state = 0b0011_0000;
    dst.person.state = 0xAA;

    dst.map_obj_to_obj(&src);
    assert_eq!(dst.class.id, 0x0F);
    assert_eq!(dst.instance.state, 0b0011_0101);
    assert_eq!(dst.person.state, 0b0000_0111);
}

#[test]
fn map_leaves_other_fields_alone() {
    let src = PhenoRelation::from_bytes([0xFF; 16]);
    let mut dst = PhenoRelation::from_bytes([0x11; 16]);
    dst.map_obj_to_obj(&src);
    assert_eq!(dst.subject.kind, 0x11);
    assert_eq!(dst.class.level, 0x11);
    assert_eq!(dst.instance.flags, 0x11);
    assert_eq!(dst.person.auth, 0x11);
}

#[parameterized(
    complementary = { 0xAA, 0x55, 8, PERSON_DIFFERENTIAL },
    identical = { 0x0F, 0x0F, 0, PERSON_ACTIVE | PERSON_CONNECTED },
    zero = { 0x00, 0x00, 0, 0 },
    one_bit_apart = { 0x01, 0x05, 1, PERSON_ACTIVE | PERSON_DIFFERENTIAL },
)]
fn person_model(a: u8, b: u8, auth: u8, state: u8) {
    let mut rel = PhenoRelation::default();
    rel.apply_person_model(a, b);
    assert_eq!(rel.person.id, a);
    assert_eq!(rel.person.role, b);
    assert_eq!(rel.person.auth, auth);
    assert_eq!(rel.person.state, state);
}

#[test]
fn display_shows_person_group() {
    let mut rel = PhenoRelation::default();
    rel.apply_person_model(0xAA, 0x55);
    let text = rel.to_string();
    assert!(text.contains("person:   id=0xaa role=0x55 auth=8 state=0b100"));
    assert_eq!(text.lines().count(), 4);
}

proptest! {
    #[test]
    fn byte_layout_round_trips(bytes in any::<[u8; 16]>()) {
        prop_assert_eq!(PhenoRelation::from_bytes(bytes).to_bytes(), bytes);
    }

    #[test]
    fn mapping_twice_restores_ids(a in any::<[u8; 16]>(), b in any::<[u8; 16]>()) {
        let src = PhenoRelation::from_bytes(a);
        let mut dst = PhenoRelation::from_bytes(b);
        dst.map_obj_to_obj(&src);
        dst.map_obj_to_obj(&src);
        prop_assert_eq!(dst.subject.id, b[0]);
        prop_assert_eq!(dst.class.id, b[4]);
    }
}
