// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subject/class/instance/person relation records and their transforms
//!
//! Both transforms are pure bit manipulation over plain bytes; nothing here
//! is shared between threads.

use serde::Serialize;
use std::fmt;

/// Person-state bit: person A is active
pub const PERSON_ACTIVE: u8 = 1 << 0;
/// Person-state bit: person B is connected
pub const PERSON_CONNECTED: u8 = 1 << 1;
/// Person-state bit: the pair differs in bit 2
pub const PERSON_DIFFERENTIAL: u8 = 1 << 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SubjectRelation {
    pub id: u8,
    pub kind: u8,
    pub state: u8,
    pub class: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ClassRelation {
    pub id: u8,
    pub category: u8,
    pub taxonomy: u8,
    pub level: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct InstanceRelation {
    pub id: u8,
    pub kind: u8,
    pub state: u8,
    pub flags: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PersonRelation {
    pub id: u8,
    pub role: u8,
    pub auth: u8,
    pub state: u8,
}

/// Four 32-bit relation groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PhenoRelation {
    pub subject: SubjectRelation,
    pub class: ClassRelation,
    pub instance: InstanceRelation,
    pub person: PersonRelation,
}

impl PhenoRelation {
    /// Decode from the 16-byte layout: subject, class, instance, person
    pub fn from_bytes(b: [u8; 16]) -> Self {
        Self {
            subject: SubjectRelation {
                id: b[0],
                kind: b[1],
                state: b[2],
                class: b[3],
            },
            class: ClassRelation {
                id: b[4],
                category: b[5],
                taxonomy: b[6],
                level: b[7],
            },
            instance: InstanceRelation {
                id: b[8],
                kind: b[9],
                state: b[10],
                flags: b[11],
            },
            person: PersonRelation {
                id: b[12],
                role: b[13],
                auth: b[14],
                state: b[15],
            },
        }
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let Self {
            subject: s,
            class: c,
            instance: i,
            person: p,
        } = *self;
        [
            s.id, s.kind, s.state, s.class, c.id, c.category, c.taxonomy, c.level, i.id, i.kind,
            i.state, i.flags, p.id, p.role, p.auth, p.state,
        ]
    }

    /// Differential merge of `src` into `self`
    ///
    /// Subject and class ids XOR, instance state ORs, and the person state
    /// becomes `src`'s rotated left by two.
    pub fn map_obj_to_obj(&mut self, src: &PhenoRelation) {
        self.subject.id ^= src.subject.id;
        self.class.id ^= src.class.id;
        self.instance.state |= src.instance.state;
        self.person.state = src.person.state.rotate_left(2);
    }

    /// Derive the person group from a pair of person bytes
    ///
    /// Authority is the number of bits in which the two persons differ.
    pub fn apply_person_model(&mut self, person_a: u8, person_b: u8) {
        let diff = person_a ^ person_b;
        let mut state = 0;
        if person_a & 0x01 != 0 {
            state |= PERSON_ACTIVE;
        }
        if person_b & 0x02 != 0 {
            state |= PERSON_CONNECTED;
        }
        if diff & 0x04 != 0 {
            state |= PERSON_DIFFERENTIAL;
        }
        self.person = PersonRelation {
            id: person_a,
            role: person_b,
            auth: diff.count_ones() as u8,
            state,
        };
    }
}

impl fmt::Display for PhenoRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s, c, i, p) = (self.subject, self.class, self.instance, self.person);
        writeln!(
            f,
            "subject:  id={:#04x} kind={:#04x} state={:#04x} class={:#04x}",
            s.id, s.kind, s.state, s.class
        )?;
        writeln!(
            f,
            "class:    id={:#04x} category={:#04x} taxonomy={:#04x} level={:#04x}",
            c.id, c.category, c.taxonomy, c.level
        )?;
        writeln!(
            f,
            "instance: id={:#04x} kind={:#04x} state={:#04x} flags={:#04x}",
            i.id, i.kind, i.state, i.flags
        )?;
        write!(
            f,
            "person:   id={:#04x} role={:#04x} auth={} state={:#05b}",
            p.id, p.role, p.auth, p.state
        )
    }
}

#[cfg(test)]
#[path = "relation_tests.rs"]
mod tests;
