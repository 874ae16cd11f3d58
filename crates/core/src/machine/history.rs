// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::state::{Event, State};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Applied transitions kept per machine
pub const HISTORY_CAPACITY: usize = 64;

/// One applied transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub from: State,
    pub event: Event,
    pub to: State,
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {} -> {}", self.from, self.event, self.to)
    }
}

/// Bounded ring of the most recent transitions, oldest first
#[derive(Debug, Clone, Default)]
pub(crate) struct History {
    records: VecDeque<TransitionRecord>,
}

impl History {
    pub(crate) fn push(&mut self, record: TransitionRecord) {
        if self.records.len() == HISTORY_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub(crate) fn to_vec(&self) -> Vec<TransitionRecord> {
        self.records.iter().copied().collect()
    }
}
