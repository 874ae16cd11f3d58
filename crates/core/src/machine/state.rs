// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine states, Active substates and events

use serde::Serialize;
use std::fmt;

/// Lifecycle state of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// No token yet
    Nil,
    /// Token allocated, unlocked
    Allocated,
    /// Token locked by an owner
    Locked,
    /// Validated and processing
    Active,
    /// Coherence lost, awaiting recovery
    Degraded,
    /// Handed out to one or more holders
    Shared,
    /// Terminal; token released
    Freed,
}

impl State {
    pub const ALL: [State; 7] = [
        State::Nil,
        State::Allocated,
        State::Locked,
        State::Active,
        State::Degraded,
        State::Shared,
        State::Freed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            State::Nil => "NIL",
            State::Allocated => "ALLOCATED",
            State::Locked => "LOCKED",
            State::Active => "ACTIVE",
            State::Degraded => "DEGRADED",
            State::Shared => "SHARED",
            State::Freed => "FREED",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == State::Freed
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown state: {}", s))
    }
}

/// What an Active machine is doing with its token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Substate {
    #[default]
    None,
    Reading,
    Writing,
    Transforming,
}

impl Substate {
    pub const ALL: [Substate; 4] = [
        Substate::None,
        Substate::Reading,
        Substate::Writing,
        Substate::Transforming,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Substate::None => "NONE",
            Substate::Reading => "READING",
            Substate::Writing => "WRITING",
            Substate::Transforming => "TRANSFORMING",
        }
    }

    /// Substates that modify token data
    pub fn mutates(self) -> bool {
        matches!(self, Substate::Writing | Substate::Transforming)
    }
}

impl fmt::Display for Substate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Substate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Substate::ALL
            .into_iter()
            .find(|substate| substate.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown substate: {}", s))
    }
}

/// Input driving a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Alloc,
    Lock,
    Unlock,
    Validate,
    Degrade,
    Recover,
    Share,
    Free,
}

impl Event {
    pub const ALL: [Event; 8] = [
        Event::Alloc,
        Event::Lock,
        Event::Unlock,
        Event::Validate,
        Event::Degrade,
        Event::Recover,
        Event::Share,
        Event::Free,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Event::Alloc => "ALLOC",
            Event::Lock => "LOCK",
            Event::Unlock => "UNLOCK",
            Event::Validate => "VALIDATE",
            Event::Degrade => "DEGRADE",
            Event::Recover => "RECOVER",
            Event::Share => "SHARE",
            Event::Free => "FREE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .into_iter()
            .find(|event| event.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown event: {}", s))
    }
}
