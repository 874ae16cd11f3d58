// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pheno-core: token lifecycle engine
//!
//! This crate provides:
//! - Atomic flag words and packed bit registers for tokens
//! - Tokens and the allocator contract they are produced through
//! - The lifecycle state machine with its degradation/recovery protocol
//! - Relation transforms and TOML configuration

pub mod allocator;
pub mod bits;
pub mod config;
pub mod flags;
pub mod id;
pub mod machine;
pub mod recovery;
pub mod relation;
pub mod spin;
pub mod token;

pub use allocator::{
    AllocError, Allocation, StorageHandle, TokenAllocator, ZoneIndex, ZoneStats, ZonedAllocator,
    ZONE_COUNT,
};
pub use bits::{DegradationMetrics, TokenType, ValueHeader};
pub use config::{AllocatorConfig, ConfigError, PhenoConfig};
pub use flags::{AtomicFlagSet, Flag, FlagBits};
pub use id::{OwnerId, TokenId, TokenIdGen};
pub use machine::{
    Event, MachineError, MachineSnapshot, State, StateMachine, StateMachineBuilder, Substate,
    TransitionRecord,
};
pub use recovery::{
    AllocatedCheck, AutoRecover, DegradationPolicy, IntegrityCheck, RecoveryContext, RecoveryHook,
};
pub use relation::PhenoRelation;
pub use spin::SpinLock;
pub use token::{Token, TokenError, TokenSnapshot};
