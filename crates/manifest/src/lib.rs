// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Token manifests
//!
//! A manifest is a plain-text file of token and relation records:
//!
//! ```text
//! # comment
//! TOKEN: 0x10000001 SENSOR 3
//! TOKEN: 0x10000002 ACTUATOR 4
//! RELATION: 0x10000001 -> 0x10000002 : DRIVES
//! ```
//!
//! Malformed lines are skipped with a diagnostic, never fatal.

mod instantiate;
mod parser;

pub use instantiate::{instantiate, InstantiateError};
pub use parser::{
    load_manifest, parse_manifest, Manifest, ManifestError, RelationRecord, SkipReason, Skipped,
    TokenRecord,
};
