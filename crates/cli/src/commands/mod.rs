// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod manifest;
pub mod relate;
pub mod scenario;
pub mod stats;
pub mod stress;
