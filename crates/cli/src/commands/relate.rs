// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `phenoctl relate <a> <b>` - Apply the person model to two bytes

use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use pheno_core::PhenoRelation;

#[derive(Args)]
pub struct RelateArgs {
    /// Person A byte (decimal or 0x-prefixed hex)
    #[arg(value_parser = parse_byte)]
    pub person_a: u8,

    /// Person B byte (decimal or 0x-prefixed hex)
    #[arg(value_parser = parse_byte)]
    pub person_b: u8,
}

pub fn run(args: RelateArgs, format: OutputFormat) -> Result<()> {
    let mut relation = PhenoRelation::default();
    relation.apply_person_model(args.person_a, args.person_b);
    output::print(&relation, format);
    Ok(())
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte '{}': {}", s, e))
}
