// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `phenoctl stats` - Per-zone allocator statistics

use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use pheno_core::{PhenoConfig, TokenAllocator, ZoneIndex, ZonedAllocator};

#[derive(Args)]
pub struct StatsArgs {
    /// Bytes to place in each zone before sampling
    #[arg(long)]
    pub size: Option<usize>,
}

pub fn run(args: StatsArgs, config: &PhenoConfig, format: OutputFormat) -> Result<()> {
    let allocator = ZonedAllocator::new(config.allocator.clone());
    let size = args.size.unwrap_or(config.allocator.default_token_size);

    let allocations = ZoneIndex::all()
        .map(|zone| allocator.allocate_in(zone, size))
        .collect::<Result<Vec<_>, _>>()?;
    let stats = allocator.stats();
    for allocation in allocations {
        allocator.release(allocation.handle)?;
    }

    output::print_list(&stats, format);
    Ok(())
}
