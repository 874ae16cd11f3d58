// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `phenoctl manifest <file>` - Load a manifest and instantiate its tokens

use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use pheno_core::{PhenoConfig, TokenSnapshot, ZonedAllocator};
use pheno_manifest::{instantiate, load_manifest, RelationRecord, Skipped};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct ManifestArgs {
    /// Manifest file to load
    pub file: PathBuf,

    /// Bytes per token (defaults to the configured token size)
    #[arg(long)]
    pub size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ManifestReport {
    pub tokens: Vec<TokenSnapshot>,
    pub relations: Vec<RelationRecord>,
    pub skipped: Vec<Skipped>,
}

impl fmt::Display for ManifestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} tokens", self.tokens.len())?;
        for token in &self.tokens {
            writeln!(f, "  {}", token)?;
        }
        writeln!(f, "{} relations", self.relations.len())?;
        for relation in &self.relations {
            writeln!(f, "  {}", relation)?;
        }
        write!(f, "{} skipped", self.skipped.len())
    }
}

pub fn run(args: ManifestArgs, config: &PhenoConfig, format: OutputFormat) -> Result<()> {
    let manifest = load_manifest(&args.file)?;
    for skipped in &manifest.skipped {
        eprintln!("warning: {}", skipped);
    }
    let resolved: HashSet<usize> = manifest.resolved_relations().map(|r| r.line).collect();
    for relation in &manifest.relations {
        if !resolved.contains(&relation.line) {
            eprintln!(
                "warning: line {}: relation {} names an undeclared token",
                relation.line, relation
            );
        }
    }

    let allocator = ZonedAllocator::new(config.allocator.clone());
    let size = args.size.unwrap_or(config.allocator.default_token_size);
    let tokens = instantiate(&manifest, &allocator, size)?;

    let report = ManifestReport {
        tokens: tokens.iter().map(|t| t.snapshot()).collect(),
        relations: manifest.relations.clone(),
        skipped: manifest.skipped.clone(),
    };
    for token in &tokens {
        if let Err(e) = token.free(&allocator) {
            tracing::warn!(token_id = %token.id(), error = %e, "failed to release manifest token");
        }
    }

    output::print(&report, format);
    Ok(())
}
