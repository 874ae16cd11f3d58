// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! phenoctl - drive and inspect pheno token state machines

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{manifest, relate, scenario, stats, stress};
use output::OutputFormat;
use pheno_core::PhenoConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "phenoctl",
    version,
    about = "Drive and inspect pheno token state machines"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log every transition to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reference scenario
    Scenario(scenario::ScenarioArgs),
    /// Drive many machines through a fixed event pattern
    Stress(stress::StressArgs),
    /// Load a token manifest and instantiate its tokens
    Manifest(manifest::ManifestArgs),
    /// Show per-zone allocator statistics
    Stats(stats::StatsArgs),
    /// Derive a person relation from two person bytes
    Relate(relate::RelateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scenario(args) => scenario::run(args, &config, cli.format),
        Commands::Stress(args) => stress::run(args, &config, cli.format),
        Commands::Manifest(args) => manifest::run(args, &config, cli.format),
        Commands::Stats(args) => stats::run(args, &config, cli.format),
        Commands::Relate(args) => relate::run(args, cli.format),
    }
}

/// Logs go to stderr so stdout stays parseable
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PhenoConfig> {
    match path {
        Some(path) => PhenoConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PhenoConfig::default()),
    }
}
