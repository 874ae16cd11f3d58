// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `phenoctl stress` - Drive many machines through a fixed event pattern

use crate::output::{self, OutputFormat};
use anyhow::{anyhow, bail, Result};
use clap::Args;
use pheno_core::{Event, PhenoConfig, State, StateMachine, ZonedAllocator};
use serde::Serialize;
use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Coprime with the event count, so every machine sees every event
const EVENT_STRIDE: usize = 3;

#[derive(Args)]
pub struct StressArgs {
    /// Number of machines to create
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,

    /// Events sent to each machine
    #[arg(long, default_value_t = 10)]
    pub events: usize,

    /// Worker threads
    #[arg(long, default_value_t = 4)]
    pub threads: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct StressSummary {
    pub machines: usize,
    pub events: usize,
    pub applied: usize,
    pub rejected: usize,
    pub errors: usize,
    pub freed: usize,
    pub leaked: usize,
    pub elapsed_ms: u128,
}

impl AddAssign for StressSummary {
    fn add_assign(&mut self, other: Self) {
        self.machines += other.machines;
        self.events += other.events;
        self.applied += other.applied;
        self.rejected += other.rejected;
        self.errors += other.errors;
        self.freed += other.freed;
    }
}

impl fmt::Display for StressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "machines: {}", self.machines)?;
        writeln!(f, "events:   {}", self.events)?;
        writeln!(f, "applied:  {}", self.applied)?;
        writeln!(f, "rejected: {}", self.rejected)?;
        writeln!(f, "errors:   {}", self.errors)?;
        writeln!(f, "freed:    {}", self.freed)?;
        writeln!(f, "leaked:   {}", self.leaked)?;
        write!(f, "elapsed:  {} ms", self.elapsed_ms)
    }
}

pub fn run(args: StressArgs, config: &PhenoConfig, format: OutputFormat) -> Result<()> {
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }
    let StressArgs {
        iterations,
        events,
        threads,
    } = args;
    let allocator = Arc::new(ZonedAllocator::new(config.allocator.clone()));
    let start = Instant::now();

    let partials = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                let allocator = Arc::clone(&allocator);
                let indices = (worker..iterations).step_by(threads);
                s.spawn(move || {
                    let mut summary = StressSummary::default();
                    for index in indices {
                        summary += drive(&allocator, config, index, events);
                    }
                    summary
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| anyhow!("stress worker panicked")))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut summary = StressSummary::default();
    for partial in partials {
        summary += partial;
    }
    summary.leaked = allocator.live_tokens();
    summary.elapsed_ms = start.elapsed().as_millis();
    tracing::info!(
        machines = summary.machines,
        applied = summary.applied,
        leaked = summary.leaked,
        "stress run finished"
    );

    output::print(&summary, format);
    if summary.leaked > 0 {
        bail!("{} tokens were not released", summary.leaked);
    }
    Ok(())
}

fn drive(
    allocator: &Arc<ZonedAllocator>,
    config: &PhenoConfig,
    index: usize,
    events: usize,
) -> StressSummary {
    let machine = StateMachine::builder(allocator.clone())
        .config(config)
        .build();
    machine.initialize();

    let mut summary = StressSummary {
        machines: 1,
        events,
        ..StressSummary::default()
    };
    for step in 0..events {
        if machine.state() == State::Active && step % 2 == 0 {
            machine.record_failure();
        }
        let event = Event::ALL[(index + step * EVENT_STRIDE) % Event::ALL.len()];
        match machine.step(event) {
            Ok(true) => summary.applied += 1,
            Ok(false) => summary.rejected += 1,
            Err(_) => summary.errors += 1,
        }
    }
    if machine.state() == State::Freed {
        summary.freed += 1;
    }
    machine.destroy();
    summary
}
