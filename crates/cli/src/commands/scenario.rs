// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `phenoctl scenario <kind>` - Run a reference scenario

use crate::output::{self, OutputFormat};
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use pheno_core::{
    Event, MachineError, MachineSnapshot, OwnerId, PhenoConfig, StateMachine, Substate,
    TokenType, ZonedAllocator,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::thread;

#[derive(Args)]
pub struct ScenarioArgs {
    /// Scenario to run
    #[arg(value_enum)]
    pub kind: ScenarioKind,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioKind {
    /// Alloc, lock, validate, write, share and free one token
    Basic,
    /// Push a token past the degrade threshold and recover it
    Degrade,
    /// Two owners contend for one token's lock
    Concurrent,
    /// Spread tokens of growing size across zones
    Zones,
}

/// One step of a scenario and the machine state after it
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub actor: String,
    pub action: String,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub machine: MachineSnapshot,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match (&self.error, self.applied) {
            (Some(_), _) => "error",
            (None, true) => "applied",
            (None, false) => "rejected",
        };
        write!(
            f,
            "{:<7} {:<16} {:<8} {}",
            self.actor, self.action, outcome, self.machine
        )?;
        if let Some(error) = &self.error {
            write!(f, "  ({})", error)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    steps: Vec<StepReport>,
}

impl Recorder {
    fn step(&mut self, machine: &StateMachine, owner: &OwnerId, event: Event) {
        let outcome = machine.step_as(event, owner);
        self.record(machine, owner, event.name(), outcome);
    }

    fn record(
        &mut self,
        machine: &StateMachine,
        owner: &OwnerId,
        action: impl Into<String>,
        outcome: Result<bool, MachineError>,
    ) {
        let (applied, error) = match outcome {
            Ok(applied) => (applied, None),
            Err(e) => (false, Some(e.to_string())),
        };
        self.steps.push(StepReport {
            actor: owner.to_string(),
            action: action.into(),
            applied,
            error,
            machine: machine.snapshot(),
        });
    }
}

pub fn run(args: ScenarioArgs, config: &PhenoConfig, format: OutputFormat) -> Result<()> {
    let steps = match args.kind {
        ScenarioKind::Basic => basic(config),
        ScenarioKind::Degrade => degrade(config),
        ScenarioKind::Concurrent => concurrent(config)?,
        ScenarioKind::Zones => zones(config),
    };
    output::print_lines(&steps, format);
    Ok(())
}

fn new_machine(allocator: &Arc<ZonedAllocator>, config: &PhenoConfig) -> StateMachine {
    let machine = StateMachine::builder(allocator.clone())
        .config(config)
        .build();
    machine.initialize();
    machine
}

fn basic(config: &PhenoConfig) -> Vec<StepReport> {
    let allocator = Arc::new(ZonedAllocator::new(config.allocator.clone()));
    let machine = new_machine(&allocator, config);
    let main = OwnerId::from("main");
    let mut rec = Recorder::default();

    for event in [Event::Alloc, Event::Lock, Event::Validate] {
        rec.step(&machine, &main, event);
    }
    let entered = machine.enter_substate(Substate::Writing);
    rec.record(&machine, &main, "SUBSTATE WRITING", Ok(entered));
    for event in [Event::Share, Event::Free] {
        rec.step(&machine, &main, event);
    }
    rec.steps
}

fn degrade(config: &PhenoConfig) -> Vec<StepReport> {
    let allocator = Arc::new(ZonedAllocator::new(config.allocator.clone()));
    let machine = new_machine(&allocator, config);
    let main = OwnerId::from("main");
    let mut rec = Recorder::default();

    for event in [Event::Alloc, Event::Lock, Event::Validate] {
        rec.step(&machine, &main, event);
    }

    // Enough failures to cross the degrade threshold
    let needed = (1..=config.degradation.max_retries)
        .find(|&n| config.degradation.should_degrade(n))
        .unwrap_or(config.degradation.max_retries);
    for _ in 0..needed {
        machine.record_failure();
    }
    rec.record(&machine, &main, format!("FAILURE x{needed}"), Ok(true));

    for event in [Event::Degrade, Event::Recover, Event::Free] {
        rec.step(&machine, &main, event);
    }
    rec.steps
}

fn concurrent(config: &PhenoConfig) -> Result<Vec<StepReport>> {
    let allocator = Arc::new(ZonedAllocator::new(config.allocator.clone()));
    let machine = new_machine(&allocator, config);
    let main = OwnerId::from("main");
    let worker = OwnerId::from("worker");
    let mut rec = Recorder::default();

    rec.step(&machine, &main, Event::Alloc);
    rec.step(&machine, &main, Event::Lock);

    // Each worker step runs on its own thread
    let on_worker = |event: Event| -> Result<Result<bool, MachineError>> {
        thread::scope(|s| {
            s.spawn(|| machine.step_as(event, &worker))
                .join()
                .map_err(|_| anyhow!("worker thread panicked"))
        })
    };

    for event in [Event::Lock, Event::Unlock] {
        let outcome = on_worker(event)?;
        rec.record(&machine, &worker, event.name(), outcome);
    }
    rec.step(&machine, &main, Event::Unlock);
    for event in [Event::Lock, Event::Validate, Event::Share] {
        let outcome = on_worker(event)?;
        rec.record(&machine, &worker, event.name(), outcome);
    }
    rec.step(&machine, &main, Event::Share);
    let outcome = on_worker(Event::Free)?;
    rec.record(&machine, &worker, Event::Free.name(), outcome);
    rec.step(&machine, &main, Event::Free);

    Ok(rec.steps)
}

fn zones(config: &PhenoConfig) -> Vec<StepReport> {
    let allocator = Arc::new(ZonedAllocator::new(config.allocator.clone()));
    let main = OwnerId::from("main");
    let mut rec = Recorder::default();

    let machines: Vec<StateMachine> = (1..=8u8)
        .map(|i| {
            let machine = StateMachine::builder(allocator.clone())
                .config(config)
                .token_size(512 * usize::from(i))
                .kind(TokenType::default().with_category(1).with_cluster_id(i))
                .build();
            machine.initialize();
            rec.step(&machine, &main, Event::Alloc);
            machine
        })
        .collect();

    for machine in machines {
        machine.destroy();
    }
    rec.steps
}
