//! Host-side tick loop.
//!
//! The loader never blocks: the host advances it once per tick and keeps
//! rendering in between. [`TickDriver`] is that loop for headless hosts and
//! tests, either paced by a tokio interval or run back to back.

use crate::machine::{Bootstrap, Progress};
use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickOptions {
    /// Interval between advances.
    pub tick_ms: u64,
    /// Give up after this many ticks. `None` drives until completion.
    pub max_ticks: Option<u64>,
}

impl Default for TickOptions {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_ticks: None,
        }
    }
}

/// Outcome of driving a machine to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriveReport {
    pub ticks: u64,
    /// Ticks on which the machine stayed on its stage.
    pub held_ticks: u64,
    pub elapsed_ms: u64,
}

pub struct TickDriver {
    options: TickOptions,
}

impl TickDriver {
    pub fn new(options: TickOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> TickOptions {
        self.options
    }

    /// Advance once per interval tick until the machine completes.
    pub async fn drive<B, Ctx>(&self, machine: &mut B, ctx: &mut Ctx) -> BootstrapResult<DriveReport>
    where
        B: Bootstrap<Ctx> + ?Sized,
        Ctx: ?Sized,
    {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.options.tick_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = DriveState::new();
        while !machine.is_complete() {
            ticker.tick().await;
            self.tick(machine, ctx, &mut state)?;
        }
        Ok(state.finish(machine.name()))
    }

    /// Advance back to back, without pacing, until the machine completes.
    pub fn drive_blocking<B, Ctx>(&self, machine: &mut B, ctx: &mut Ctx) -> BootstrapResult<DriveReport>
    where
        B: Bootstrap<Ctx> + ?Sized,
        Ctx: ?Sized,
    {
        let mut state = DriveState::new();
        while !machine.is_complete() {
            self.tick(machine, ctx, &mut state)?;
        }
        Ok(state.finish(machine.name()))
    }

    fn tick<B, Ctx>(&self, machine: &mut B, ctx: &mut Ctx, state: &mut DriveState) -> BootstrapResult<()>
    where
        B: Bootstrap<Ctx> + ?Sized,
        Ctx: ?Sized,
    {
        if let Some(max) = self.options.max_ticks
            && state.report.ticks >= max
        {
            tracing::warn!(
                machine = machine.name(),
                stage = machine.stage_name(),
                ticks = state.report.ticks,
                "Tick budget exhausted before completion"
            );
            return Err(BootstrapError::TickBudgetExhausted {
                machine: machine.name().to_string(),
                stage: machine.stage_name().to_string(),
                ticks: state.report.ticks,
            });
        }

        state.report.ticks += 1;
        if matches!(machine.step(ctx)?, Progress::Held | Progress::Working) {
            state.report.held_ticks += 1;
        }
        Ok(())
    }
}

struct DriveState {
    started: Instant,
    report: DriveReport,
}

impl DriveState {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            report: DriveReport::default(),
        }
    }

    fn finish(mut self, machine: &str) -> DriveReport {
        self.report.elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            machine,
            ticks = self.report.ticks,
            held_ticks = self.report.held_ticks,
            elapsed_ms = self.report.elapsed_ms,
            "Machine driven to completion"
        );
        self.report
    }
}
