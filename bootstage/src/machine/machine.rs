//! Bootstrap machine driver.
//!
//! A machine owns its current stage and performs exactly one stage action per
//! `advance()`. The caller decides the pacing (typically one call per tick);
//! a stage that is not ready answers `Transition::Wait` and is simply visited
//! again on the next call.

use super::metrics::MachineMetrics;
use super::runner::StageRunner;
use super::stage::{Stage, Transition};
use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Limit on consecutive revisits of a single stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisitPolicy {
    /// `None` waits forever. `Some(n)` tolerates `n` consecutive waits on a
    /// stage and turns the next one into `BootstrapError::Stalled`.
    pub max_revisits: Option<u32>,
}

impl RevisitPolicy {
    pub fn unbounded() -> Self {
        Self { max_revisits: None }
    }

    pub fn bounded(max_revisits: u32) -> Self {
        Self {
            max_revisits: Some(max_revisits),
        }
    }
}

/// What a single step did, independent of the machine's stage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Moved to a later, non-terminal stage.
    Advanced,
    /// Stayed on the same stage.
    Held,
    /// Stayed on the same stage but made progress. Not a revisit.
    Working,
    /// The machine is (now) on its terminal stage.
    Complete,
}

/// Read-only view of a machine's completion, shareable across threads.
///
/// Written once with `Release` when the machine reaches its terminal stage,
/// read with `Acquire`.
#[derive(Debug, Clone, Default)]
pub struct CompletionHandle {
    complete: Arc<AtomicBool>,
}

impl CompletionHandle {
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }
}

/// Object-safe view of a machine: step it, ask whether it is done.
///
/// Lets a gated stage or a host loop drive machines of any stage type.
pub trait Bootstrap<Ctx: ?Sized> {
    fn name(&self) -> &str;

    /// Name of the stage the next step will run.
    fn stage_name(&self) -> &'static str;

    /// Perform exactly one stage action.
    fn step(&mut self, ctx: &mut Ctx) -> BootstrapResult<Progress>;

    fn is_complete(&self) -> bool;
}

pub struct BootstrapMachine<S: Stage, R> {
    name: String,
    current: S,
    runner: R,
    policy: RevisitPolicy,
    /// Consecutive waits on `current`.
    revisits: u32,
    aborted: bool,
    started_at: Option<Instant>,
    metrics: MachineMetrics,
    completion: CompletionHandle,
}

impl<S: Stage, R> BootstrapMachine<S, R> {
    /// Create a machine on `S::INITIAL` that waits without limit.
    pub fn new(name: impl Into<String>, runner: R) -> Self {
        Self::with_policy(name, runner, RevisitPolicy::unbounded())
    }

    pub fn with_policy(name: impl Into<String>, runner: R, policy: RevisitPolicy) -> Self {
        let name = name.into();
        Self {
            metrics: MachineMetrics::new(name.clone()),
            name,
            current: S::INITIAL,
            runner,
            policy,
            revisits: 0,
            aborted: false,
            started_at: None,
            completion: CompletionHandle::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_terminal()
    }

    /// Whether an earlier advance ended in a fatal error.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Consecutive waits on the current stage.
    pub fn revisits(&self) -> u32 {
        self.revisits
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    pub fn metrics(&self) -> &MachineMetrics {
        &self.metrics
    }

    pub fn completion_handle(&self) -> CompletionHandle {
        self.completion.clone()
    }

    /// Run the current stage's action once and store the resulting stage.
    ///
    /// On the terminal stage this is a no-op returning the terminal stage.
    /// After a fatal error every call returns `BootstrapError::Aborted`
    /// without running any action.
    ///
    /// # Panics
    ///
    /// If the runner answers `Advance` with a stage that is not strictly
    /// later than the current one.
    pub fn advance<Ctx: ?Sized>(&mut self, ctx: &mut Ctx) -> BootstrapResult<S>
    where
        R: StageRunner<S, Ctx>,
    {
        self.run_once(ctx)?;
        Ok(self.current)
    }

    fn run_once<Ctx: ?Sized>(&mut self, ctx: &mut Ctx) -> BootstrapResult<Progress>
    where
        R: StageRunner<S, Ctx>,
    {
        if self.aborted {
            return Err(BootstrapError::Aborted {
                machine: self.name.clone(),
            });
        }

        let stage = self.current;
        if stage.is_terminal() {
            tracing::trace!(machine = %self.name, "advance on completed machine ignored");
            return Ok(Progress::Complete);
        }

        let started_at = *self.started_at.get_or_insert_with(Instant::now);
        let stage_start = Instant::now();
        let transition = self.runner.run_stage(stage, ctx);
        self.metrics.record_visit(stage.name(), stage_start.elapsed());

        match transition {
            Transition::Advance(next) => {
                assert!(
                    next > stage,
                    "machine '{}' tried to move from {:?} to {:?}; stages only move forward",
                    self.name,
                    stage,
                    next
                );

                tracing::debug!(
                    machine = %self.name,
                    from = stage.name(),
                    to = next.name(),
                    "Stage advanced"
                );

                self.current = next;
                self.revisits = 0;

                if !next.is_terminal() {
                    return Ok(Progress::Advanced);
                }

                self.metrics.set_total_duration(started_at.elapsed());
                self.completion.mark_complete();
                tracing::info!(
                    machine = %self.name,
                    duration_ms = self.metrics.total_duration_ms,
                    visits = self.metrics.total_visits(),
                    "Bootstrap complete"
                );
                Ok(Progress::Complete)
            }
            Transition::Working => {
                self.revisits = 0;
                tracing::trace!(
                    machine = %self.name,
                    stage = stage.name(),
                    "Stage in progress"
                );
                Ok(Progress::Working)
            }
            Transition::Wait => {
                self.revisits = self.revisits.saturating_add(1);
                tracing::trace!(
                    machine = %self.name,
                    stage = stage.name(),
                    revisits = self.revisits,
                    "Stage not ready, will revisit"
                );

                if let Some(max) = self.policy.max_revisits
                    && self.revisits > max
                {
                    self.aborted = true;
                    tracing::error!(
                        machine = %self.name,
                        stage = stage.name(),
                        revisits = self.revisits,
                        "Revisit limit exceeded, aborting bootstrap"
                    );
                    return Err(BootstrapError::Stalled {
                        machine: self.name.clone(),
                        stage: stage.name().to_string(),
                        visits: self.revisits,
                    });
                }

                Ok(Progress::Held)
            }
            Transition::Fatal(err) => {
                self.aborted = true;
                tracing::error!(
                    machine = %self.name,
                    stage = stage.name(),
                    error = %err,
                    "Bootstrap aborted"
                );
                Err(err)
            }
        }
    }
}

impl<S, R, Ctx> Bootstrap<Ctx> for BootstrapMachine<S, R>
where
    S: Stage,
    R: StageRunner<S, Ctx>,
    Ctx: ?Sized,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_name(&self) -> &'static str {
        self.current.name()
    }

    fn step(&mut self, ctx: &mut Ctx) -> BootstrapResult<Progress> {
        self.run_once(ctx)
    }

    fn is_complete(&self) -> bool {
        self.current.is_terminal()
    }
}

impl<S: Stage, R> std::fmt::Debug for BootstrapMachine<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapMachine")
            .field("name", &self.name)
            .field("current", &self.current)
            .field("revisits", &self.revisits)
            .field("aborted", &self.aborted)
            .finish()
    }
}
