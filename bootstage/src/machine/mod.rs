//! Generic staged bootstrap machinery.
//!
//! This module provides the re-entrant state machine that every loader level
//! is built from:
//! - Ordered, closed stage enumerations with a terminal marker
//! - Runners that execute one stage per call and pick the next stage
//! - Gated stages that hold until a child machine completes
//!
//! ## Architecture
//!
//! ```text
//! Host tick → BootstrapMachine::advance → StageRunner::run_stage → Transition
//!
//! - Stage: ordered tag; the machine only ever moves forward or holds
//! - StageRunner: bound action per stage, returns Advance(next) | Wait | Working | Fatal
//! - BootstrapMachine: owns the current stage, one stage action per advance()
//! - GatedStage: a stage that drives a child machine and waits for it
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use bootstage::machine::{BootstrapMachine, StageTable, Transition};
//!
//! let table = StageTable::<Step, Ctx>::new()
//!     .on(Step::Load, |ctx| Transition::advance_if(ctx.loaded(), Step::Done));
//!
//! let mut machine = BootstrapMachine::new("loader", table);
//! while !machine.is_complete() {
//!     machine.advance(&mut ctx)?;
//! }
//! ```

mod gated;
#[allow(clippy::module_inception)]
mod machine;
mod metrics;
mod runner;
mod stage;

pub use gated::{DrivePolicy, GatedStage};
pub use machine::{Bootstrap, BootstrapMachine, CompletionHandle, Progress, RevisitPolicy};
pub use metrics::{MachineMetrics, StageMetrics};
pub use runner::{StageHandler, StageRunner, StageTable};
pub use stage::{Stage, Transition};
