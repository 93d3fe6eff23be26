//! Gated stages: a stage whose progress depends on a child machine.
//!
//! ```text
//! visit:  drive child (per DrivePolicy) ──→ child complete? ──yes──→ Advance(next)
//!                                                 │
//!                                                 no ──→ child progressed? ──yes──→ Working
//!                                                                 │
//!                                                                 no ──→ Wait
//! ```
//!
//! Only visits on which the child made no progress count toward the
//! parent's revisit limit.
//!
//! The parent only sees the child's completion, never its stages.

use super::machine::{Bootstrap, Progress};
use super::stage::{Stage, Transition};
use serde::{Deserialize, Serialize};

/// How far a gated stage drives its child on each visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivePolicy {
    /// Upper bound on child steps per visit. Driving stops early when the
    /// child holds its stage or completes.
    pub steps_per_visit: u32,
}

impl DrivePolicy {
    pub fn steps(steps_per_visit: u32) -> Self {
        Self { steps_per_visit }
    }
}

impl Default for DrivePolicy {
    fn default() -> Self {
        Self::steps(1)
    }
}

/// Holds the handle to a child machine and gates on its completion.
#[derive(Debug)]
pub struct GatedStage<C> {
    child: Option<C>,
    policy: DrivePolicy,
}

impl<C> GatedStage<C> {
    /// A gate with no child attached yet.
    pub fn new(policy: DrivePolicy) -> Self {
        Self {
            child: None,
            policy,
        }
    }

    /// Attach the child machine. A gate owns exactly one child for its life.
    ///
    /// # Panics
    ///
    /// If a child is already attached.
    pub fn attach(&mut self, child: C) {
        assert!(
            self.child.is_none(),
            "gated stage already owns a child machine"
        );
        self.child = Some(child);
    }

    pub fn is_attached(&self) -> bool {
        self.child.is_some()
    }

    pub fn child(&self) -> Option<&C> {
        self.child.as_ref()
    }

    pub fn child_mut(&mut self) -> Option<&mut C> {
        self.child.as_mut()
    }

    pub fn policy(&self) -> DrivePolicy {
        self.policy
    }

    /// Drive the child, then advance to `next` once the child is complete.
    ///
    /// An incomplete child that progressed this visit yields `Working`, one
    /// that held yields `Wait`. A child error is fatal for the parent.
    ///
    /// # Panics
    ///
    /// If no child has been attached.
    pub fn poll<S, Ctx>(&mut self, ctx: &mut Ctx, next: S) -> Transition<S>
    where
        S: Stage,
        Ctx: ?Sized,
        C: Bootstrap<Ctx>,
    {
        let child = self
            .child
            .as_mut()
            .expect("gated stage polled before its child machine was attached");

        let mut progressed = false;
        for _ in 0..self.policy.steps_per_visit {
            match child.step(ctx) {
                Ok(Progress::Advanced) => progressed = true,
                Ok(Progress::Working) => {
                    progressed = true;
                    break;
                }
                Ok(Progress::Held) | Ok(Progress::Complete) => break,
                Err(e) => return Transition::Fatal(e),
            }
        }

        if child.is_complete() {
            Transition::Advance(next)
        } else if progressed {
            Transition::Working
        } else {
            Transition::Wait
        }
    }
}
