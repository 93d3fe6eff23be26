//! Session bootstrap: the outer coordinator.
//!
//! Its single gated stage, WaitForInner, drives the game manager machine and
//! only lets the session move on once the manager reports completion.

use super::manager::{ManagerMachine, manager_machine};
use super::options::LoaderOptions;
use super::subsystems::LoaderContext;
use crate::machine::{BootstrapMachine, GatedStage, Stage, StageRunner, Transition};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionStage {
    Init,
    WaitForInner,
    LoadVisuals,
    PostInit,
    Complete,
}

impl Stage for SessionStage {
    const INITIAL: Self = SessionStage::Init;
    const TERMINAL: Self = SessionStage::Complete;

    fn name(self) -> &'static str {
        match self {
            SessionStage::Init => "Init",
            SessionStage::WaitForInner => "WaitForInner",
            SessionStage::LoadVisuals => "LoadVisuals",
            SessionStage::PostInit => "PostInit",
            SessionStage::Complete => "Complete",
        }
    }
}

pub type SessionMachine = BootstrapMachine<SessionStage, SessionRunner>;

pub const SESSION_MACHINE: &str = "session";

pub struct SessionRunner {
    options: Arc<LoaderOptions>,
    manager: GatedStage<ManagerMachine>,
}

impl SessionRunner {
    pub fn new(options: Arc<LoaderOptions>) -> Self {
        let manager = GatedStage::new(options.drive_policy);
        Self { options, manager }
    }

    /// The game manager machine, once Init has created it.
    pub fn manager(&self) -> Option<&ManagerMachine> {
        self.manager.child()
    }
}

impl StageRunner<SessionStage, LoaderContext> for SessionRunner {
    fn run_stage(
        &mut self,
        stage: SessionStage,
        ctx: &mut LoaderContext,
    ) -> Transition<SessionStage> {
        match stage {
            SessionStage::Init => {
                self.manager.attach(manager_machine(&self.options));
                tracing::debug!(
                    module = %self.options.module_name,
                    sub_modules = self.options.sub_modules.len(),
                    "Game manager created"
                );
                Transition::Advance(SessionStage::WaitForInner)
            }
            SessionStage::WaitForInner => self.manager.poll(ctx, SessionStage::LoadVisuals),
            SessionStage::LoadVisuals => {
                ctx.finalize_visuals();
                Transition::Advance(SessionStage::PostInit)
            }
            SessionStage::PostInit => {
                ctx.push_ui_state(&self.options.session_state);
                Transition::Advance(SessionStage::Complete)
            }
            SessionStage::Complete => unreachable!("runner invoked on terminal stage"),
        }
    }
}

/// Build the session machine, not yet started.
///
/// The session's only wait is the gate on the manager, so it carries no
/// revisit limit of its own: a stalled manager trips its own limit and the
/// error reaches the session through the gate.
pub fn session_machine(options: &Arc<LoaderOptions>) -> SessionMachine {
    BootstrapMachine::new(SESSION_MACHINE, SessionRunner::new(Arc::clone(options)))
}
