//! Game loader bootstrap.
//!
//! ## Architecture
//!
//! Three cooperating machines, each gated on the one below it:
//!
//! ```text
//! Session (outer coordinator):
//!   Init → WaitForInner ⟲ → LoadVisuals → PostInit → Complete
//!             │                                  └─ push session UI state
//!             └─ drives ↓ until complete
//! Game manager:
//!   PreInit → FirstInit ⟲ → WaitSecond → ThirdInit ⟲ → PostInit → FinishInit → Complete
//!      │                                    │
//!      └─ create + start ↓                  └─ drives ↓, then polls session ready
//! Game type:
//!   InitializeFirst → WaitSecond → LoadVisuals → PostInitialize → Complete
//! ```
//!
//! `⟲` marks stages that may be revisited. Every stage action receives the
//! [`Subsystems`] context explicitly.

mod game_type;
mod manager;
mod metrics;
mod options;
mod session;
mod subsystems;
#[cfg(test)]
mod testing;

pub use game_type::{GAME_TYPE_MACHINE, GameTypeMachine, GameTypeStage, game_type_machine};
pub use manager::{MANAGER_MACHINE, ManagerMachine, ManagerRunner, ManagerStage, manager_machine};
pub use metrics::LoaderMetrics;
pub use options::{Capability, LoaderOptions, LoggingOptions, ObjectTypeSpec};
pub use session::{SESSION_MACHINE, SessionMachine, SessionRunner, SessionStage, session_machine};
pub use subsystems::{LifecycleEvent, LoaderContext, SubModule, SubModuleSet, Subsystems};

use crate::machine::{Bootstrap, CompletionHandle, Progress, Stage};
use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use std::sync::Arc;

/// How the player left a loaded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Done,
    Cancel,
}

/// Entry point: owns the session machine and, through it, the whole hierarchy.
///
/// The host calls [`GameLoader::advance`] once per tick until
/// [`GameLoader::is_complete`]; each call runs exactly one session stage.
///
/// # Example
///
/// ```rust,no_run
/// # fn example(engine: &mut bootstage::LoaderContext) -> Result<(), bootstage::BootstrapError> {
/// use bootstage::{GameLoader, LoaderOptions, SessionExit};
///
/// let mut loader = GameLoader::new(LoaderOptions::default())?;
/// while !loader.is_complete() {
///     loader.advance(engine)?;
/// }
/// loader.close(SessionExit::Done, engine)?;
/// # Ok(())
/// # }
/// ```
pub struct GameLoader {
    options: Arc<LoaderOptions>,
    machine: SessionMachine,
    closed: bool,
}

impl GameLoader {
    /// Validate options and build the session machine on its first stage.
    pub fn new(options: LoaderOptions) -> BootstrapResult<Self> {
        options.sanitize()?;
        let options = Arc::new(options);

        tracing::trace!(
            module = %options.module_name,
            max_revisits = ?options.revisit_policy.max_revisits,
            steps_per_visit = options.drive_policy.steps_per_visit,
            "GameLoader::new called"
        );

        Ok(Self {
            machine: session_machine(&options),
            options,
            closed: false,
        })
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Run one session stage.
    pub fn advance(&mut self, subsystems: &mut LoaderContext) -> BootstrapResult<SessionStage> {
        self.step_session(subsystems)?;
        Ok(self.machine.current())
    }

    fn step_session(&mut self, subsystems: &mut LoaderContext) -> BootstrapResult<Progress> {
        let was_complete = self.machine.is_complete();
        let progress = self.machine.step(subsystems)?;
        if progress == Progress::Complete && !was_complete {
            self.metrics().log_init_stages();
        }
        Ok(progress)
    }

    pub fn stage(&self) -> SessionStage {
        self.machine.current()
    }

    pub fn manager_stage(&self) -> Option<ManagerStage> {
        self.machine.runner().manager().map(|m| m.current())
    }

    pub fn game_type_stage(&self) -> Option<GameTypeStage> {
        self.machine
            .runner()
            .manager()
            .and_then(|m| m.runner().game_type())
            .map(|g| g.current())
    }

    pub fn is_complete(&self) -> bool {
        self.machine.is_complete()
    }

    pub fn completion_handle(&self) -> CompletionHandle {
        self.machine.completion_handle()
    }

    pub fn metrics(&self) -> LoaderMetrics {
        let manager = self.machine.runner().manager();
        LoaderMetrics {
            session: self.machine.metrics().clone(),
            manager: manager.map(|m| m.metrics().clone()),
            game_type: manager
                .and_then(|m| m.runner().game_type())
                .map(|g| g.metrics().clone()),
        }
    }

    /// Leave the loaded session, popping the state pushed on completion.
    pub fn close(&mut self, exit: SessionExit, subsystems: &mut LoaderContext) -> BootstrapResult<()> {
        if !self.is_complete() {
            return Err(BootstrapError::Internal(format!(
                "cannot close session while loading (stage {})",
                self.stage().name()
            )));
        }
        if self.closed {
            return Err(BootstrapError::Internal("session already closed".into()));
        }

        subsystems.pop_ui_state();
        self.closed = true;
        tracing::info!(exit = ?exit, state = %self.options.session_state, "Session closed");
        Ok(())
    }
}

impl Bootstrap<LoaderContext> for GameLoader {
    fn name(&self) -> &str {
        self.machine.name()
    }

    fn stage_name(&self) -> &'static str {
        self.stage().name()
    }

    fn step(&mut self, ctx: &mut LoaderContext) -> BootstrapResult<Progress> {
        self.step_session(ctx)
    }

    fn is_complete(&self) -> bool {
        self.machine.is_complete()
    }
}

impl std::fmt::Debug for GameLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoader")
            .field("stage", &self.stage())
            .field("manager_stage", &self.manager_stage())
            .field("game_type_stage", &self.game_type_stage())
            .field("closed", &self.closed)
            .finish()
    }
}
