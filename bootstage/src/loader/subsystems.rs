//! Boundary to the engine services the loader stages call into.
//!
//! The loader never implements these; a host wires real engine services in,
//! tests wire recording stubs.

use super::options::{Capability, ObjectTypeSpec};
use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use std::path::Path;

/// Game manager callbacks fired during game type setup, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleEvent {
    /// Models are registered; the game is about to be built.
    GameStart,
    BeginGameStart,
    /// Static data is loaded and non-ready objects are gone.
    NewCampaignStart,
    AfterCampaignStart,
    InitializationFinished,
}

/// Engine services invoked by stage actions.
///
/// This is the context object handed to every stage: nothing in the loader
/// reaches for process-wide game or session handles.
pub trait Subsystems {
    /// Load a named configuration/content set. Failure ends the bootstrap.
    fn load_static_data(&mut self, selector: &str) -> BootstrapResult<()>;

    /// Load a localized text file.
    fn load_game_texts(&mut self, path: &Path) -> BootstrapResult<()>;

    /// Register a behavior/model object into the shared registry.
    fn register_capability(&mut self, capability: &Capability);

    fn register_object_type(&mut self, object_type: &ObjectTypeSpec);

    /// Drop registry objects that were referenced but never loaded.
    fn unregister_non_ready_objects(&mut self) {}

    /// Game manager lifecycle callback.
    fn on_lifecycle(&mut self, _event: LifecycleEvent) {}

    /// Run every listed subordinate initializer; `true` iff all succeeded.
    ///
    /// Called again with the same full list after any failure.
    fn run_subordinate_initializers(&mut self, initializers: &[Capability]) -> bool;

    /// Begin the playable session. Called once.
    fn start_session(&mut self);

    /// Completion predicate for the session start.
    fn poll_session_ready(&mut self) -> bool;

    /// Visual/resource finalization once the game manager is done.
    fn finalize_visuals(&mut self) {}

    fn push_ui_state(&mut self, state: &str);

    fn pop_ui_state(&mut self);
}

/// Context handed to every loader stage action.
pub type LoaderContext = dyn Subsystems;

/// Load `selector`, reporting any failure as a fatal configuration error.
pub(crate) fn load_required(ctx: &mut LoaderContext, selector: &str) -> BootstrapResult<()> {
    ctx.load_static_data(selector).map_err(|e| match e {
        BootstrapError::FatalConfiguration { .. } => e,
        other => BootstrapError::fatal_config(selector, other.to_string()),
    })
}

/// One independent subordinate initializer.
pub trait SubModule {
    fn name(&self) -> &str;

    /// Attempt this initializer's loading work; `false` means "not yet".
    fn do_loading(&mut self) -> bool;
}

/// Batch of subordinate initializers addressed by name.
///
/// Every requested initializer runs on every call, even after one has
/// reported failure, and the batch succeeds only if all of them did.
#[derive(Default)]
pub struct SubModuleSet {
    modules: Vec<Box<dyn SubModule>>,
}

impl SubModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, module: Box<dyn SubModule>) {
        self.modules.push(module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn run(&mut self, requested: &[Capability]) -> bool {
        let mut all_ready = true;
        for name in requested {
            match self.modules.iter_mut().find(|m| m.name() == name.as_str()) {
                Some(module) => {
                    let ready = module.do_loading();
                    if !ready {
                        tracing::trace!(sub_module = %name, "Sub-module not ready");
                    }
                    all_ready &= ready;
                }
                None => {
                    tracing::warn!(sub_module = %name, "Requested sub-module is not registered");
                    all_ready = false;
                }
            }
        }
        all_ready
    }
}

impl std::fmt::Debug for SubModuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.name()))
            .finish()
    }
}
