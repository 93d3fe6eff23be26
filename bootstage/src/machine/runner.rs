//! Stage runners: the per-stage actions a machine dispatches to.

use super::stage::{Stage, Transition};
use std::collections::BTreeMap;

/// Executes the action bound to one stage and decides the next stage.
///
/// `Ctx` is the explicit context handed to every stage action (the external
/// subsystems the action may call into). Runners must tolerate being invoked
/// again on a stage they answered `Transition::Wait` or `Transition::Working` for.
pub trait StageRunner<S: Stage, Ctx: ?Sized> {
    /// Run the action bound to `stage`.
    ///
    /// Never called with `S::TERMINAL`.
    fn run_stage(&mut self, stage: S, ctx: &mut Ctx) -> Transition<S>;
}

pub type StageHandler<S, Ctx> = Box<dyn FnMut(&mut Ctx) -> Transition<S>>;

/// Table-driven runner mapping each stage to a handler closure.
///
/// Every non-terminal stage the machine can reach must be bound; dispatching
/// to an unbound stage is a programming error and panics.
pub struct StageTable<S: Stage, Ctx: ?Sized> {
    handlers: BTreeMap<S, StageHandler<S, Ctx>>,
}

impl<S: Stage, Ctx: ?Sized> StageTable<S, Ctx> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Bind `handler` to `stage`, replacing any earlier binding.
    pub fn on<F>(mut self, stage: S, handler: F) -> Self
    where
        F: FnMut(&mut Ctx) -> Transition<S> + 'static,
    {
        assert!(
            !stage.is_terminal(),
            "cannot bind a handler to terminal stage {:?}",
            stage
        );
        self.handlers.insert(stage, Box::new(handler));
        self
    }

    pub fn covers(&self, stage: S) -> bool {
        self.handlers.contains_key(&stage)
    }
}

impl<S: Stage, Ctx: ?Sized> Default for StageTable<S, Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Stage, Ctx: ?Sized> StageRunner<S, Ctx> for StageTable<S, Ctx> {
    fn run_stage(&mut self, stage: S, ctx: &mut Ctx) -> Transition<S> {
        let handler = self
            .handlers
            .get_mut(&stage)
            .unwrap_or_else(|| panic!("no handler bound to stage {:?}", stage));
        handler(ctx)
    }
}

impl<S: Stage, Ctx: ?Sized> std::fmt::Debug for StageTable<S, Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageTable")
            .field("stages", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
