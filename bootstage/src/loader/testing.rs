//! Recording subsystems for loader unit tests.

use super::options::{Capability, ObjectTypeSpec};
use super::subsystems::{LifecycleEvent, LoaderContext, Subsystems};
use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    LoadStaticData(String),
    LoadGameTexts(PathBuf),
    RegisterCapability(String),
    RegisterObjectType(String),
    UnregisterNonReady,
    Lifecycle(LifecycleEvent),
    RunSubordinate(Vec<String>),
    StartSession,
    PollSessionReady,
    FinalizeVisuals,
    PushUiState(String),
    PopUiState,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSubsystems {
    pub calls: Vec<Call>,
    /// Selector whose load fails.
    pub failing_selector: Option<String>,
    /// Answers for successive initializer batches; `true` once exhausted.
    pub initializer_results: VecDeque<bool>,
    /// Answers for successive readiness polls; `true` once exhausted.
    pub ready_results: VecDeque<bool>,
}

impl RecordingSubsystems {
    pub fn ctx(&mut self) -> &mut LoaderContext {
        self
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| matches(c)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

impl Subsystems for RecordingSubsystems {
    fn load_static_data(&mut self, selector: &str) -> BootstrapResult<()> {
        self.calls.push(Call::LoadStaticData(selector.to_string()));
        if self.failing_selector.as_deref() == Some(selector) {
            return Err(BootstrapError::fatal_config(selector, "stub failure"));
        }
        Ok(())
    }

    fn load_game_texts(&mut self, path: &Path) -> BootstrapResult<()> {
        self.calls.push(Call::LoadGameTexts(path.to_path_buf()));
        Ok(())
    }

    fn register_capability(&mut self, capability: &Capability) {
        self.calls
            .push(Call::RegisterCapability(capability.as_str().to_string()));
    }

    fn register_object_type(&mut self, object_type: &ObjectTypeSpec) {
        self.calls
            .push(Call::RegisterObjectType(object_type.name.clone()));
    }

    fn unregister_non_ready_objects(&mut self) {
        self.calls.push(Call::UnregisterNonReady);
    }

    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        self.calls.push(Call::Lifecycle(event));
    }

    fn run_subordinate_initializers(&mut self, initializers: &[Capability]) -> bool {
        self.calls.push(Call::RunSubordinate(
            initializers.iter().map(|c| c.as_str().to_string()).collect(),
        ));
        self.initializer_results.pop_front().unwrap_or(true)
    }

    fn start_session(&mut self) {
        self.calls.push(Call::StartSession);
    }

    fn poll_session_ready(&mut self) -> bool {
        self.calls.push(Call::PollSessionReady);
        self.ready_results.pop_front().unwrap_or(true)
    }

    fn finalize_visuals(&mut self) {
        self.calls.push(Call::FinalizeVisuals);
    }

    fn push_ui_state(&mut self, state: &str) {
        self.calls.push(Call::PushUiState(state.to_string()));
    }

    fn pop_ui_state(&mut self) {
        self.calls.push(Call::PopUiState);
    }
}
