//! Shared stub subsystems for loader integration tests.

#![allow(dead_code)]

use bootstage::{
    BootstrapError, BootstrapResult, Capability, LifecycleEvent, LoaderContext, ObjectTypeSpec,
    SubModule, SubModuleSet, Subsystems,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Shared, ordered record of subsystem calls.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Sub-module that logs each attempt and fails a fixed number of times.
pub struct LoggedModule {
    name: String,
    failures: u32,
    log: EventLog,
}

impl SubModule for LoggedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_loading(&mut self) -> bool {
        self.log.lock().push(format!("load:{}", self.name));
        if self.failures == 0 {
            return true;
        }
        self.failures -= 1;
        false
    }
}

pub struct StubSubsystems {
    pub log: EventLog,
    pub modules: SubModuleSet,
    pub not_ready_polls: u32,
    pub fail_selector: Option<String>,
    pub ui_stack: Vec<String>,
}

impl StubSubsystems {
    /// Stub whose sub-modules are all ready on their first visit.
    pub fn new(sub_modules: &[&str]) -> Self {
        Self::with_failures(&sub_modules.iter().map(|n| (*n, 0)).collect::<Vec<_>>())
    }

    /// Stub with per-module failure counts.
    pub fn with_failures(sub_modules: &[(&str, u32)]) -> Self {
        let log = EventLog::default();
        let mut modules = SubModuleSet::new();
        for (name, failures) in sub_modules {
            modules.push(Box::new(LoggedModule {
                name: name.to_string(),
                failures: *failures,
                log: Arc::clone(&log),
            }));
        }
        Self {
            log,
            modules,
            not_ready_polls: 0,
            fail_selector: None,
            ui_stack: Vec::new(),
        }
    }

    pub fn ctx(&mut self) -> &mut LoaderContext {
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.log.lock().iter().position(|e| e == event)
    }

    fn record(&self, event: String) {
        self.log.lock().push(event);
    }
}

impl Subsystems for StubSubsystems {
    fn load_static_data(&mut self, selector: &str) -> BootstrapResult<()> {
        self.record(format!("data:{}", selector));
        if self.fail_selector.as_deref() == Some(selector) {
            return Err(BootstrapError::Subsystem(format!("{} missing", selector)));
        }
        Ok(())
    }

    fn load_game_texts(&mut self, path: &Path) -> BootstrapResult<()> {
        self.record(format!("texts:{}", path.display()));
        Ok(())
    }

    fn register_capability(&mut self, capability: &Capability) {
        self.record(format!("capability:{}", capability));
    }

    fn register_object_type(&mut self, object_type: &ObjectTypeSpec) {
        self.record(format!("object_type:{}", object_type.name));
    }

    fn unregister_non_ready_objects(&mut self) {
        self.record("unregister_non_ready".to_string());
    }

    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        self.record(format!("lifecycle:{:?}", event));
    }

    fn run_subordinate_initializers(&mut self, initializers: &[Capability]) -> bool {
        let names: Vec<_> = initializers.iter().map(Capability::as_str).collect();
        self.record(format!("batch:{}", names.join(",")));
        self.modules.run(initializers)
    }

    fn start_session(&mut self) {
        self.record("start_session".to_string());
    }

    fn poll_session_ready(&mut self) -> bool {
        self.record("poll_ready".to_string());
        if self.not_ready_polls == 0 {
            return true;
        }
        self.not_ready_polls -= 1;
        false
    }

    fn finalize_visuals(&mut self) {
        self.record("finalize_visuals".to_string());
    }

    fn push_ui_state(&mut self, state: &str) {
        self.record(format!("push:{}", state));
        self.ui_stack.push(state.to_string());
    }

    fn pop_ui_state(&mut self) {
        self.record("pop".to_string());
        self.ui_stack.pop();
    }
}
