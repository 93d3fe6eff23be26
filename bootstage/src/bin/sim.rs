//! Headless loader simulation.
//!
//! Drives a [`GameLoader`] against in-memory subsystems on a fixed tick and
//! prints the drive report and per-stage metrics as JSON.

use anyhow::Context;
use bootstage::{
    Capability, GameLoader, LoaderContext, LoaderMetrics, LoaderOptions, ObjectTypeSpec,
    SessionExit, SubModule, SubModuleSet, Subsystems, TickDriver, TickOptions,
};
use bootstage::{BootstrapError, BootstrapResult, DriveReport};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "bootstage-sim", version, about = "Simulate a staged game module load")]
struct Args {
    /// Loader options file (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between advances.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Fail if loading has not completed after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Number of session readiness polls answered "not yet".
    #[arg(long, default_value_t = 2)]
    not_ready_polls: u32,

    /// Number of visits each sub-module reports "not yet" before loading.
    #[arg(long, default_value_t = 1)]
    failing_visits: u32,

    /// Static data selector that fails to load.
    #[arg(long)]
    missing_selector: Option<String>,

    /// Log filter, overriding the options file.
    #[arg(long)]
    log_level: Option<String>,
}

/// Sub-module that needs a number of visits before it is ready.
struct SimulatedModule {
    name: String,
    remaining: u32,
}

impl SubModule for SimulatedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_loading(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

#[derive(Debug, Default, Serialize)]
struct SimulatedState {
    static_data: Vec<String>,
    game_texts: usize,
    capabilities: usize,
    object_types: usize,
    session_started: bool,
    visuals_finalized: bool,
    ui_stack: Vec<String>,
}

struct SimulatedSubsystems {
    modules: SubModuleSet,
    not_ready_polls: u32,
    missing_selector: Option<String>,
    state: SimulatedState,
}

impl SimulatedSubsystems {
    fn new(options: &LoaderOptions, args: &Args) -> Self {
        let mut modules = SubModuleSet::new();
        for name in &options.sub_modules {
            modules.push(Box::new(SimulatedModule {
                name: name.as_str().to_string(),
                remaining: args.failing_visits,
            }));
        }

        Self {
            modules,
            not_ready_polls: args.not_ready_polls,
            missing_selector: args.missing_selector.clone(),
            state: SimulatedState::default(),
        }
    }
}

impl Subsystems for SimulatedSubsystems {
    fn load_static_data(&mut self, selector: &str) -> BootstrapResult<()> {
        if self.missing_selector.as_deref() == Some(selector) {
            return Err(BootstrapError::Subsystem(format!(
                "no data registered for '{}'",
                selector
            )));
        }
        tracing::debug!(selector, "Static data loaded");
        self.state.static_data.push(selector.to_string());
        Ok(())
    }

    fn load_game_texts(&mut self, path: &Path) -> BootstrapResult<()> {
        tracing::trace!(path = %path.display(), "Game texts loaded");
        self.state.game_texts += 1;
        Ok(())
    }

    fn register_capability(&mut self, capability: &Capability) {
        tracing::trace!(%capability, "Capability registered");
        self.state.capabilities += 1;
    }

    fn register_object_type(&mut self, object_type: &ObjectTypeSpec) {
        tracing::trace!(
            name = %object_type.name,
            type_id = object_type.type_id,
            "Object type registered"
        );
        self.state.object_types += 1;
    }

    fn run_subordinate_initializers(&mut self, initializers: &[Capability]) -> bool {
        self.modules.run(initializers)
    }

    fn start_session(&mut self) {
        self.state.session_started = true;
    }

    fn poll_session_ready(&mut self) -> bool {
        if self.not_ready_polls == 0 {
            return true;
        }
        self.not_ready_polls -= 1;
        false
    }

    fn finalize_visuals(&mut self) {
        self.state.visuals_finalized = true;
    }

    fn push_ui_state(&mut self, state: &str) {
        self.state.ui_stack.push(state.to_string());
    }

    fn pop_ui_state(&mut self) {
        self.state.ui_stack.pop();
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    report: DriveReport,
    metrics: LoaderMetrics,
    subsystems: &'a SimulatedState,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => LoaderOptions::from_file(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => LoaderOptions::default(),
    };
    if let Some(level) = &args.log_level {
        options.logging.level = level.clone();
    }
    bootstage::init_logging(&options.logging)?;

    let mut subsystems = SimulatedSubsystems::new(&options, &args);
    let mut loader = GameLoader::new(options)?;
    let driver = TickDriver::new(TickOptions {
        tick_ms: args.tick_ms,
        max_ticks: args.max_ticks,
    });

    let ctx: &mut LoaderContext = &mut subsystems;
    let report = driver
        .drive(&mut loader, &mut *ctx)
        .await
        .with_context(|| format!("loading stopped ({:?})", loader))?;
    loader.close(SessionExit::Done, &mut *ctx)?;

    let summary = Summary {
        report,
        metrics: loader.metrics(),
        subsystems: &subsystems.state,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
