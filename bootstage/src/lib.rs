//! Staged, re-entrant bootstrap for game module loading.
//!
//! A [`GameLoader`] is advanced once per host tick. Each advance runs one
//! stage of the session machine, which in turn drives the game manager and
//! game type machines through gated stages. See [`loader`] for the hierarchy
//! and [`machine`] for the generic machinery it is built from.

pub mod host;
pub mod loader;
pub mod machine;

pub use bootstage_shared::{BootstrapError, BootstrapResult};
pub use host::{DriveReport, TickDriver, TickOptions};
pub use loader::{
    Capability, GameLoader, GameTypeStage, LifecycleEvent, LoaderContext, LoaderMetrics,
    LoaderOptions, LoggingOptions, ManagerStage, ObjectTypeSpec, SessionExit, SessionStage,
    SubModule, SubModuleSet, Subsystems,
};
pub use machine::{
    Bootstrap, BootstrapMachine, CompletionHandle, DrivePolicy, Progress, RevisitPolicy, Stage,
    StageRunner, StageTable, Transition,
};

use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "bootstage.log";

/// Keeps the file writer alive for the life of the process.
static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `options.level`. With `log_dir` set,
/// events are also written to a daily rolling file in that directory.
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_logging(options: &LoggingOptions) -> BootstrapResult<()> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.level))
        .map_err(|e| {
            BootstrapError::Config(format!("invalid log level '{}': {}", options.level, e))
        })?;

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A host that installed its own subscriber keeps it.
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(file_layer)
        .try_init()
        .is_ok();

    let _ = LOG_GUARD.set(guard);

    tracing::debug!(
        installed,
        level = %options.level,
        log_dir = ?options.log_dir,
        "Logging initialized"
    );
    Ok(())
}
