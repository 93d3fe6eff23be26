//! Error taxonomy for staged bootstrap.
//!
//! "Not ready yet" is not an error: a stage that must be polled again reports
//! it through its transition.

use thiserror::Error;

/// Result alias used across the bootstage crates.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A required static data set could not be loaded. The bootstrap is over.
    #[error("failed to load required data '{selector}': {reason}")]
    FatalConfiguration { selector: String, reason: String },

    /// A stage was revisited more times than its machine allows.
    #[error("machine '{machine}' stalled on stage {stage} after {visits} revisits")]
    Stalled {
        machine: String,
        stage: String,
        visits: u32,
    },

    /// The host gave up driving a machine that had not completed.
    #[error("machine '{machine}' still on stage {stage} after {ticks} host ticks")]
    TickBudgetExhausted {
        machine: String,
        stage: String,
        ticks: u64,
    },

    /// The machine already failed and refuses further work.
    #[error("machine '{machine}' was aborted by an earlier fatal error")]
    Aborted { machine: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("subsystem error: {0}")]
    Subsystem(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BootstrapError {
    /// Shorthand for a failed static data load.
    pub fn fatal_config(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FatalConfiguration {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}
