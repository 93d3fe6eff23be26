//! Stage definition for staged bootstrap machines.

use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use std::fmt::Debug;

/// An ordered, closed set of named stages.
///
/// Declaration order is the progress order: implementors derive `Ord` on a
/// fieldless enum, list the first stage first and the terminal marker last.
pub trait Stage: Copy + Ord + Debug + 'static {
    /// Stage a freshly created machine starts on.
    const INITIAL: Self;

    /// Marker meaning "bootstrap complete". Runners are never invoked on it.
    const TERMINAL: Self;

    /// Human-readable stage name for logging and metrics.
    fn name(self) -> &'static str;

    fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }
}

/// Outcome of running one stage.
#[derive(Debug)]
pub enum Transition<S> {
    /// Move to a strictly later stage.
    Advance(S),
    /// Not ready yet: keep the current stage and call again later.
    Wait,
    /// Keep the current stage, but the action made progress this visit
    /// (a gated child advanced). Not counted as a revisit.
    Working,
    /// Unrecoverable failure: the machine aborts.
    Fatal(BootstrapError),
}

impl<S> Transition<S> {
    /// Advance to `next` when `ready`, otherwise hold the current stage.
    pub fn advance_if(ready: bool, next: S) -> Self {
        if ready {
            Self::Advance(next)
        } else {
            Self::Wait
        }
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Self::Wait)
    }

    /// Whether the machine stays on its current stage.
    pub fn holds(&self) -> bool {
        matches!(self, Self::Wait | Self::Working)
    }
}

/// Lets stage actions use `?` internally and hand back a plain transition.
impl<S> From<BootstrapResult<Transition<S>>> for Transition<S> {
    fn from(result: BootstrapResult<Transition<S>>) -> Self {
        result.unwrap_or_else(Transition::Fatal)
    }
}
