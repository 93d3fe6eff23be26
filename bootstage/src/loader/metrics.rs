//! Loader metrics aggregated across the three machine levels.

use crate::machine::MachineMetrics;
use serde::Serialize;

/// Snapshot of per-stage visits and timings for every machine created so far.
///
/// Nested machines are `None` until their parent has created them.
#[derive(Debug, Clone, Serialize)]
pub struct LoaderMetrics {
    pub session: MachineMetrics,
    pub manager: Option<MachineMetrics>,
    pub game_type: Option<MachineMetrics>,
}

impl LoaderMetrics {
    /// Stage visits summed over all machines.
    pub fn total_visits(&self) -> u32 {
        self.machines().map(MachineMetrics::total_visits).sum()
    }

    pub fn machines(&self) -> impl Iterator<Item = &MachineMetrics> {
        std::iter::once(&self.session)
            .chain(self.manager.as_ref())
            .chain(self.game_type.as_ref())
    }

    pub fn log_init_stages(&self) {
        for machine in self.machines() {
            machine.log_stages();
        }
        tracing::info!(
            session_ms = self.session.total_duration_ms,
            manager_ms = self.manager.as_ref().and_then(|m| m.total_duration_ms),
            game_type_ms = self.game_type.as_ref().and_then(|m| m.total_duration_ms),
            visits = self.total_visits(),
            "Loader bootstrap metrics"
        );
    }
}
