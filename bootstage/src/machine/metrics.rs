use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct StageMetrics {
    pub stage: &'static str,
    /// Number of times the stage action ran (1 + revisits).
    pub visits: u32,
    /// Cumulative time spent inside the stage action.
    pub duration_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineMetrics {
    pub machine: String,
    /// Time from the first advance to reaching the terminal stage.
    pub total_duration_ms: Option<u64>,
    /// Stages in the order they were first visited.
    pub stages: Vec<StageMetrics>,
}

impl MachineMetrics {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            total_duration_ms: None,
            stages: Vec::new(),
        }
    }

    pub fn visits(&self, stage: &str) -> u32 {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.visits)
            .unwrap_or(0)
    }

    pub fn total_visits(&self) -> u32 {
        self.stages.iter().map(|s| s.visits).sum()
    }

    pub(crate) fn record_visit(&mut self, stage: &'static str, elapsed: Duration) {
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        match self.stages.iter_mut().find(|s| s.stage == stage) {
            Some(entry) => {
                entry.visits = entry.visits.saturating_add(1);
                entry.duration_us = entry.duration_us.saturating_add(elapsed_us);
            }
            None => self.stages.push(StageMetrics {
                stage,
                visits: 1,
                duration_us: elapsed_us,
            }),
        }
    }

    pub(crate) fn set_total_duration(&mut self, elapsed: Duration) {
        self.total_duration_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    }

    /// Emit one debug event per visited stage.
    pub fn log_stages(&self) {
        for stage in &self.stages {
            tracing::debug!(
                machine = %self.machine,
                stage = stage.stage,
                visits = stage.visits,
                duration_us = stage.duration_us,
                "Stage metrics"
            );
        }
    }
}
