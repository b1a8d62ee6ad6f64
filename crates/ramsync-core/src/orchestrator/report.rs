//! Summary of a run that reached the workload phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LifecyclePhase;
use crate::supervisor::WorkloadOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Correlates the log lines of one run.
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Phase the run ended in: `Unwound`, or `Failed` after a failed final
    /// checkpoint.
    pub phase: LifecyclePhase,

    /// Periodic checkpoint passes attempted (excludes the final pass).
    pub periodic_checkpoints: u64,

    /// Periodic passes that failed.
    pub failed_checkpoints: u64,

    pub workload: Option<WorkloadOutcome>,

    pub final_checkpoint_ok: bool,

    /// Every volume was unmounted.
    pub unwound: bool,

    /// Set when the final checkpoint succeeded but unmounting did not.
    pub unwind_error: Option<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            phase: LifecyclePhase::Idle,
            periodic_checkpoints: 0,
            failed_checkpoints: 0,
            workload: None,
            final_checkpoint_ok: false,
            unwound: false,
            unwind_error: None,
        }
    }

    pub fn finish(&mut self, phase: LifecyclePhase) {
        self.phase = phase;
        self.finished_at = Some(Utc::now());
    }

    pub fn successful_checkpoints(&self) -> u64 {
        self.periodic_checkpoints - self.failed_checkpoints
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
