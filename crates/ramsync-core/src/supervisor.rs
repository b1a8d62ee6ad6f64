//! Workload supervisor: single-shot launch-and-observe.
//!
//! [`WorkloadSupervisor::start`] spawns a task that runs the workload to
//! completion and posts its terminal [`WorkloadOutcome`] on a oneshot channel.
//! The returned [`WorkloadHandle`] is the only receiver, so the outcome is
//! observed by exactly one party, exactly once.

use std::sync::Arc;

use host_ops::ProcessLauncher;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::warn;

use crate::config::WorkloadSpec;
use crate::obs;

/// How the workload ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkloadOutcome {
    /// Ran and exited successfully.
    Exited { code: Option<i32> },

    /// Ran and exited unsuccessfully (`code` is `None` when killed by a signal).
    Failed { code: Option<i32> },

    /// Never started: identity switch failed, executable missing, ...
    LaunchFailed { reason: String },
}

impl WorkloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkloadOutcome::Exited { .. })
    }
}

impl std::fmt::Display for WorkloadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadOutcome::Exited { .. } => write!(f, "exited successfully"),
            WorkloadOutcome::Failed { code: Some(code) } => write!(f, "exited with code {}", code),
            WorkloadOutcome::Failed { code: None } => write!(f, "terminated by signal"),
            WorkloadOutcome::LaunchFailed { reason } => write!(f, "failed to launch: {}", reason),
        }
    }
}

/// Receiving end of the workload-finished signal.
#[derive(Debug)]
pub struct WorkloadHandle {
    outcome: Option<oneshot::Receiver<WorkloadOutcome>>,
}

impl WorkloadHandle {
    /// Wait for the workload to finish.
    ///
    /// Returns `None` once the outcome has already been taken. Cancel-safe:
    /// dropping the future before it resolves loses nothing, so it can sit in
    /// a `tokio::select!` next to a timer.
    pub async fn wait(&mut self) -> Option<WorkloadOutcome> {
        let rx = self.outcome.as_mut()?;
        let outcome = match rx.await {
            Ok(outcome) => outcome,
            Err(_) => WorkloadOutcome::LaunchFailed {
                reason: "workload task ended without reporting an outcome".to_string(),
            },
        };
        self.outcome = None;
        Some(outcome)
    }

    /// Whether the outcome has been taken by [`wait`](Self::wait).
    pub fn is_observed(&self) -> bool {
        self.outcome.is_none()
    }
}

pub struct WorkloadSupervisor {
    launcher: Arc<dyn ProcessLauncher>,
}

impl WorkloadSupervisor {
    pub fn new(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self { launcher }
    }

    /// Launch `spec` on its own task. Must be called within a tokio runtime.
    pub fn start(&self, spec: &WorkloadSpec) -> WorkloadHandle {
        let (tx, rx) = oneshot::channel();
        let launcher = Arc::clone(&self.launcher);
        let invocation = spec.invocation();

        tokio::spawn(async move {
            let outcome = match launcher.run(&invocation).await {
                Ok(exit) if exit.success => WorkloadOutcome::Exited { code: exit.code },
                Ok(exit) => WorkloadOutcome::Failed { code: exit.code },
                Err(e) => {
                    warn!(command = %invocation, error = %e, "Failed to execute");
                    WorkloadOutcome::LaunchFailed {
                        reason: e.to_string(),
                    }
                }
            };
            obs::emit_workload_finished(&invocation.to_string(), &outcome);
            // receiver gone means the orchestrator already bailed out
            let _ = tx.send(outcome);
        });

        WorkloadHandle { outcome: Some(rx) }
    }
}
