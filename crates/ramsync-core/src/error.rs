//! Error taxonomy for the ramsync lifecycle.

use std::path::PathBuf;

use host_ops::HostError;

use crate::orchestrator::{LifecyclePhase, RunReport};

/// Errors produced while loading the configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Lifecycle errors, one variant per failing collaborator.
///
/// A workload that cannot be launched is not an error here; it is reported
/// as [`WorkloadOutcome::LaunchFailed`](crate::supervisor::WorkloadOutcome).
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("provisioning {path:?} failed: {source}")]
    Provisioning {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("sync {from:?} -> {to:?} failed: {source}")]
    Sync {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("ownership change of {path:?} failed: {source}")]
    Ownership {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("unmounting {path:?} failed: {source}")]
    Unprovision {
        path: PathBuf,
        #[source]
        source: HostError,
    },
}

/// A run that ended in the `Failed` state.
///
/// `phase` is the phase that was being entered when the error occurred.
/// `report` is present once the workload has been started.
#[derive(Debug, thiserror::Error)]
#[error("{phase} failed: {source}")]
pub struct RunFailure {
    pub phase: LifecyclePhase,
    #[source]
    pub source: LifecycleError,
    pub report: Option<RunReport>,
}

impl RunFailure {
    pub fn new(phase: LifecyclePhase, source: LifecycleError) -> Self {
        Self {
            phase,
            source,
            report: None,
        }
    }

    pub fn with_report(mut self, report: RunReport) -> Self {
        self.report = Some(report);
        self
    }
}

/// Result type for lifecycle component operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
