//! Structured observability hooks for the ramsync lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via [`run_span`]
//! - Emission functions for lifecycle events: phase changes, checkpoint
//!   passes, workload completion, skipped unwind
//!
//! Events are emitted at `info!` (failures at `warn!`/`error!`) with an
//! `event` field so they can be filtered in JSON log output.

use tracing::{error, info, warn};

use crate::orchestrator::LifecyclePhase;
use crate::supervisor::WorkloadOutcome;

/// Span tagged with the run_id. Attach with `Instrument::instrument` so it
/// follows the run across await points.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("ramsync.run", run_id = %run_id)
}

/// Emit event: the lifecycle entered `phase`.
pub fn emit_phase(phase: LifecyclePhase) {
    info!(event = "lifecycle.phase", phase = %phase.name());
}

/// Emit event: a periodic checkpoint pass succeeded.
pub fn emit_checkpoint_completed(pass: u64, duration_ms: u64) {
    info!(event = "checkpoint.completed", pass = pass, duration_ms = duration_ms);
}

/// Emit event: a periodic checkpoint pass failed (the loop keeps going).
pub fn emit_checkpoint_failed(pass: u64, error: &dyn std::fmt::Display) {
    warn!(event = "checkpoint.failed", pass = pass, error = %error, "Save failed");
}

/// Emit event: the workload terminated.
pub fn emit_workload_finished(command: &str, outcome: &WorkloadOutcome) {
    if outcome.is_success() {
        info!(event = "workload.finished", command = %command, outcome = %outcome);
    } else {
        warn!(event = "workload.finished", command = %command, outcome = %outcome);
    }
}

/// Emit event: final checkpoint failed, volumes left mounted.
pub fn emit_unwind_skipped(error: &dyn std::fmt::Display) {
    error!(
        event = "unwind.skipped",
        error = %error,
        "Final save failed, won't unmount ramdisks"
    );
}

/// Emit event: unmounting failed after a successful final checkpoint.
pub fn emit_unwind_failed(error: &dyn std::fmt::Display) {
    warn!(event = "unwind.failed", error = %error);
}
