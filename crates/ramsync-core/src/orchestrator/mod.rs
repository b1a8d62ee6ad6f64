//! Lifecycle orchestrator.
//!
//! Drives one run through
//! `Idle → Provisioned → Seeded → Owned → Running → Draining → Unwound`:
//!
//! 1. mount every volume
//! 2. seed the volumes from persistent storage
//! 3. hand ownership of the mount points to the workload identity
//! 4. start the workload and checkpoint every period until it finishes
//! 5. run one final checkpoint
//! 6. unmount, but only if the final checkpoint succeeded
//!
//! The checkpoint loop and the workload run concurrently. The loop selects
//! between the next tick and the workload-finished signal, so a pass that is
//! already copying always completes before the final pass starts.

mod phase;
mod report;

pub use phase::LifecyclePhase;
pub use report::RunReport;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn, Instrument};

use crate::config::{Config, VolumeSpec};
use crate::error::{LifecycleError, RunFailure};
use crate::host::HostServices;
use crate::obs;
use crate::ownership::OwnershipManager;
use crate::provisioner::VolumeProvisioner;
use crate::supervisor::{WorkloadHandle, WorkloadOutcome, WorkloadSupervisor};
use crate::sync::SyncEngine;

/// What to do with already-mounted volumes when provisioning, seeding or the
/// ownership change fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Leave them mounted for inspection.
    #[default]
    LeaveMounted,

    /// Unmount whatever was mounted before reporting the failure.
    UnwindOnSetupError,
}

pub struct Orchestrator {
    config: Config,
    provisioner: VolumeProvisioner,
    sync: SyncEngine,
    ownership: OwnershipManager,
    supervisor: WorkloadSupervisor,
    policy: FailurePolicy,
    phase: LifecyclePhase,
}

impl Orchestrator {
    pub fn new(config: Config, host: HostServices) -> Self {
        Self {
            config,
            provisioner: VolumeProvisioner::new(host.mounter),
            sync: SyncEngine::new(host.copier),
            ownership: OwnershipManager::new(host.chowner),
            supervisor: WorkloadSupervisor::new(host.launcher),
            policy: FailurePolicy::default(),
            phase: LifecyclePhase::Idle,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Execute the whole lifecycle once.
    ///
    /// A workload that fails or cannot be launched does not fail the run; its
    /// outcome is recorded in the report. The run fails when provisioning,
    /// seeding, the ownership change or the final checkpoint fails.
    pub async fn run(mut self) -> Result<RunReport, RunFailure> {
        let report = RunReport::new();
        let span = obs::run_span(&report.run_id);
        self.drive(report).instrument(span).await
    }

    async fn drive(&mut self, mut report: RunReport) -> Result<RunReport, RunFailure> {
        info!(
            volumes = self.config.volumes.len(),
            period_secs = self.config.checkpoint_period.as_secs(),
            "Starting run"
        );

        if let Err(e) = self.provisioner.provision(&self.config.volumes).await {
            return Err(self.fail_setup(LifecyclePhase::Provisioned, e).await);
        }
        self.advance(LifecyclePhase::Provisioned);

        info!("Loading data");
        if let Err(e) = self.sync.sync(&self.config.seed_rules).await {
            return Err(self.fail_setup(LifecyclePhase::Seeded, e).await);
        }
        self.advance(LifecyclePhase::Seeded);

        let mount_paths = self.config.mount_paths();
        if let Err(e) = self
            .ownership
            .apply_ownership(&mount_paths, self.config.owner)
            .await
        {
            return Err(self.fail_setup(LifecyclePhase::Owned, e).await);
        }
        self.advance(LifecyclePhase::Owned);

        let mut handle = self.supervisor.start(&self.config.workload);
        self.advance(LifecyclePhase::Running);

        let outcome = self.checkpoint_until_finished(&mut handle, &mut report).await;
        report.workload = Some(outcome);

        self.advance(LifecyclePhase::Draining);
        info!("Final save");
        if let Err(e) = self.sync.sync(&self.config.checkpoint_rules).await {
            obs::emit_unwind_skipped(&e);
            self.advance(LifecyclePhase::Failed);
            report.finish(self.phase);
            return Err(RunFailure::new(LifecyclePhase::Draining, e).with_report(report));
        }
        report.final_checkpoint_ok = true;

        match self.provisioner.unprovision(&self.config.volumes).await {
            Ok(()) => report.unwound = true,
            Err(e) => {
                obs::emit_unwind_failed(&e);
                report.unwind_error = Some(e.to_string());
            }
        }
        self.advance(LifecyclePhase::Unwound);
        report.finish(self.phase);

        info!(
            checkpoints = report.periodic_checkpoints,
            failed_checkpoints = report.failed_checkpoints,
            unwound = report.unwound,
            "Run complete"
        );
        Ok(report)
    }

    /// Periodic checkpoints until the workload-finished signal arrives.
    ///
    /// The first pass runs one full period after the workload starts. A
    /// failed pass is logged and counted; the loop carries on.
    async fn checkpoint_until_finished(
        &self,
        handle: &mut WorkloadHandle,
        report: &mut RunReport,
    ) -> WorkloadOutcome {
        let period = self.config.checkpoint_period.as_duration();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                Some(outcome) = handle.wait() => return outcome,

                _ = ticker.tick() => {
                    report.periodic_checkpoints += 1;
                    let pass = report.periodic_checkpoints;
                    let started = Instant::now();

                    match self.sync.sync(&self.config.checkpoint_rules).await {
                        Ok(()) => {
                            let elapsed = started.elapsed().as_millis() as u64;
                            obs::emit_checkpoint_completed(pass, elapsed);
                        }
                        Err(e) => {
                            report.failed_checkpoints += 1;
                            obs::emit_checkpoint_failed(pass, &e);
                        }
                    }
                }
            }
        }
    }

    /// Apply the failure policy for a setup error and build the failure.
    async fn fail_setup(&mut self, phase: LifecyclePhase, error: LifecycleError) -> RunFailure {
        if self.policy == FailurePolicy::UnwindOnSetupError {
            let mounted = mounted_before(&self.config.volumes, phase, &error);
            if !mounted.is_empty() {
                match self.provisioner.unprovision(mounted).await {
                    Ok(()) => info!(count = mounted.len(), "Unmounted ramdisks after setup failure"),
                    Err(e) => warn!(error = %e, "Cleanup after setup failure incomplete"),
                }
            }
        }

        self.advance(LifecyclePhase::Failed);
        RunFailure::new(phase, error)
    }

    fn advance(&mut self, next: LifecyclePhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
        obs::emit_phase(next);
    }
}

/// Volumes known to be mounted when a setup step failed.
///
/// A provisioning failure names the volume it stopped at; everything listed
/// before it was mounted. Locations are unique, so the prefix is exact.
fn mounted_before<'a>(
    volumes: &'a [VolumeSpec],
    phase: LifecyclePhase,
    error: &LifecycleError,
) -> &'a [VolumeSpec] {
    match (phase, error) {
        (LifecyclePhase::Provisioned, LifecycleError::Provisioning { path, .. }) => {
            let count = volumes
                .iter()
                .take_while(|v| &v.mount_path != path)
                .count();
            &volumes[..count]
        }
        (LifecyclePhase::Provisioned, _) => &[],
        _ => volumes,
    }
}
