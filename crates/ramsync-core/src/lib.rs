//! ramsync core library
//!
//! Runs a workload on top of tmpfs volumes: mount, seed from disk, hand the
//! mounts to the workload identity, checkpoint back to disk every period
//! while the workload runs, checkpoint once more when it exits, then unmount.
//!
//! Host access goes through the `host-ops` capability traits, bundled in
//! [`HostServices`], so the whole lifecycle runs against
//! `host_ops::fakes::RecordingHost` in tests.

pub mod config;
pub mod error;
pub mod host;
pub mod obs;
pub mod orchestrator;
pub mod ownership;
pub mod provisioner;
pub mod supervisor;
pub mod sync;
pub mod telemetry;

pub use config::{
    CheckpointPeriod, Config, CopyRule, OwnershipTarget, VolumeSpec, WorkloadSpec,
    DEFAULT_CONFIG_FILE, MAX_PERIOD_SECS,
};
pub use error::{ConfigError, LifecycleError, Result, RunFailure};
pub use host::HostServices;
pub use orchestrator::{FailurePolicy, LifecyclePhase, Orchestrator, RunReport};
pub use ownership::OwnershipManager;
pub use provisioner::VolumeProvisioner;
pub use supervisor::{WorkloadHandle, WorkloadOutcome, WorkloadSupervisor};
pub use sync::SyncEngine;
pub use telemetry::{init_tracing, LogFormat};
