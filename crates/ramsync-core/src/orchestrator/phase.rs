//! Lifecycle state machine.

use serde::{Deserialize, Serialize};

/// States of a run.
///
/// `Idle → Provisioned → Seeded → Owned → Running → Draining → Unwound`,
/// with an exit from any non-terminal state to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Idle,
    Provisioned,
    Seeded,
    Owned,
    Running,
    Draining,
    Unwound,
    Failed,
}

impl LifecyclePhase {
    /// State name as used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            LifecyclePhase::Idle => "idle",
            LifecyclePhase::Provisioned => "provisioned",
            LifecyclePhase::Seeded => "seeded",
            LifecyclePhase::Owned => "owned",
            LifecyclePhase::Running => "running",
            LifecyclePhase::Draining => "draining",
            LifecyclePhase::Unwound => "unwound",
            LifecyclePhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecyclePhase::Unwound | LifecyclePhase::Failed)
    }

    /// Whether `next` is a legal transition from `self`.
    pub fn can_advance_to(&self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Provisioned)
            | (Provisioned, Seeded)
            | (Seeded, Owned)
            | (Owned, Running)
            | (Running, Draining)
            | (Draining, Unwound) => true,
            _ => false,
        }
    }
}

/// Renders the work that leads *into* the phase, e.g. `Seeded` is "seeding".
impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            LifecyclePhase::Idle => "startup",
            LifecyclePhase::Provisioned => "provisioning",
            LifecyclePhase::Seeded => "seeding",
            LifecyclePhase::Owned => "ownership change",
            LifecyclePhase::Running => "workload",
            LifecyclePhase::Draining => "final checkpoint",
            LifecyclePhase::Unwound => "unwind",
            LifecyclePhase::Failed => "failure handling",
        };
        f.write_str(action)
    }
}
