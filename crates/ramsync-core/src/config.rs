//! Configuration model: the immutable description of one ramsync run.
//!
//! The on-disk document is JSON with the field names operators already use:
//!
//! ```json
//! {
//!   "RAMDisks": [{ "Location": "/v", "Size": "64m" }],
//!   "Load":     [{ "From": "/seed", "To": "/v" }],
//!   "Save":     [{ "From": "/v", "To": "/backup" }],
//!   "Period":   60,
//!   "chown_uid": 1000,
//!   "chown_gid": 1000,
//!   "User":     "worker",
//!   "Execute":  "/opt/app/run"
//! }
//! ```
//!
//! Everything is validated in [`Config::try_from`] before any side effect,
//! so a `Config` value is never partially valid.

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use host_ops::Invocation;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Config file used when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// One volatile mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSpec {
    #[serde(rename = "Location")]
    pub mount_path: PathBuf,

    /// tmpfs size expression, e.g. `512m` or `25%`.
    #[serde(rename = "Size")]
    pub capacity: String,
}

/// A recursive copy from `source` into `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyRule {
    #[serde(rename = "From")]
    pub source: PathBuf,

    #[serde(rename = "To")]
    pub destination: PathBuf,
}

impl CopyRule {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Owner applied recursively to every mount after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTarget {
    pub uid: u32,
    pub gid: u32,
}

/// The single workload of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Identity to run as; empty runs as the current user.
    pub run_as_user: String,
    pub command: String,
    pub args: Vec<String>,
}

impl WorkloadSpec {
    /// The launch request handed to a `ProcessLauncher`.
    pub fn invocation(&self) -> Invocation {
        Invocation::new(self.command.clone())
            .as_user(self.run_as_user.clone())
            .with_args(self.args.clone())
    }
}

/// Longest accepted checkpoint period: 30 days.
pub const MAX_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

/// Seconds between checkpoint passes, in `1..=MAX_PERIOD_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckpointPeriod(NonZeroU64);

impl CheckpointPeriod {
    pub fn from_secs(secs: u64) -> Option<Self> {
        if secs > MAX_PERIOD_SECS {
            return None;
        }
        NonZeroU64::new(secs).map(Self)
    }

    pub fn as_secs(&self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0.get())
    }
}

/// The on-disk document, before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(rename = "RAMDisks", default)]
    ram_disks: Vec<VolumeSpec>,

    #[serde(rename = "Load", default)]
    load: Vec<CopyRule>,

    #[serde(rename = "Save", default)]
    save: Vec<CopyRule>,

    #[serde(rename = "Period")]
    period: i64,

    #[serde(default)]
    chown_uid: i64,

    #[serde(default)]
    chown_gid: i64,

    #[serde(rename = "User", default)]
    user: String,

    #[serde(rename = "Execute")]
    execute: String,

    #[serde(rename = "Args", default)]
    args: Vec<String>,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub volumes: Vec<VolumeSpec>,
    pub seed_rules: Vec<CopyRule>,
    pub checkpoint_rules: Vec<CopyRule>,
    pub checkpoint_period: CheckpointPeriod,
    pub owner: OwnershipTarget,
    pub workload: WorkloadSpec,
}

impl Config {
    /// Read, parse and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading config ({:?})", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Mount paths of every volume, in configuration order.
    pub fn mount_paths(&self) -> Vec<PathBuf> {
        self.volumes.iter().map(|v| v.mount_path.clone()).collect()
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let period = u64::try_from(raw.period)
            .ok()
            .and_then(CheckpointPeriod::from_secs)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "Period must be between 1 and {} seconds, got {}",
                    MAX_PERIOD_SECS, raw.period
                ))
            })?;

        let uid = id_field("chown_uid", raw.chown_uid)?;
        let gid = id_field("chown_gid", raw.chown_gid)?;

        for (idx, volume) in raw.ram_disks.iter().enumerate() {
            if volume.mount_path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("RAMDisks[{}].Location is empty", idx)));
            }
            if !is_size_expression(&volume.capacity) {
                return Err(ConfigError::Invalid(format!(
                    "RAMDisks[{}].Size {:?} is not a size like 512m, 2G or 50%",
                    idx, volume.capacity
                )));
            }
            if raw.ram_disks[..idx]
                .iter()
                .any(|earlier| earlier.mount_path == volume.mount_path)
            {
                return Err(ConfigError::Invalid(format!(
                    "RAMDisks[{}].Location {:?} is listed twice",
                    idx, volume.mount_path
                )));
            }
        }

        check_rules("Load", &raw.load)?;
        check_rules("Save", &raw.save)?;

        if raw.execute.trim().is_empty() {
            return Err(ConfigError::Invalid("Execute is empty".to_string()));
        }

        Ok(Config {
            volumes: raw.ram_disks,
            seed_rules: raw.load,
            checkpoint_rules: raw.save,
            checkpoint_period: period,
            owner: OwnershipTarget { uid, gid },
            workload: WorkloadSpec {
                run_as_user: raw.user,
                command: raw.execute,
                args: raw.args,
            },
        })
    }
}

fn id_field(name: &str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .map_err(|_| ConfigError::Invalid(format!("{} must be between 0 and {}, got {}", name, u32::MAX, value)))
}

fn check_rules(list: &str, rules: &[CopyRule]) -> Result<(), ConfigError> {
    for (idx, rule) in rules.iter().enumerate() {
        if rule.source.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("{}[{}].From is empty", list, idx)));
        }
        if rule.destination.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("{}[{}].To is empty", list, idx)));
        }
    }
    Ok(())
}

/// Whether `size` is a tmpfs `size=` value: digits with an optional unit or `%`.
pub fn is_size_expression(size: &str) -> bool {
    static SIZE_RE: OnceLock<Regex> = OnceLock::new();
    SIZE_RE
        .get_or_init(|| Regex::new(r"^[0-9]+[kKmMgGtTpPeE%]?$").expect("static regex"))
        .is_match(size)
}
