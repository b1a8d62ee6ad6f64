//! In-memory fakes for the capability traits (testing only)
//!
//! `RecordingHost` implements every capability trait, records each call in
//! order, and fails calls that match injected failure rules. The workload it
//! "runs" sleeps on the tokio clock, so paused-time tests stay deterministic.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::capability::*;
use crate::error::HostError;
use crate::HostResult;

/// A single recorded host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    CreateMountPoint(PathBuf),
    Mount { path: PathBuf, size: String },
    Unmount(PathBuf),
    Copy { from: PathBuf, to: PathBuf },
    Chown { path: PathBuf, uid: u32, gid: u32 },
    Launch(Invocation),
}

type Matcher = Box<dyn Fn(&HostCall) -> bool + Send + Sync>;

struct FailureRule {
    matcher: Matcher,
    /// `None` fails forever.
    remaining: Option<u32>,
    message: String,
}

#[derive(Debug, Clone)]
struct WorkloadBehavior {
    runtime: Duration,
    exit_code: i32,
}

/// Recording fake for `Mounter`, `Copier`, `Chowner` and `ProcessLauncher`.
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    failures: Mutex<Vec<FailureRule>>,
    workload: Mutex<WorkloadBehavior>,
    copy_latency: Mutex<Duration>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            workload: Mutex::new(WorkloadBehavior {
                runtime: Duration::ZERO,
                exit_code: 0,
            }),
            copy_latency: Mutex::new(Duration::ZERO),
        }
    }
}

impl std::fmt::Debug for RecordingHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingHost")
            .field("calls", &self.calls.lock().unwrap().len())
            .finish()
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the fake workload run for `runtime` before exiting.
    pub fn with_workload_runtime(self, runtime: Duration) -> Self {
        self.workload.lock().unwrap().runtime = runtime;
        self
    }

    /// Make the fake workload exit with `code`.
    pub fn with_workload_exit_code(self, code: i32) -> Self {
        self.workload.lock().unwrap().exit_code = code;
        self
    }

    /// Make every copy take `latency` on the tokio clock.
    pub fn with_copy_latency(self, latency: Duration) -> Self {
        *self.copy_latency.lock().unwrap() = latency;
        self
    }

    /// Fail calls matching `matcher`, `times` times (`None` = always).
    pub fn fail_matching<F>(&self, matcher: F, times: Option<u32>, message: &str)
    where
        F: Fn(&HostCall) -> bool + Send + Sync + 'static,
    {
        self.failures.lock().unwrap().push(FailureRule {
            matcher: Box::new(matcher),
            remaining: times,
            message: message.to_string(),
        });
    }

    pub fn fail_mount(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.fail_matching(
            move |c| matches!(c, HostCall::Mount { path: p, .. } if *p == path),
            None,
            "mount: permission denied",
        );
    }

    pub fn fail_unmount(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.fail_matching(
            move |c| matches!(c, HostCall::Unmount(p) if *p == path),
            None,
            "umount: target is busy",
        );
    }

    /// Fail every copy whose source is `from`.
    pub fn fail_copy_from(&self, from: impl Into<PathBuf>) {
        let from = from.into();
        self.fail_matching(
            move |c| matches!(c, HostCall::Copy { from: f, .. } if *f == from),
            None,
            "cp: No space left on device",
        );
    }

    /// Fail the next `times` copies whose source is `from`.
    pub fn fail_copy_from_times(&self, from: impl Into<PathBuf>, times: u32) {
        let from = from.into();
        self.fail_matching(
            move |c| matches!(c, HostCall::Copy { from: f, .. } if *f == from),
            Some(times),
            "cp: No space left on device",
        );
    }

    pub fn fail_chown(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.fail_matching(
            move |c| matches!(c, HostCall::Chown { path: p, .. } if *p == path),
            None,
            "chown: invalid user",
        );
    }

    /// Make launching the workload fail (e.g. unknown user).
    pub fn fail_launch(&self) {
        self.fail_matching(
            |c| matches!(c, HostCall::Launch(_)),
            None,
            "sudo: unknown user",
        );
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count<F: Fn(&HostCall) -> bool>(&self, pred: F) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Number of copies whose source is `from`.
    pub fn copies_from(&self, from: impl AsRef<Path>) -> usize {
        let from = from.as_ref();
        self.count(|c| matches!(c, HostCall::Copy { from: f, .. } if f == from))
    }

    /// Number of unmounts of `path`.
    pub fn unmounts_of(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.count(|c| matches!(c, HostCall::Unmount(p) if p == path))
    }

    /// Paths unmounted, in order.
    pub fn unmounted(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                HostCall::Unmount(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths mounted, in order.
    pub fn mounted(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                HostCall::Mount { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Record `call`, then return an error if a failure rule matches it.
    fn record(&self, call: HostCall) -> HostResult<()> {
        let failure = {
            let mut failures = self.failures.lock().unwrap();
            failures
                .iter_mut()
                .find(|rule| rule.remaining != Some(0) && (rule.matcher)(&call))
                .map(|rule| {
                    if let Some(n) = rule.remaining.as_mut() {
                        *n -= 1;
                    }
                    rule.message.clone()
                })
        };

        let program = match &call {
            HostCall::CreateMountPoint(_) => "mkdir",
            HostCall::Mount { .. } => "mount",
            HostCall::Unmount(_) => "umount",
            HostCall::Copy { .. } => "cp",
            HostCall::Chown { .. } => "chown",
            HostCall::Launch(_) => "sudo",
        };
        self.calls.lock().unwrap().push(call);

        match failure {
            Some(stderr) => Err(HostError::CommandFailed {
                program: program.to_string(),
                status: "exit status: 1".to_string(),
                stderr,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Mounter for RecordingHost {
    async fn create_mount_point(&self, path: &Path) -> HostResult<()> {
        self.record(HostCall::CreateMountPoint(path.to_path_buf()))
    }

    async fn mount_tmpfs(&self, path: &Path, size: &str) -> HostResult<()> {
        self.record(HostCall::Mount {
            path: path.to_path_buf(),
            size: size.to_string(),
        })
    }

    async fn unmount(&self, path: &Path) -> HostResult<()> {
        self.record(HostCall::Unmount(path.to_path_buf()))
    }
}

#[async_trait]
impl Copier for RecordingHost {
    async fn copy_tree(&self, from: &Path, to: &Path) -> HostResult<()> {
        self.record(HostCall::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })?;

        let latency = *self.copy_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Chowner for RecordingHost {
    async fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> HostResult<()> {
        self.record(HostCall::Chown {
            path: path.to_path_buf(),
            uid,
            gid,
        })
    }
}

#[async_trait]
impl ProcessLauncher for RecordingHost {
    async fn run(&self, invocation: &Invocation) -> HostResult<ExitReport> {
        self.record(HostCall::Launch(invocation.clone()))?;

        let behavior = self.workload.lock().unwrap().clone();
        if !behavior.runtime.is_zero() {
            tokio::time::sleep(behavior.runtime).await;
        }
        Ok(ExitReport::from_code(behavior.exit_code))
    }
}
