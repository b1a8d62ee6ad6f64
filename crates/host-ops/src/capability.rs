//! Capability traits for the host facilities ramsync drives.
//!
//! - `Mounter`: create mount points, mount/unmount size-bounded tmpfs
//! - `Copier`: recursive file-tree copy
//! - `Chowner`: recursive ownership change
//! - `ProcessLauncher`: run a program (optionally as another user) to completion
//!
//! Command-backed implementations live in [`crate::tmpfs`], [`crate::copy`],
//! [`crate::chown`] and [`crate::launcher`]. In-memory fakes for tests are in
//! [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::HostResult;

/// Volatile filesystem management.
#[async_trait]
pub trait Mounter: Send + Sync {
    /// Ensure `path` exists as a directory, creating parents as needed.
    async fn create_mount_point(&self, path: &Path) -> HostResult<()>;

    /// Mount a RAM-backed filesystem of at most `size` at `path`.
    async fn mount_tmpfs(&self, path: &Path, size: &str) -> HostResult<()>;

    /// Unmount whatever is mounted at `path`.
    async fn unmount(&self, path: &Path) -> HostResult<()>;
}

/// Recursive file-tree copy.
#[async_trait]
pub trait Copier: Send + Sync {
    /// Copy the contents of `from` into `to`, creating `to` if needed.
    async fn copy_tree(&self, from: &Path, to: &Path) -> HostResult<()>;
}

/// Recursive ownership change.
#[async_trait]
pub trait Chowner: Send + Sync {
    /// Set owner and group of `path` and everything below it.
    async fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> HostResult<()>;
}

/// A program to launch, optionally under another identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// User to run as (`None` runs as the current user).
    pub user: Option<String>,

    /// Executable path or name.
    pub program: String,

    /// Arguments passed to `program`.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            user: None,
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Run as `user`. An empty name means the current user.
    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = if user.is_empty() { None } else { Some(user) };
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "[{}] ", user)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a launched program terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReport {
    /// Exit code (`None` when terminated by a signal).
    pub code: Option<i32>,

    /// Whether the program reported success.
    pub success: bool,
}

impl ExitReport {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

/// Program execution.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start the program and wait for it to terminate.
    ///
    /// A program that starts and then exits non-zero is `Ok` with an
    /// unsuccessful [`ExitReport`]; `Err` means it could not be started.
    async fn run(&self, invocation: &Invocation) -> HostResult<ExitReport>;
}
