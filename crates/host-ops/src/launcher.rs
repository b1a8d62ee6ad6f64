//! Workload launching, through `sudo -u` when an identity is requested

use crate::capability::{ExitReport, Invocation, ProcessLauncher};
use crate::error::HostError;
use crate::HostResult;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Launches programs with inherited stdout/stderr.
///
/// When the invocation names a user the program runs as
/// `sudo -u <user> -- <program> <args..>`, otherwise it is spawned directly.
#[derive(Debug, Clone)]
pub struct SudoLauncher {
    sudo_bin: String,
}

impl Default for SudoLauncher {
    fn default() -> Self {
        SudoLauncher {
            sudo_bin: "sudo".to_string(),
        }
    }
}

impl SudoLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(sudo_bin: &str) -> Self {
        SudoLauncher {
            sudo_bin: sudo_bin.to_string(),
        }
    }

    /// Resolve the executable and argument vector actually spawned.
    pub fn command_line(&self, invocation: &Invocation) -> (String, Vec<String>) {
        match &invocation.user {
            Some(user) => {
                let mut args = vec![
                    "-u".to_string(),
                    user.clone(),
                    "--".to_string(),
                    invocation.program.clone(),
                ];
                args.extend(invocation.args.iter().cloned());
                (self.sudo_bin.clone(), args)
            }
            None => (invocation.program.clone(), invocation.args.clone()),
        }
    }
}

#[async_trait]
impl ProcessLauncher for SudoLauncher {
    async fn run(&self, invocation: &Invocation) -> HostResult<ExitReport> {
        let (program, args) = self.command_line(invocation);
        info!("Launching {}", invocation);

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| HostError::from_spawn(&program, e))?;

        let status = child.wait().await?;
        debug!(program = %program, status = %status, "workload exited");

        Ok(ExitReport {
            code: status.code(),
            success: status.success(),
        })
    }
}
