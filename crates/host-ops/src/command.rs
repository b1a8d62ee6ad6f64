//! Thin wrapper over `tokio::process::Command` for one-shot host tools.

use crate::error::HostError;
use crate::HostResult;
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code (`None` when terminated by a signal).
    pub exit_code: Option<i32>,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// Run `program` with `args`, wait for it, and fail unless it exits with 0.
///
/// Output is captured so a failure carries the tool's own stderr.
pub async fn run_tool<I, S>(program: &str, args: I) -> HostResult<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| HostError::from_spawn(program, e))?;

    let output = child.wait_with_output().await?;
    let duration_ms = start.elapsed().as_millis() as u64;
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(HostError::CommandFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    debug!(program, duration_ms, "tool finished");

    Ok(ToolOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr,
        duration_ms,
    })
}
