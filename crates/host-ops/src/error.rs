//! Error types for host-ops

use thiserror::Error;

/// Errors that can occur while driving a host facility
#[derive(Error, Debug)]
pub enum HostError {
    /// The external tool could not be found
    #[error("{0} is not installed or not in PATH")]
    ToolNotFound(String),

    /// The external tool ran but reported failure
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Invalid argument handed to a facility
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Map a spawn error, turning `NotFound` into [`HostError::ToolNotFound`].
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            HostError::ToolNotFound(program.to_string())
        } else {
            HostError::Io(err)
        }
    }
}
