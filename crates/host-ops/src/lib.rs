//! Host-Ops: mount, copy, chown and spawn-as-user capabilities for ramsync
//!
//! This crate is the only place ramsync touches the operating system.
//! Every facility is a small async trait with a command-backed
//! implementation that shells out to the standard system tool.
//!
//! ## Layer 0 - Host facilities
//!
//! Focus: narrow contracts, faithful error reporting, swappable test doubles.
//!
//! ## Key Components
//!
//! - `Mounter` / `TmpfsMounter`: `mount -t tmpfs`, `umount`
//! - `Copier` / `CpCopier`: `cp -R`
//! - `Chowner` / `ChownTool`: `chown -R`
//! - `ProcessLauncher` / `SudoLauncher`: `sudo -u <user>`
//! - `fakes::RecordingHost`: in-memory double for all of the above

pub mod capability;
pub mod chown;
pub mod command;
pub mod copy;
mod error;
pub mod fakes;
pub mod launcher;
pub mod probe;
pub mod tmpfs;

pub use capability::{Chowner, Copier, ExitReport, Invocation, Mounter, ProcessLauncher};
pub use chown::ChownTool;
pub use copy::CpCopier;
pub use error::HostError;
pub use launcher::SudoLauncher;
pub use probe::{find_tool, is_tool_available, missing_tools, REQUIRED_TOOLS};
pub use tmpfs::TmpfsMounter;

/// Result type for host-ops operations
pub type HostResult<T> = std::result::Result<T, HostError>;
