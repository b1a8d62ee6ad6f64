//! PATH probing for the external tools the command-backed facilities need

use std::path::PathBuf;

/// Tools used by [`TmpfsMounter`](crate::TmpfsMounter), [`CpCopier`](crate::CpCopier)
/// and [`ChownTool`](crate::ChownTool). `sudo` is only needed when the workload
/// names a user.
pub const REQUIRED_TOOLS: [&str; 4] = ["mount", "umount", "cp", "chown"];

/// Locate `name` on `PATH`. Names containing a `/` are checked as-is.
pub fn find_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Check whether `name` resolves to an executable.
pub fn is_tool_available(name: &str) -> bool {
    find_tool(name).is_some()
}

/// Return the subset of `tools` that cannot be found.
pub fn missing_tools<'a>(tools: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    tools.into_iter().filter(|t| !is_tool_available(t)).collect()
}
