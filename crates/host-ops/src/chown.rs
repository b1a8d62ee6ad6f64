//! Recursive ownership change via `chown -R`

use crate::capability::Chowner;
use crate::command::run_tool;
use crate::HostResult;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Changes ownership with the system `chown` tool.
#[derive(Debug, Clone)]
pub struct ChownTool {
    chown_bin: String,
}

impl Default for ChownTool {
    fn default() -> Self {
        ChownTool {
            chown_bin: "chown".to_string(),
        }
    }
}

impl ChownTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(chown_bin: &str) -> Self {
        ChownTool {
            chown_bin: chown_bin.to_string(),
        }
    }

    /// Build the `chown` argument vector.
    pub fn chown_args(path: &Path, uid: u32, gid: u32) -> Vec<String> {
        vec![
            "-R".to_string(),
            format!("{}:{}", uid, gid),
            "--".to_string(),
            path.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Chowner for ChownTool {
    async fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> HostResult<()> {
        run_tool(&self.chown_bin, Self::chown_args(path, uid, gid)).await?;
        debug!("Changed owner of {:?} to {}:{}", path, uid, gid);
        Ok(())
    }
}
