//! Recursive tree copy via `cp -R`

use crate::capability::Copier;
use crate::command::run_tool;
use crate::error::HostError;
use crate::HostResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies with the system `cp` tool.
///
/// A directory source has its *contents* copied into the destination
/// (`cp -R <from>/. <to>`); a file source is copied into the destination
/// directory.
#[derive(Debug, Clone)]
pub struct CpCopier {
    cp_bin: String,
}

impl Default for CpCopier {
    fn default() -> Self {
        CpCopier {
            cp_bin: "cp".to_string(),
        }
    }
}

impl CpCopier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(cp_bin: &str) -> Self {
        CpCopier {
            cp_bin: cp_bin.to_string(),
        }
    }

    /// Build the `cp` argument vector for copying `from` into `to`.
    pub fn copy_args(from: &Path, to: &Path, from_is_dir: bool) -> Vec<PathBuf> {
        let source = if from_is_dir {
            from.join(".")
        } else {
            from.to_path_buf()
        };
        vec![PathBuf::from("-R"), PathBuf::from("--"), source, to.to_path_buf()]
    }
}

#[async_trait]
impl Copier for CpCopier {
    async fn copy_tree(&self, from: &Path, to: &Path) -> HostResult<()> {
        let metadata = tokio::fs::metadata(from).await.map_err(|e| {
            HostError::Io(std::io::Error::new(
                e.kind(),
                format!("copy source {:?}: {}", from, e),
            ))
        })?;

        tokio::fs::create_dir_all(to).await?;

        let args = Self::copy_args(from, to, metadata.is_dir());
        run_tool(&self.cp_bin, &args).await?;

        debug!("Copied {:?} -> {:?}", from, to);
        Ok(())
    }
}
