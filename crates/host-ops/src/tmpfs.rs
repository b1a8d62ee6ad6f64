//! tmpfs mounting via the system `mount`/`umount` tools

use crate::capability::Mounter;
use crate::command::run_tool;
use crate::error::HostError;
use crate::HostResult;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Mode for directories created as mount points.
const MOUNT_POINT_MODE: u32 = 0o755;

/// Mounts tmpfs with `mount -t tmpfs -o size=<size> tmpfs <path>`.
#[derive(Debug, Clone)]
pub struct TmpfsMounter {
    mount_bin: String,
    umount_bin: String,
}

impl Default for TmpfsMounter {
    fn default() -> Self {
        TmpfsMounter {
            mount_bin: "mount".to_string(),
            umount_bin: "umount".to_string(),
        }
    }
}

impl TmpfsMounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use alternative `mount`/`umount` binaries.
    pub fn with_binaries(mount_bin: &str, umount_bin: &str) -> Self {
        TmpfsMounter {
            mount_bin: mount_bin.to_string(),
            umount_bin: umount_bin.to_string(),
        }
    }

    /// Build the `mount` argument vector for a tmpfs of `size` at `path`.
    pub fn mount_args(path: &Path, size: &str) -> HostResult<Vec<String>> {
        // size ends up inside a comma-separated option string
        if size.is_empty() || size.contains(',') || size.contains(char::is_whitespace) {
            return Err(HostError::InvalidArgument(format!(
                "tmpfs size {:?} is not a plain size expression",
                size
            )));
        }

        Ok(vec![
            "-t".to_string(),
            "tmpfs".to_string(),
            "-o".to_string(),
            format!("size={}", size),
            "tmpfs".to_string(),
            path.to_string_lossy().into_owned(),
        ])
    }
}

#[async_trait]
impl Mounter for TmpfsMounter {
    async fn create_mount_point(&self, path: &Path) -> HostResult<()> {
        debug!("Creating mount point {:?}", path);
        tokio::fs::DirBuilder::new()
            .recursive(true)
            .mode(MOUNT_POINT_MODE)
            .create(path)
            .await?;
        Ok(())
    }

    async fn mount_tmpfs(&self, path: &Path, size: &str) -> HostResult<()> {
        let args = Self::mount_args(path, size)?;
        run_tool(&self.mount_bin, &args).await?;
        info!("Mounted tmpfs ({}) at {:?}", size, path);
        Ok(())
    }

    async fn unmount(&self, path: &Path) -> HostResult<()> {
        run_tool(&self.umount_bin, [path]).await?;
        info!("Unmounted {:?}", path);
        Ok(())
    }
}
