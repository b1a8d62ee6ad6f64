//! Ownership manager: uniform owner/group over the provisioned mounts.

use std::path::PathBuf;
use std::sync::Arc;

use host_ops::Chowner;
use tracing::info;

use crate::config::OwnershipTarget;
use crate::error::{LifecycleError, Result};

pub struct OwnershipManager {
    chowner: Arc<dyn Chowner>,
}

impl OwnershipManager {
    pub fn new(chowner: Arc<dyn Chowner>) -> Self {
        Self { chowner }
    }

    /// Recursively chown each path in order, aborting on the first failure.
    pub async fn apply_ownership(&self, paths: &[PathBuf], target: OwnershipTarget) -> Result<()> {
        info!(uid = target.uid, gid = target.gid, "Changing owner");

        for path in paths {
            self.chowner
                .chown_recursive(path, target.uid, target.gid)
                .await
                .map_err(|source| LifecycleError::Ownership {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
