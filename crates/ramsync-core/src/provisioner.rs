//! Volume provisioner: creates and destroys the volatile mounts.

use std::sync::Arc;

use host_ops::Mounter;
use tracing::info;

use crate::config::VolumeSpec;
use crate::error::{LifecycleError, Result};

pub struct VolumeProvisioner {
    mounter: Arc<dyn Mounter>,
}

impl VolumeProvisioner {
    pub fn new(mounter: Arc<dyn Mounter>) -> Self {
        Self { mounter }
    }

    /// Create each mount point and mount a tmpfs there, in order.
    ///
    /// Stops at the first failure. Volumes mounted before it stay mounted.
    pub async fn provision(&self, specs: &[VolumeSpec]) -> Result<()> {
        info!(count = specs.len(), "Mounting ramdisks");

        for spec in specs {
            let provisioning = |source| LifecycleError::Provisioning {
                path: spec.mount_path.clone(),
                source,
            };

            self.mounter
                .create_mount_point(&spec.mount_path)
                .await
                .map_err(provisioning)?;
            self.mounter
                .mount_tmpfs(&spec.mount_path, &spec.capacity)
                .await
                .map_err(provisioning)?;
        }

        Ok(())
    }

    /// Unmount each volume, in order, stopping at the first failure.
    pub async fn unprovision(&self, specs: &[VolumeSpec]) -> Result<()> {
        info!(count = specs.len(), "Unmounting ramdisks");

        for spec in specs {
            self.mounter
                .unmount(&spec.mount_path)
                .await
                .map_err(|source| LifecycleError::Unprovision {
                    path: spec.mount_path.clone(),
                    source,
                })?;
        }

        Ok(())
    }
}
