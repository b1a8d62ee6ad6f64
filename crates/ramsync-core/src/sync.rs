//! Sync engine: ordered bulk copy of file trees.
//!
//! Seeding and checkpointing are the same operation; only the rule list
//! differs.

use std::sync::Arc;

use host_ops::Copier;
use tracing::debug;

use crate::config::CopyRule;
use crate::error::{LifecycleError, Result};

pub struct SyncEngine {
    copier: Arc<dyn Copier>,
}

impl SyncEngine {
    pub fn new(copier: Arc<dyn Copier>) -> Self {
        Self { copier }
    }

    /// Apply `rules` in order; the first failing rule aborts the rest.
    pub async fn sync(&self, rules: &[CopyRule]) -> Result<()> {
        for rule in rules {
            debug!("Copying {:?} -> {:?}", rule.source, rule.destination);
            self.copier
                .copy_tree(&rule.source, &rule.destination)
                .await
                .map_err(|source| LifecycleError::Sync {
                    from: rule.source.clone(),
                    to: rule.destination.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
