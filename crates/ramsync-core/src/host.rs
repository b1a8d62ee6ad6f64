//! Bundle of host capabilities handed to the orchestrator.

use std::sync::Arc;

use host_ops::fakes::RecordingHost;
use host_ops::{
    ChownTool, Chowner, Copier, CpCopier, Mounter, ProcessLauncher, SudoLauncher, TmpfsMounter,
};

/// The four host facilities a run needs.
#[derive(Clone)]
pub struct HostServices {
    pub mounter: Arc<dyn Mounter>,
    pub copier: Arc<dyn Copier>,
    pub chowner: Arc<dyn Chowner>,
    pub launcher: Arc<dyn ProcessLauncher>,
}

impl HostServices {
    /// Command-backed facilities using the standard system tools.
    pub fn system() -> Self {
        Self {
            mounter: Arc::new(TmpfsMounter::new()),
            copier: Arc::new(CpCopier::new()),
            chowner: Arc::new(ChownTool::new()),
            launcher: Arc::new(SudoLauncher::new()),
        }
    }

    /// Every facility backed by the same recording fake.
    pub fn recording(host: Arc<RecordingHost>) -> Self {
        Self {
            mounter: host.clone(),
            copier: host.clone(),
            chowner: host.clone(),
            launcher: host,
        }
    }
}
