//! Contract tests for the capability traits.
//!
//! The recording fake is exercised through `dyn` trait objects, the same way
//! the lifecycle orchestrator consumes it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use host_ops::fakes::{HostCall, RecordingHost};
use host_ops::{Chowner, Copier, HostError, Invocation, Mounter, ProcessLauncher};

// ===========================================================================
// Mounter
// ===========================================================================

#[tokio::test]
async fn mounter_records_mount_then_unmount() {
    let host = Arc::new(RecordingHost::new());
    let mounter: Arc<dyn Mounter> = host.clone();

    mounter.create_mount_point(Path::new("/mnt/r1")).await.unwrap();
    mounter.mount_tmpfs(Path::new("/mnt/r1"), "512m").await.unwrap();
    mounter.unmount(Path::new("/mnt/r1")).await.unwrap();

    assert_eq!(host.mounted(), vec![PathBuf::from("/mnt/r1")]);
    assert_eq!(host.unmounted(), vec![PathBuf::from("/mnt/r1")]);
}

#[tokio::test]
async fn mounter_injected_failure_surfaces_command_error() {
    let host = Arc::new(RecordingHost::new());
    host.fail_mount("/mnt/bad");
    let mounter: Arc<dyn Mounter> = host.clone();

    let err = mounter
        .mount_tmpfs(Path::new("/mnt/bad"), "1g")
        .await
        .unwrap_err();
    match err {
        HostError::CommandFailed { program, stderr, .. } => {
            assert_eq!(program, "mount");
            assert!(stderr.contains("permission denied"));
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

// ===========================================================================
// Copier / Chowner
// ===========================================================================

#[tokio::test]
async fn copier_failure_only_hits_matching_source() {
    let host = Arc::new(RecordingHost::new());
    host.fail_copy_from("/v");
    let copier: Arc<dyn Copier> = host.clone();

    assert!(copier
        .copy_tree(Path::new("/seed"), Path::new("/v"))
        .await
        .is_ok());
    assert!(copier
        .copy_tree(Path::new("/v"), Path::new("/backup"))
        .await
        .is_err());
}

#[tokio::test]
async fn chowner_records_uid_and_gid() {
    let host = Arc::new(RecordingHost::new());
    let chowner: Arc<dyn Chowner> = host.clone();

    chowner
        .chown_recursive(Path::new("/v"), 1000, 1001)
        .await
        .unwrap();

    assert_eq!(
        host.calls(),
        vec![HostCall::Chown {
            path: PathBuf::from("/v"),
            uid: 1000,
            gid: 1001
        }]
    );
}

// ===========================================================================
// ProcessLauncher
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn launcher_waits_for_configured_runtime() {
    let host = Arc::new(
        RecordingHost::new()
            .with_workload_runtime(Duration::from_secs(30))
            .with_workload_exit_code(2),
    );
    let launcher: Arc<dyn ProcessLauncher> = host.clone();

    let started = tokio::time::Instant::now();
    let report = launcher
        .run(&Invocation::new("/bin/app").as_user("worker"))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(30));
    assert!(!report.success);
    assert_eq!(report.code, Some(2));
}

#[tokio::test]
async fn launcher_failure_is_error_not_exit_report() {
    let host = Arc::new(RecordingHost::new());
    host.fail_launch();
    let launcher: Arc<dyn ProcessLauncher> = host.clone();

    let err = launcher.run(&Invocation::new("/bin/app")).await.unwrap_err();
    assert!(err.to_string().contains("unknown user"));
}
