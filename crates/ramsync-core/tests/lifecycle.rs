//! End-to-end lifecycle tests.
//!
//! Most tests drive the orchestrator against `RecordingHost` on a paused
//! tokio clock and assert on the exact host calls. The last section runs a
//! real copy and a real workload process inside temp directories.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use host_ops::fakes::{HostCall, RecordingHost};
use host_ops::{CpCopier, SudoLauncher};
use ramsync_core::{
    CheckpointPeriod, Config, CopyRule, FailurePolicy, HostServices, LifecycleError,
    LifecyclePhase, Orchestrator, OwnershipTarget, VolumeSpec, WorkloadOutcome, WorkloadSpec,
    MAX_PERIOD_SECS,
};

const RAM1: &str = "/mnt/ram1";
const RAM2: &str = "/mnt/ram2";

fn config(period_secs: u64) -> Config {
    Config {
        volumes: vec![
            VolumeSpec {
                mount_path: PathBuf::from(RAM1),
                capacity: "512m".to_string(),
            },
            VolumeSpec {
                mount_path: PathBuf::from(RAM2),
                capacity: "1g".to_string(),
            },
        ],
        seed_rules: vec![
            CopyRule::new("/persist/a", RAM1),
            CopyRule::new("/persist/b", RAM2),
        ],
        checkpoint_rules: vec![
            CopyRule::new(RAM1, "/persist/a"),
            CopyRule::new(RAM2, "/persist/b"),
        ],
        checkpoint_period: CheckpointPeriod::from_secs(period_secs).unwrap(),
        owner: OwnershipTarget { uid: 1000, gid: 1000 },
        workload: WorkloadSpec {
            run_as_user: "worker".to_string(),
            command: "/opt/app/run".to_string(),
            args: vec!["--fast".to_string()],
        },
    }
}

fn orchestrator(config: Config, host: &Arc<RecordingHost>) -> Orchestrator {
    Orchestrator::new(config, HostServices::recording(Arc::clone(host)))
}

fn copy(from: &str, to: &str) -> HostCall {
    HostCall::Copy {
        from: PathBuf::from(from),
        to: PathBuf::from(to),
    }
}

fn is_launch(call: &HostCall) -> bool {
    matches!(call, HostCall::Launch(_))
}

fn is_unmount(call: &HostCall) -> bool {
    matches!(call, HostCall::Unmount(_))
}

// ===========================================================================
// Successful runs
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn full_run_issues_expected_host_calls() {
    let config = config(60);
    let invocation = config.workload.invocation();
    let host = Arc::new(RecordingHost::new().with_workload_runtime(Duration::from_secs(150)));

    let report = orchestrator(config, &host).run().await.unwrap();

    let checkpoint = [copy(RAM1, "/persist/a"), copy(RAM2, "/persist/b")];
    let mut expected = vec![
        HostCall::CreateMountPoint(PathBuf::from(RAM1)),
        HostCall::Mount {
            path: PathBuf::from(RAM1),
            size: "512m".to_string(),
        },
        HostCall::CreateMountPoint(PathBuf::from(RAM2)),
        HostCall::Mount {
            path: PathBuf::from(RAM2),
            size: "1g".to_string(),
        },
        copy("/persist/a", RAM1),
        copy("/persist/b", RAM2),
        HostCall::Chown {
            path: PathBuf::from(RAM1),
            uid: 1000,
            gid: 1000,
        },
        HostCall::Chown {
            path: PathBuf::from(RAM2),
            uid: 1000,
            gid: 1000,
        },
        HostCall::Launch(invocation),
    ];
    // passes at 60s and 120s, then the final pass
    for _ in 0..3 {
        expected.extend(checkpoint.iter().cloned());
    }
    expected.push(HostCall::Unmount(PathBuf::from(RAM1)));
    expected.push(HostCall::Unmount(PathBuf::from(RAM2)));

    assert_eq!(host.calls(), expected);
    assert_eq!(report.periodic_checkpoints, 2);
    assert_eq!(report.failed_checkpoints, 0);
    assert_eq!(report.workload, Some(WorkloadOutcome::Exited { code: Some(0) }));
    assert!(report.final_checkpoint_ok);
    assert!(report.unwound);
    assert!(report.finished_at.is_some());
    assert_eq!(report.phase, LifecyclePhase::Unwound);
}

#[tokio::test(start_paused = true)]
async fn instant_workload_gets_only_the_final_checkpoint() {
    let host = Arc::new(RecordingHost::new());

    let report = orchestrator(config(3600), &host).run().await.unwrap();

    assert_eq!(report.periodic_checkpoints, 0);
    assert_eq!(host.copies_from(RAM1), 1);
    assert_eq!(host.copies_from(RAM2), 1);
    assert_eq!(
        host.unmounted(),
        vec![PathBuf::from(RAM1), PathBuf::from(RAM2)]
    );
}

#[tokio::test(start_paused = true)]
async fn checkpoint_count_tracks_runtime_over_period() {
    let host = Arc::new(RecordingHost::new().with_workload_runtime(Duration::from_millis(10_500)));

    let report = orchestrator(config(1), &host).run().await.unwrap();

    assert!(report.periodic_checkpoints >= 10);
    assert_eq!(
        host.copies_from(RAM1) as u64,
        report.periodic_checkpoints + 1
    );
}

#[tokio::test(start_paused = true)]
async fn longest_period_still_drains_and_unwinds() {
    let host = Arc::new(RecordingHost::new().with_workload_runtime(Duration::from_secs(5)));

    let report = orchestrator(config(MAX_PERIOD_SECS), &host).run().await.unwrap();

    assert_eq!(report.periodic_checkpoints, 0);
    assert!(report.final_checkpoint_ok);
    assert_eq!(host.unmounted().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn no_checkpoint_before_first_period_elapses() {
    let host = Arc::new(RecordingHost::new().with_workload_runtime(Duration::from_secs(59)));

    let report = orchestrator(config(60), &host).run().await.unwrap();

    assert_eq!(report.periodic_checkpoints, 0);
    assert_eq!(host.copies_from(RAM1), 1);
}

#[tokio::test(start_paused = true)]
async fn workload_failure_does_not_fail_the_run() {
    let host = Arc::new(
        RecordingHost::new()
            .with_workload_runtime(Duration::from_secs(5))
            .with_workload_exit_code(3),
    );

    let report = orchestrator(config(60), &host).run().await.unwrap();

    assert_eq!(report.workload, Some(WorkloadOutcome::Failed { code: Some(3) }));
    assert!(report.final_checkpoint_ok);
    assert_eq!(host.count(is_unmount), 2);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_still_drains_and_unwinds() {
    let host = Arc::new(RecordingHost::new());
    host.fail_launch();

    let report = orchestrator(config(60), &host).run().await.unwrap();

    assert!(matches!(
        report.workload,
        Some(WorkloadOutcome::LaunchFailed { .. })
    ));
    assert_eq!(host.copies_from(RAM1), 1);
    assert_eq!(host.copies_from(RAM2), 1);
    assert!(report.unwound);
}

#[tokio::test(start_paused = true)]
async fn failed_periodic_checkpoints_do_not_stop_the_loop() {
    let host = Arc::new(RecordingHost::new().with_workload_runtime(Duration::from_secs(45)));
    host.fail_copy_from_times(RAM1, 2);

    let report = orchestrator(config(10), &host).run().await.unwrap();

    assert_eq!(report.periodic_checkpoints, 4);
    assert_eq!(report.failed_checkpoints, 2);
    assert_eq!(report.successful_checkpoints(), 2);
    // a failed pass stops at its first failing rule
    assert_eq!(host.copies_from(RAM1), 5);
    assert_eq!(host.copies_from(RAM2), 3);
    assert!(report.final_checkpoint_ok);
    assert!(report.unwound);
}

#[tokio::test(start_paused = true)]
async fn unmount_failure_after_final_checkpoint_is_still_success() {
    let host = Arc::new(RecordingHost::new());
    host.fail_unmount(RAM1);

    let report = orchestrator(config(60), &host).run().await.unwrap();

    assert!(report.final_checkpoint_ok);
    assert!(!report.unwound);
    assert!(report.unwind_error.as_deref().unwrap().contains("ram1"));
    assert_eq!(host.unmounted(), vec![PathBuf::from(RAM1)]);
}

// ===========================================================================
// Final checkpoint failure
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn failed_final_checkpoint_leaves_everything_mounted() {
    let host = Arc::new(RecordingHost::new());
    host.fail_copy_from(RAM2);

    let failure = orchestrator(config(60), &host).run().await.unwrap_err();

    assert_eq!(failure.phase, LifecyclePhase::Draining);
    assert!(matches!(failure.source, LifecycleError::Sync { .. }));
    assert!(failure.to_string().starts_with("final checkpoint failed"));
    assert_eq!(host.count(is_unmount), 0);

    let report = failure.report.expect("report once the workload ran");
    assert_eq!(report.phase, LifecyclePhase::Failed);
    assert!(!report.final_checkpoint_ok);
    assert!(!report.unwound);
    assert!(report.workload.unwrap().is_success());
}

#[tokio::test(start_paused = true)]
async fn failed_final_checkpoint_ignores_unwind_policy() {
    let host = Arc::new(RecordingHost::new());
    host.fail_copy_from(RAM1);

    let result = orchestrator(config(60), &host)
        .with_policy(FailurePolicy::UnwindOnSetupError)
        .run()
        .await;

    assert!(result.is_err());
    assert_eq!(host.count(is_unmount), 0);
}

// ===========================================================================
// Setup failures
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn provisioning_failure_stops_before_seeding() {
    let host = Arc::new(RecordingHost::new());
    host.fail_mount(RAM2);

    let failure = orchestrator(config(60), &host).run().await.unwrap_err();

    assert_eq!(failure.phase, LifecyclePhase::Provisioned);
    assert!(failure.report.is_none());
    assert_eq!(host.count(|c| matches!(c, HostCall::Copy { .. })), 0);
    assert_eq!(host.count(is_launch), 0);
    assert_eq!(host.count(is_unmount), 0);
}

#[tokio::test(start_paused = true)]
async fn provisioning_failure_unwinds_earlier_mounts_when_asked() {
    let host = Arc::new(RecordingHost::new());
    host.fail_mount(RAM2);

    let failure = orchestrator(config(60), &host)
        .with_policy(FailurePolicy::UnwindOnSetupError)
        .run()
        .await
        .unwrap_err();

    assert_eq!(failure.phase, LifecyclePhase::Provisioned);
    assert_eq!(host.unmounted(), vec![PathBuf::from(RAM1)]);
}

#[tokio::test(start_paused = true)]
async fn seeding_failure_leaves_volumes_mounted_by_default() {
    let host = Arc::new(RecordingHost::new());
    host.fail_copy_from("/persist/b");

    let failure = orchestrator(config(60), &host).run().await.unwrap_err();

    assert_eq!(failure.phase, LifecyclePhase::Seeded);
    assert!(failure.to_string().starts_with("seeding failed"));
    assert_eq!(host.count(|c| matches!(c, HostCall::Chown { .. })), 0);
    assert_eq!(host.count(is_launch), 0);
    assert_eq!(host.mounted().len(), 2);
    assert_eq!(host.count(is_unmount), 0);
}

#[tokio::test(start_paused = true)]
async fn seeding_failure_unwinds_all_volumes_when_asked() {
    let host = Arc::new(RecordingHost::new());
    host.fail_copy_from("/persist/a");

    orchestrator(config(60), &host)
        .with_policy(FailurePolicy::UnwindOnSetupError)
        .run()
        .await
        .unwrap_err();

    assert_eq!(
        host.unmounted(),
        vec![PathBuf::from(RAM1), PathBuf::from(RAM2)]
    );
}

#[tokio::test(start_paused = true)]
async fn ownership_failure_prevents_launch() {
    let host = Arc::new(RecordingHost::new());
    host.fail_chown(RAM1);

    let failure = orchestrator(config(60), &host).run().await.unwrap_err();

    assert_eq!(failure.phase, LifecyclePhase::Owned);
    assert!(matches!(failure.source, LifecycleError::Ownership { .. }));
    assert_eq!(host.count(is_launch), 0);
    assert_eq!(host.count(is_unmount), 0);
}

#[tokio::test(start_paused = true)]
async fn cleanup_failure_does_not_mask_setup_error() {
    let host = Arc::new(RecordingHost::new());
    host.fail_chown(RAM2);
    host.fail_unmount(RAM1);

    let failure = orchestrator(config(60), &host)
        .with_policy(FailurePolicy::UnwindOnSetupError)
        .run()
        .await
        .unwrap_err();

    assert_eq!(failure.phase, LifecyclePhase::Owned);
    assert!(matches!(failure.source, LifecycleError::Ownership { .. }));
}

// ===========================================================================
// Real copies and a real workload process
// ===========================================================================

#[tokio::test]
async fn real_copy_and_process_round_trip() {
    let persist = tempfile::tempdir().unwrap();
    let ram = tempfile::tempdir().unwrap();
    std::fs::write(persist.path().join("seed.txt"), "seeded").unwrap();

    let fake = Arc::new(RecordingHost::new());
    let services = HostServices {
        mounter: fake.clone(),
        copier: Arc::new(CpCopier::new()),
        chowner: fake.clone(),
        launcher: Arc::new(SudoLauncher::new()),
    };

    let script = format!(
        "cat {0}/seed.txt > {0}/result.txt && echo done >> {0}/result.txt",
        ram.path().display()
    );
    let config = Config {
        volumes: vec![VolumeSpec {
            mount_path: ram.path().to_path_buf(),
            capacity: "16m".to_string(),
        }],
        seed_rules: vec![CopyRule::new(persist.path(), ram.path())],
        checkpoint_rules: vec![CopyRule::new(ram.path(), persist.path())],
        checkpoint_period: CheckpointPeriod::from_secs(3600).unwrap(),
        owner: OwnershipTarget { uid: 0, gid: 0 },
        workload: WorkloadSpec {
            run_as_user: String::new(),
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script],
        },
    };

    let report = Orchestrator::new(config, services).run().await.unwrap();

    assert!(report.workload.unwrap().is_success());
    let saved = std::fs::read_to_string(persist.path().join("result.txt")).unwrap();
    assert_eq!(saved, "seededdone\n");
    assert_eq!(fake.unmounted(), vec![ram.path().to_path_buf()]);
}
