//! End-to-end runs of the full service against a scripted rsync.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serial_test::serial;

use backsync::sync::{ChangeKind, FailureKind, TIMEOUT_MESSAGE};
use backsync::{BackupSync, Classification};
use common::{RecordingNotifier, TestHarness};

#[tokio::test]
#[serial]
async fn test_all_directories_succeed() {
    let harness = TestHarness::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = BackupSync::new(harness.config(&["photos", "music"], 30), notifier.clone());

    let run = app.sync().await;

    assert_eq!(run.summary.classification, Classification::Success);
    assert_eq!(run.summary.classification.exit_code(), 0);
    assert_eq!(run.result.job_results.len(), 2);

    let photos = &run.result.job_results[0];
    assert!(photos.is_ok());
    let added: Vec<_> = photos
        .changes_of(ChangeKind::Added)
        .map(|c| c.path.as_str())
        .collect();
    assert_eq!(added, vec!["albums/beach.jpg", "albums/city.jpg"]);
    assert_eq!(photos.changes_of(ChangeKind::Updated).count(), 1);
    assert_eq!(photos.changes_of(ChangeKind::Deleted).count(), 1);

    let stats = photos.stats.as_ref().unwrap();
    assert_eq!(stats.total_files, Some(1_234));
    assert_eq!(stats.regular_files, Some(1_200));
    assert_eq!(stats.directories, Some(34));
    assert_eq!(stats.files_transferred, Some(3));
    assert_eq!(stats.total_size_bytes, Some(2_100_000_000));
    assert_eq!(stats.bytes_sent, Some(1_500));
    assert_eq!(stats.bytes_received, Some(450_310_000));

    assert_eq!(run.summary.added, 4);
    assert_eq!(run.summary.files_transferred, 6);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("Backup Sync Started"));
    assert!(messages[1].contains("Backup Sync Successful"));
    assert!(messages[1].contains("albums/beach.jpg"));
}

#[tokio::test]
#[serial]
async fn test_permission_denied_gives_partial_success() {
    let harness = TestHarness::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = BackupSync::new(
        harness.config(&["photos", "denied", "music"], 30),
        notifier.clone(),
    );

    let run = app.sync().await;
    let jobs = &run.result.job_results;

    assert_eq!(run.result.classification(), Classification::PartialSuccess);
    assert_eq!(run.summary.classification.exit_code(), 2);
    assert!(jobs[0].is_ok());
    assert!(!jobs[1].is_ok());
    assert!(jobs[2].is_ok());
    assert!(jobs[1].error_message().unwrap().contains("Permission denied"));
    assert_eq!(jobs[1].failure_kind(), Some(FailureKind::Transport));
    assert_eq!(jobs[1].exit_code, Some(255));

    assert_eq!(run.summary.succeeded, vec!["photos", "music"]);
    assert_eq!(run.summary.failed, vec!["denied"]);

    let completion = &notifier.messages()[1];
    assert!(completion.contains("Partial Success"));
    assert!(completion.contains("Permission denied"));
}

#[tokio::test]
#[serial]
async fn test_directories_run_in_configuration_order() {
    let harness = TestHarness::new();
    let app = BackupSync::new(
        harness.config(&["c", "a", "b"], 30),
        Arc::new(RecordingNotifier::default()),
    );

    let run = app.sync().await;

    let names: Vec<_> = run
        .result
        .job_results
        .iter()
        .map(|j| j.spec.name.as_str())
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);

    let invocations = harness.invocations();
    assert_eq!(invocations.len(), 3);
    assert!(invocations[0].contains("backup@nas.local:/srv/c/"));
    assert!(invocations[1].contains("backup@nas.local:/srv/a/"));
    assert!(invocations[2].contains("backup@nas.local:/srv/b/"));
}

#[tokio::test]
#[serial]
async fn test_command_line_shape() {
    let harness = TestHarness::new();
    let app = BackupSync::new(
        harness.config(&["photos"], 30),
        Arc::new(RecordingNotifier::default()),
    );

    let run = app.sync().await;

    let args = &harness.invocations()[0];
    assert!(args.starts_with("-avz --stats --itemize-changes --delete -e ssh -i "));
    assert!(args.contains("-o StrictHostKeyChecking=no"));
    assert!(args.contains("--exclude *.tmp --exclude .cache/"));
    assert!(args.ends_with("/dest/photos/"));
    assert!(run.result.job_results[0].command.contains("--itemize-changes"));
}

#[tokio::test]
#[serial]
async fn test_timeout_fails_only_that_directory() {
    let harness = TestHarness::new();
    let app = BackupSync::new(
        harness.config(&["slow", "photos"], 1),
        Arc::new(RecordingNotifier::default()),
    );

    let started = Instant::now();
    let run = app.sync().await;

    assert!(started.elapsed() < Duration::from_secs(20));
    let slow = &run.result.job_results[0];
    assert_eq!(slow.failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(slow.error_message(), Some(TIMEOUT_MESSAGE));
    assert!(run.result.job_results[1].is_ok());
    assert_eq!(run.summary.classification, Classification::PartialSuccess);
}

#[tokio::test]
#[serial]
async fn test_silent_success_is_ok_without_stats() {
    let harness = TestHarness::new();
    let app = BackupSync::new(
        harness.config(&["broken"], 30),
        Arc::new(RecordingNotifier::default()),
    );

    let run = app.sync().await;
    let job = &run.result.job_results[0];

    assert!(job.is_ok());
    assert!(job.changes.is_empty());
    let stats = job.stats.as_ref().unwrap();
    assert_eq!(stats.total_files, None);
    assert_eq!(stats.bytes_sent, None);
    assert_eq!(run.summary.classification, Classification::Success);
}

#[tokio::test]
#[serial]
async fn test_every_directory_failing_is_failure() {
    let harness = TestHarness::new();
    let notifier = Arc::new(RecordingNotifier::failing());
    let app = BackupSync::new(harness.config(&["denied"], 30), notifier.clone());

    let run = app.sync().await;

    assert_eq!(run.summary.classification, Classification::Failure);
    assert_eq!(run.summary.classification.exit_code(), 1);
    // Delivery failures are only logged.
    assert_eq!(notifier.messages().len(), 2);
    assert!(notifier.messages()[1].contains("Backup Sync Failed"));
}

#[tokio::test]
#[serial]
async fn test_missing_rsync_binary_is_launch_failure() {
    let harness = TestHarness::new();
    let mut config = harness.config(&["photos"], 30);
    config.rsync_path = harness.path().join("no-such-rsync").display().to_string();
    let app = BackupSync::new(config, Arc::new(RecordingNotifier::default()));

    let run = app.sync().await;

    assert_eq!(
        run.result.job_results[0].failure_kind(),
        Some(FailureKind::Launch)
    );
    assert_eq!(run.summary.classification, Classification::Failure);
}
