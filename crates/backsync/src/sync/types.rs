//! Data types shared by the runner, the parsers and the classifier.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

/// One configured source/destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySpec {
    /// Display label used in logs and reports.
    pub name: String,
    /// Path on the remote server.
    pub source_path: String,
    /// Local destination path.
    pub dest_path: String,
    /// Glob patterns passed to the sync tool as `--exclude`, in order.
    pub exclusions: Vec<String>,
    /// Budget for one sync attempt.
    pub timeout: Duration,
}

/// Kind of file-level change reported by the sync tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// A single file change observed in the itemized output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChangeEvent {
    /// Path relative to the synced root, exactly as printed by the tool.
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Numeric summary of one sync job.
///
/// Every field is optional: `None` means the value was not found in the
/// tool's stats block, which is different from a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_files: Option<u64>,
    pub regular_files: Option<u64>,
    pub directories: Option<u64>,
    pub files_transferred: Option<u64>,
    pub total_size_bytes: Option<u64>,
    pub bytes_sent: Option<u64>,
    pub bytes_received: Option<u64>,
    /// Wall-clock time of the sync process.
    pub duration: Option<Duration>,
}

impl JobStats {
    /// Returns true when no field could be extracted.
    pub fn is_empty(&self) -> bool {
        self.total_files.is_none()
            && self.regular_files.is_none()
            && self.directories.is_none()
            && self.files_transferred.is_none()
            && self.total_size_bytes.is_none()
            && self.bytes_sent.is_none()
            && self.bytes_received.is_none()
    }
}

/// Why a job failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The remote shell could not connect or authenticate.
    Transport,
    /// The job exceeded its time budget and was killed.
    Timeout,
    /// The sync tool could not be started at all.
    Launch,
    /// The sync tool ran and exited with a non-zero status.
    Exit,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Launch => write!(f, "launch"),
            FailureKind::Exit => write!(f, "exit"),
        }
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Ok,
    Failed { kind: FailureKind, message: String },
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, JobOutcome::Ok)
    }
}

/// Result of one directory's sync attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub spec: Arc<DirectorySpec>,
    pub outcome: JobOutcome,
    pub stats: Option<JobStats>,
    /// Changes in the order the tool printed them.
    pub changes: Vec<ChangeEvent>,
    pub exit_code: Option<i32>,
    /// Rendered command line, for logs.
    pub command: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl JobResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Error text of a failed job.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            JobOutcome::Ok => None,
            JobOutcome::Failed { message, .. } => Some(message),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            JobOutcome::Ok => None,
            JobOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Changes of one kind, in encounter order.
    pub fn changes_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeEvent> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }
}

/// Three-valued outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Classification {
    Success,
    PartialSuccess,
    Failure,
}

impl Classification {
    /// Process exit code for cron and scripts.
    pub fn exit_code(&self) -> i32 {
        match self {
            Classification::Success => 0,
            Classification::Failure => 1,
            Classification::PartialSuccess => 2,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Success => write!(f, "success"),
            Classification::PartialSuccess => write!(f, "partial success"),
            Classification::Failure => write!(f, "failure"),
        }
    }
}

/// Aggregate of one invocation, one job result per configured directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub job_results: Vec<JobResult>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunResult {
    pub fn classification(&self) -> Classification {
        super::classify::classify(self).classification
    }
}
