//! Reduces a run to its classification and aggregate totals.

use std::time::Duration;

use serde::Serialize;

use super::types::{ChangeKind, Classification, RunResult};

/// Classification plus the numbers the report needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub classification: Classification,
    /// From the first job's start to the last job's end.
    pub total_duration: Duration,
    /// Names of directories that synced, in configuration order.
    pub succeeded: Vec<String>,
    /// Names of directories that failed, in configuration order.
    pub failed: Vec<String>,
    pub files_transferred: u64,
    pub bytes_sent: u64,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Classifies a run.
///
/// `Success` when every job is ok, `Failure` when every job failed and
/// `PartialSuccess` for any mix. A run without jobs counts as a success.
pub fn classify(run: &RunResult) -> RunSummary {
    let (ok, failed): (Vec<_>, Vec<_>) = run.job_results.iter().partition(|j| j.is_ok());

    let classification = match (ok.is_empty(), failed.is_empty()) {
        (_, true) => Classification::Success,
        (true, false) => Classification::Failure,
        (false, false) => Classification::PartialSuccess,
    };

    let total_duration = match (run.job_results.first(), run.job_results.last()) {
        (Some(first), Some(last)) => (last.finished_at - first.started_at)
            .to_std()
            .unwrap_or_default(),
        _ => Duration::ZERO,
    };

    let count = |kind: ChangeKind| -> usize {
        ok.iter().map(|j| j.changes_of(kind).count()).sum()
    };

    RunSummary {
        classification,
        total_duration,
        succeeded: ok.iter().map(|j| j.spec.name.clone()).collect(),
        failed: failed.iter().map(|j| j.spec.name.clone()).collect(),
        files_transferred: ok
            .iter()
            .filter_map(|j| j.stats.as_ref()?.files_transferred)
            .sum(),
        bytes_sent: ok
            .iter()
            .filter_map(|j| j.stats.as_ref()?.bytes_sent)
            .sum(),
        added: count(ChangeKind::Added),
        updated: count(ChangeKind::Updated),
        deleted: count(ChangeKind::Deleted),
    }
}
