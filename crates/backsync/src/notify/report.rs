//! Structured report objects handed to the formatter.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::sanitize::truncate_chars;
use crate::sync::{
    ChangeKind, Classification, DirectorySpec, FailureKind, JobResult, JobStats, RunResult,
    RunSummary,
};

/// Knobs for how much detail a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Paths listed per change kind before "... and N more".
    pub sample_size: usize,
    /// Failed directories detailed in a total-failure message.
    pub max_failures_listed: usize,
    /// Error text is cut to this many characters.
    pub max_error_chars: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            sample_size: 3,
            max_failures_listed: 3,
            max_error_chars: 200,
        }
    }
}

/// Payload of the "run started" notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    pub started_at: DateTime<Local>,
    pub source_server: String,
    pub directories: Vec<Arc<DirectorySpec>>,
}

/// Count of one change kind plus the first few paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub count: usize,
    pub sample: Vec<String>,
    /// `count - sample.len()`, shown as "... and N more".
    pub remaining: usize,
}

impl ChangeSummary {
    pub fn from_job(job: &JobResult, kind: ChangeKind, sample_size: usize) -> Self {
        let count = job.changes_of(kind).count();
        let sample: Vec<String> = job
            .changes_of(kind)
            .take(sample_size)
            .map(|c| c.path.clone())
            .collect();
        Self {
            count,
            remaining: count - sample.len(),
            sample,
        }
    }
}

/// Per-directory section of a report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryReport {
    pub name: String,
    pub source_path: String,
    pub dest_path: String,
    pub duration: Duration,
    pub ok: bool,
    pub stats: Option<JobStats>,
    pub added: ChangeSummary,
    pub updated: ChangeSummary,
    pub deleted: ChangeSummary,
    pub failure_kind: Option<FailureKind>,
    pub error: Option<String>,
}

impl DirectoryReport {
    pub fn from_job(job: &JobResult, options: &ReportOptions) -> Self {
        Self {
            name: job.spec.name.clone(),
            source_path: job.spec.source_path.clone(),
            dest_path: job.spec.dest_path.clone(),
            duration: job.duration(),
            ok: job.is_ok(),
            stats: job.stats.clone(),
            added: ChangeSummary::from_job(job, ChangeKind::Added, options.sample_size),
            updated: ChangeSummary::from_job(job, ChangeKind::Updated, options.sample_size),
            deleted: ChangeSummary::from_job(job, ChangeKind::Deleted, options.sample_size),
            failure_kind: job.failure_kind(),
            error: job
                .error_message()
                .map(|m| truncate_chars(m, options.max_error_chars).to_string()),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.added.count + self.updated.count + self.deleted.count > 0
    }

    /// Compact change tag such as `+3 ~1 -2`, or `no changes`.
    pub fn change_tag(&self) -> String {
        let mut parts = Vec::new();
        if self.added.count > 0 {
            parts.push(format!("+{}", self.added.count));
        }
        if self.updated.count > 0 {
            parts.push(format!("~{}", self.updated.count));
        }
        if self.deleted.count > 0 {
            parts.push(format!("-{}", self.deleted.count));
        }
        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Everything the completion message needs about a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub classification: Classification,
    pub started_at: DateTime<Local>,
    pub total_duration: Duration,
    pub source_server: String,
    pub summary: RunSummary,
    /// One entry per configured directory, in configuration order.
    pub directories: Vec<DirectoryReport>,
    pub max_failures_listed: usize,
}

impl Report {
    pub fn build(
        run: &RunResult,
        summary: RunSummary,
        source_server: &str,
        options: &ReportOptions,
    ) -> Self {
        Self {
            classification: summary.classification,
            started_at: run.started_at,
            total_duration: summary.total_duration,
            source_server: source_server.to_string(),
            directories: run
                .job_results
                .iter()
                .map(|job| DirectoryReport::from_job(job, options))
                .collect(),
            summary,
            max_failures_listed: options.max_failures_listed,
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DirectoryReport> {
        self.directories.iter().filter(|d| d.ok)
    }

    pub fn failed(&self) -> impl Iterator<Item = &DirectoryReport> {
        self.directories.iter().filter(|d| !d.ok)
    }
}
