//! Sequences the per-directory jobs of one run.

use std::sync::Arc;

use chrono::Local;
use log::{error, info, warn};

use super::classify::{classify, RunSummary};
use super::runner::JobExecutor;
use super::types::{DirectorySpec, RunResult};
use crate::notify::format::{format_report, format_start_message};
use crate::notify::{Notifier, Report, ReportOptions, RunStarted};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: RunResult,
    pub summary: RunSummary,
    pub report: Report,
}

/// Runs every configured directory once, strictly in order.
///
/// A failed directory never aborts the run and notifier errors never change
/// its outcome; both only end up in the log.
pub struct Orchestrator {
    executor: Arc<dyn JobExecutor>,
    notifier: Arc<dyn Notifier>,
    source_server: String,
    options: ReportOptions,
}

impl Orchestrator {
    pub fn new(
        executor: Arc<dyn JobExecutor>,
        notifier: Arc<dyn Notifier>,
        source_server: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            notifier,
            source_server: source_server.into(),
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn run(&self, directories: &[Arc<DirectorySpec>]) -> RunReport {
        let started_at = Local::now();
        info!(
            "Starting backup sync of {} directories from {}",
            directories.len(),
            self.source_server
        );

        let start_message = format_start_message(&RunStarted {
            started_at,
            source_server: self.source_server.clone(),
            directories: directories.to_vec(),
        });
        self.notify(&start_message, "start").await;

        let mut job_results = Vec::with_capacity(directories.len());
        for spec in directories {
            let job = self.executor.execute(Arc::clone(spec)).await;
            match job.error_message() {
                None => info!(
                    "Sync completed for {} in {:.1}s",
                    spec.name,
                    job.duration().as_secs_f64()
                ),
                Some(message) => error!("Sync failed for {}: {}", spec.name, message),
            }
            job_results.push(job);
        }

        let result = RunResult {
            job_results,
            started_at,
            finished_at: Local::now(),
        };
        let summary = classify(&result);

        info!(
            "Backup sync finished: {} ({}/{} directories succeeded)",
            summary.classification,
            summary.succeeded.len(),
            result.job_results.len()
        );
        if !summary.failed.is_empty() {
            error!("Failed directories: {}", summary.failed.join(", "));
        }

        let report = Report::build(&result, summary.clone(), &self.source_server, &self.options);
        self.notify(&format_report(&report), "completion").await;

        RunReport {
            result,
            summary,
            report,
        }
    }

    async fn notify(&self, text: &str, what: &str) {
        if let Err(e) = self.notifier.send_message(text).await {
            warn!("Failed to send {} notification: {}", what, e);
        }
    }
}
