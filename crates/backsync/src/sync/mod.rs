//! Sync orchestration and result aggregation.
//!
//! The flow for one run:
//!
//! 1. [`Orchestrator`] walks the configured directories in order
//! 2. a [`JobExecutor`] (normally [`RsyncRunner`]) runs one transfer
//! 3. [`stats`] and [`itemize`] turn the transcript into a [`JobResult`]
//! 4. [`classify()`] reduces the [`RunResult`] to a [`Classification`]

pub mod classify;
pub mod command;
pub mod itemize;
pub mod orchestrator;
pub mod runner;
pub mod stats;
pub mod types;

pub use classify::{classify, RunSummary};
pub use command::{SshTransport, SyncCommand};
pub use itemize::parse_change_line;
pub use orchestrator::{Orchestrator, RunReport};
pub use runner::{run_job, JobExecutor, RsyncRunner, TIMEOUT_MESSAGE};
pub use stats::{parse_quantity, parse_transcript};
pub use types::{
    ChangeEvent, ChangeKind, Classification, DirectorySpec, FailureKind, JobOutcome, JobResult,
    JobStats, RunResult,
};
