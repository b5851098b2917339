//! Runs the sync tool for one directory and turns its outcome into a `JobResult`.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::command::{SshTransport, SyncCommand};
use super::stats::parse_transcript;
use super::types::{DirectorySpec, FailureKind, JobOutcome, JobResult, JobStats};

/// Error text recorded for a job that exceeded its budget.
pub const TIMEOUT_MESSAGE: &str = "Timeout";

/// Executes one job. The orchestrator only depends on this seam.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, spec: Arc<DirectorySpec>) -> JobResult;
}

/// Which pipe a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Combined console output of one process, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Vec<(Stream, String)>,
}

impl Transcript {
    pub fn push(&mut self, stream: Stream, line: String) {
        self.lines.push((stream, line));
    }

    pub fn lines(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, l)| l.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Last non-empty line written to stderr.
    pub fn last_error_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .filter(|(stream, _)| *stream == Stream::Stderr)
            .map(|(_, line)| line.trim())
            .find(|line| !line.is_empty())
    }

    fn stderr_text(&self) -> String {
        self.lines
            .iter()
            .filter(|(stream, _)| *stream == Stream::Stderr)
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How a single process invocation ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    Exited {
        status: ExitStatus,
        transcript: Transcript,
    },
    TimedOut,
    LaunchFailed(std::io::Error),
}

/// Spawns `command`, captures stdout and stderr line by line and waits for it
/// to exit. The process is killed and reaped if it outlives `timeout`.
pub async fn run_process(command: &SyncCommand, timeout: Duration) -> ProcessOutcome {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return ProcessOutcome::LaunchFailed(e),
    };

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let capture = async {
        let mut transcript = Transcript::default();
        let mut stdout = stdout_pipe.map(|p| BufReader::new(p).split(b'\n'));
        let mut stderr = stderr_pipe.map(|p| BufReader::new(p).split(b'\n'));

        loop {
            tokio::select! {
                line = next_line(&mut stdout), if stdout.is_some() => match line {
                    Some(line) => transcript.push(Stream::Stdout, line),
                    None => stdout = None,
                },
                line = next_line(&mut stderr), if stderr.is_some() => match line {
                    Some(line) => transcript.push(Stream::Stderr, line),
                    None => stderr = None,
                },
                else => break,
            }
        }

        let status = child.wait().await;
        (status, transcript)
    };

    let finished = tokio::time::timeout(timeout, capture).await;
    match finished {
        Ok((Ok(status), transcript)) => ProcessOutcome::Exited { status, transcript },
        Ok((Err(e), _)) => ProcessOutcome::LaunchFailed(e),
        Err(_) => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill timed out process {}: {}", command.program, e);
            }
            ProcessOutcome::TimedOut
        }
    }
}

/// Next line of a pipe, decoded lossily so non-UTF-8 output never stops the
/// pipe from being drained. `None` only at EOF or on an I/O error.
async fn next_line<R>(reader: &mut Option<tokio::io::Split<R>>) -> Option<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let segment = reader.as_mut()?.next_segment().await.ok().flatten()?;
    let line = String::from_utf8_lossy(&segment);
    Some(line.strip_suffix('\r').unwrap_or(&line).to_string())
}

/// Classifies a failed run's diagnostic text.
pub fn classify_failure(stderr: &str, exit_code: Option<i32>) -> FailureKind {
    let lower = stderr.to_lowercase();

    // 255 comes from ssh itself; 12 is a broken rsync protocol stream.
    if matches!(exit_code, Some(255) | Some(12))
        || lower.contains("permission denied")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("connection closed")
        || lower.contains("connection unexpectedly closed")
        || lower.contains("could not resolve hostname")
        || lower.contains("no route to host")
        || lower.contains("host key verification failed")
        || lower.contains("network is unreachable")
    {
        return FailureKind::Transport;
    }

    FailureKind::Exit
}

/// Runs rsync over ssh for each directory handed to it.
#[derive(Debug, Clone)]
pub struct RsyncRunner {
    program: String,
    transport: SshTransport,
}

impl RsyncRunner {
    pub fn new(program: impl Into<String>, transport: SshTransport) -> Self {
        Self {
            program: program.into(),
            transport,
        }
    }

    /// Builds the command line for `spec`.
    pub fn command_for(&self, spec: &DirectorySpec) -> SyncCommand {
        SyncCommand::for_directory(&self.program, spec, &self.transport)
    }
}

#[async_trait]
impl JobExecutor for RsyncRunner {
    async fn execute(&self, spec: Arc<DirectorySpec>) -> JobResult {
        let command = self.command_for(&spec);
        run_job(spec, &command).await
    }
}

/// Runs one job with an explicit command and builds its result.
pub async fn run_job(spec: Arc<DirectorySpec>, command: &SyncCommand) -> JobResult {
    let display = command.display();
    info!("Starting rsync for {}: {}", spec.name, display);

    let started_at = Local::now();
    let clock = Instant::now();
    let outcome = run_process(command, spec.timeout).await;
    let elapsed = clock.elapsed();
    let finished_at = Local::now();

    let mut result = JobResult {
        spec: Arc::clone(&spec),
        outcome: JobOutcome::Ok,
        stats: None,
        changes: Vec::new(),
        exit_code: None,
        command: display,
        started_at,
        finished_at,
    };

    match outcome {
        ProcessOutcome::Exited { status, transcript } if status.success() => {
            debug!(
                "rsync for {} exited cleanly with {} output lines",
                spec.name,
                transcript.len()
            );
            let parsed = parse_transcript(&transcript.lines());
            if parsed.stats.is_empty() {
                warn!("No stats block found in rsync output for {}", spec.name);
            }
            result.exit_code = status.code();
            result.stats = Some(JobStats {
                duration: Some(elapsed),
                ..parsed.stats
            });
            result.changes = parsed.changes;
        }
        ProcessOutcome::Exited { status, transcript } => {
            let code = status.code();
            let message = transcript
                .last_error_line()
                .map(str::to_string)
                .unwrap_or_else(|| match code {
                    Some(code) => format!("rsync exited with status {}", code),
                    None => "rsync was terminated by a signal".to_string(),
                });
            result.exit_code = code;
            result.outcome = JobOutcome::Failed {
                kind: classify_failure(&transcript.stderr_text(), code),
                message,
            };
        }
        ProcessOutcome::TimedOut => {
            warn!(
                "rsync for {} timed out after {}s",
                spec.name,
                spec.timeout.as_secs()
            );
            result.outcome = JobOutcome::Failed {
                kind: FailureKind::Timeout,
                message: TIMEOUT_MESSAGE.to_string(),
            };
        }
        ProcessOutcome::LaunchFailed(e) => {
            result.outcome = JobOutcome::Failed {
                kind: FailureKind::Launch,
                message: format!("Failed to run {}: {}", command.program, e),
            };
        }
    }

    result
}
