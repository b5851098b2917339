//! Process-wide log setup: stderr plus an append-only run log file.
//!
//! Library code logs through the `log` macros; [`init_logging`] bridges those
//! records into a `tracing` subscriber.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

/// Keeps the run log file open. Dropping it flushes the file to disk.
#[derive(Debug)]
pub struct LogFileGuard {
    file: Arc<File>,
    path: PathBuf,
}

impl LogFileGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogFileGuard {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

/// Opens `path` for appending, creating parent directories as needed.
pub fn open_log_file(path: &Path) -> Result<LogFileGuard, LoggingError> {
    let open_error = |source| LoggingError::OpenLogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_error)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_error)?;

    Ok(LogFileGuard {
        file: Arc::new(file),
        path: path.to_path_buf(),
    })
}

fn build_filter(verbose: bool) -> Result<EnvFilter, LoggingError> {
    if verbose {
        return EnvFilter::try_new("debug").map_err(|e| LoggingError::Filter(e.to_string()));
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Installs the global subscriber. Call once, early in `main`.
///
/// `RUST_LOG` overrides the default `info` level unless `verbose` is set.
/// The returned guard must outlive the run.
pub fn init_logging(
    log_file: Option<&Path>,
    verbose: bool,
) -> Result<Option<LogFileGuard>, LoggingError> {
    let guard = log_file.map(open_log_file).transpose()?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = guard.as_ref().map(|g| {
        fmt::layer()
            .with_writer(Arc::clone(&g.file))
            .with_ansi(false)
            .with_target(true)
    });

    let subscriber = tracing_subscriber::registry()
        .with(build_filter(verbose)?)
        .with(stderr_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    if let Some(g) = &guard {
        log::debug!("Writing run log to {}", g.path().display());
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_open_log_file_creates_parents_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/nested/backup_sync.log");

        {
            let guard = open_log_file(&path).unwrap();
            (&*guard.file).write_all(b"first\n").unwrap();
        }
        {
            let guard = open_log_file(&path).unwrap();
            assert_eq!(guard.path(), path.as_path());
            (&*guard.file).write_all(b"second\n").unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_in_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let result = open_log_file(&blocker.join("run.log"));
        assert!(matches!(result, Err(LoggingError::OpenLogFile { .. })));
    }

    #[test]
    fn test_verbose_filter_is_valid() {
        assert!(build_filter(true).is_ok());
    }
}
