pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod sanitize;
pub mod secrets;
pub mod sync;

pub use app::BackupSync;
pub use config::{load_config, load_config_from_str, Config};
pub use error::{BacksyncError, ConfigError, LoggingError, Result};
pub use logging::{init_logging, LogFileGuard};
pub use notify::{Notifier, NotifyError, Report, TelegramNotifier};
pub use secrets::{resolve_secret, SecretError};
pub use sync::{
    classify, ChangeEvent, ChangeKind, Classification, DirectorySpec, JobExecutor, JobOutcome,
    JobResult, JobStats, Orchestrator, RsyncRunner, RunResult, RunSummary,
};
