//! Top-level wiring of config, runner and notifier for one invocation.

use std::sync::Arc;

use chrono::Local;
use log::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::notify::format::format_test_message;
use crate::notify::{Notifier, ReportOptions, TelegramNotifier};
use crate::sync::{JobExecutor, Orchestrator, RsyncRunner, RunReport};

/// One configured backup sync service.
pub struct BackupSync {
    config: Config,
    executor: Arc<dyn JobExecutor>,
    notifier: Arc<dyn Notifier>,
}

impl BackupSync {
    /// Uses rsync as configured and the given notifier.
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let executor = Arc::new(RsyncRunner::new(
            config.rsync_path.clone(),
            config.transport(),
        ));
        Self {
            config,
            executor,
            notifier,
        }
    }

    /// Resolves the bot token and talks to the real Telegram API.
    pub fn from_config(config: Config) -> Result<Self> {
        let token = config.telegram.resolve_bot_token()?;
        let notifier = TelegramNotifier::new(&token, config.telegram.chat_id.clone())?;
        Ok(Self::new(config, Arc::new(notifier)))
    }

    /// Replaces the job executor.
    pub fn with_executor(mut self, executor: Arc<dyn JobExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Syncs every configured directory once and reports the outcome.
    pub async fn sync(&self) -> RunReport {
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.executor),
            Arc::clone(&self.notifier),
            self.config.source_server.clone(),
        )
        .with_options(ReportOptions {
            sample_size: self.config.sample_size,
            max_failures_listed: self.config.max_failures_listed,
            ..ReportOptions::default()
        });

        orchestrator.run(&self.config.directory_specs()).await
    }

    /// Sends the test message. Returns whether it was delivered.
    pub async fn send_test_notification(&self) -> bool {
        info!("Sending test notification");
        match self
            .notifier
            .send_message(&format_test_message(&Local::now()))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!("Test notification failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::notify::NotifyError;
    use crate::sync::classify::tests::job;
    use crate::sync::{Classification, DirectorySpec, JobResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Recorder {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn send_message(&self, text: &str) -> std::result::Result<(), NotifyError> {
            self.messages.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(NotifyError::Api {
                    status: 401,
                    body: "Unauthorized".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct AlwaysOk;

    #[async_trait]
    impl JobExecutor for AlwaysOk {
        async fn execute(&self, spec: Arc<DirectorySpec>) -> JobResult {
            JobResult {
                spec,
                ..job("unused", true, 0, 1)
            }
        }
    }

    fn config() -> Config {
        load_config_from_str(
            r#"{
                "source_server": "backup@nas",
                "ssh_key_path": "/keys/id",
                "sample_size": 1,
                "telegram": { "bot_token": "1:x", "chat_id": 42 },
                "directories": [
                    { "name": "one", "source_path": "/a", "dest_path": "/b" },
                    { "name": "two", "source_path": "/c", "dest_path": "/d" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sync_runs_every_directory() {
        let notifier = Recorder::new(false);
        let app = BackupSync::new(config(), notifier.clone()).with_executor(Arc::new(AlwaysOk));

        let run = app.sync().await;

        assert_eq!(run.summary.classification, Classification::Success);
        assert_eq!(run.summary.classification.exit_code(), 0);
        let names: Vec<_> = run.report.directories.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(notifier.messages.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_send_test_notification() {
        let ok = Recorder::new(false);
        assert!(BackupSync::new(config(), ok.clone()).send_test_notification().await);
        assert!(ok.messages.lock().unwrap()[0].contains("Test Notification"));

        let failing = Recorder::new(true);
        assert!(!BackupSync::new(config(), failing).send_test_notification().await);
    }

    #[test]
    fn test_from_config_resolves_token() {
        assert!(BackupSync::from_config(config()).is_ok());
    }
}
