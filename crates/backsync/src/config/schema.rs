use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::secrets::{expand_home, resolve_secret, SecretError};
use crate::sync::{DirectorySpec, SshTransport};

pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_LOG_FILE: &str = "backup_sync.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source_server: String,
    pub ssh_key_path: String,
    pub telegram: TelegramConfig,
    pub directories: Vec<DirectoryConfig>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_rsync_path")]
    pub rsync_path: String,
    #[serde(default = "default_strict_host_key_checking")]
    pub strict_host_key_checking: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_max_failures_listed")]
    pub max_failures_listed: usize,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_rsync_path() -> String {
    "rsync".to_string()
}

fn default_strict_host_key_checking() -> String {
    "no".to_string()
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

fn default_sample_size() -> usize {
    3
}

fn default_max_failures_listed() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub bot_token_file: Option<String>,
    #[serde(default)]
    pub bot_token_env_var: Option<String>,
    /// Numeric ids are accepted as well as strings.
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn resolve_bot_token(&self) -> Result<SecretString, SecretError> {
        resolve_secret(
            self.bot_token.as_deref(),
            self.bot_token_file.as_deref(),
            self.bot_token_env_var.as_deref(),
        )
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub name: String,
    pub source_path: String,
    pub dest_path: String,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// SSH key path with a leading `~` expanded.
    pub fn ssh_key_path(&self) -> PathBuf {
        expand_home(&self.ssh_key_path)
    }

    pub fn log_file_path(&self) -> PathBuf {
        expand_home(&self.log_file)
    }

    pub fn transport(&self) -> SshTransport {
        SshTransport {
            strict_host_key_checking: self.strict_host_key_checking.clone(),
            ..SshTransport::new(self.source_server.clone(), self.ssh_key_path())
        }
    }

    /// The directory list as immutable job specs, in configuration order.
    pub fn directory_specs(&self) -> Vec<Arc<DirectorySpec>> {
        let timeout = self.timeout();
        self.directories
            .iter()
            .map(|dir| {
                Arc::new(DirectorySpec {
                    name: dir.name.clone(),
                    source_path: dir.source_path.clone(),
                    dest_path: dir.dest_path.clone(),
                    exclusions: dir.exclusions.clone(),
                    timeout,
                })
            })
            .collect()
    }
}
