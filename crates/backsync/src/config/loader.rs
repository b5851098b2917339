use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

const SCHEMA_JSON: &str = include_str!("../../schema/config.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = load_config_from_str(&content)?;
    log::debug!(
        "Loaded config from {} with {} directories",
        path.display(),
        config.directories.len()
    );
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.source_server.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "source_server must not be empty".to_string(),
        });
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation {
            message: "timeout must be greater than zero".to_string(),
        });
    }

    let telegram = &config.telegram;
    if !has_secret_source(
        telegram.bot_token.as_deref(),
        telegram.bot_token_file.as_deref(),
        telegram.bot_token_env_var.as_deref(),
    ) {
        return Err(ConfigError::Validation {
            message: "telegram needs one of bot_token, bot_token_file or bot_token_env_var"
                .to_string(),
        });
    }
    if telegram.chat_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "telegram.chat_id must not be empty".to_string(),
        });
    }

    if config.directories.is_empty() {
        return Err(ConfigError::Validation {
            message: "'directories' must be a non-empty list".to_string(),
        });
    }

    let mut names = HashSet::new();
    for dir in &config.directories {
        if dir.name.trim().is_empty() {
            return Err(ConfigError::InvalidDirectory {
                name: dir.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if !names.insert(dir.name.as_str()) {
            return Err(ConfigError::InvalidDirectory {
                name: dir.name.clone(),
                reason: "Duplicate directory name".to_string(),
            });
        }
        if dir.source_path.trim().is_empty() || dir.dest_path.trim().is_empty() {
            return Err(ConfigError::InvalidDirectory {
                name: dir.name.clone(),
                reason: "source_path and dest_path must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
