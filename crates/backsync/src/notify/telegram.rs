//! Telegram Bot API notifier.

use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{Notifier, NotifyError};
use crate::sanitize::{redact_bot_token, truncate_chars};

/// Default Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of an API error body kept in errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

fn create_http_client() -> Result<Client, NotifyError> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| NotifyError::Client(e.to_string()))
}

/// Sends HTML messages to one chat through a bot.
pub struct TelegramNotifier {
    client: Client,
    /// Full `sendMessage` URL; contains the token, never log it unredacted.
    api_url: SecretString,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &SecretString, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_api_base(TELEGRAM_API_BASE, bot_token, chat_id)
    }

    /// Uses a different Bot API server (self-hosted API, tests).
    pub fn with_api_base(
        api_base: &str,
        bot_token: &SecretString,
        chat_id: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let api_url = format!(
            "{}/bot{}/sendMessage",
            api_base.trim_end_matches('/'),
            bot_token.expose_secret()
        );
        Ok(Self {
            client: create_http_client()?,
            api_url: SecretString::from(api_url),
            chat_id: chat_id.into(),
        })
    }

    async fn post(&self, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.api_url.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(redact_bot_token(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_LENGTH).to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        match self.post(text).await {
            Ok(()) => {
                info!("Telegram notification sent successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to send Telegram notification: {}", e);
                Err(e)
            }
        }
    }
}
