//! Notification error types.

use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The request never got a response (DNS, TLS, timeout...).
    #[error("Request failed: {0}")]
    Request(String),

    /// The Bot API answered with an error status.
    #[error("Telegram API returned {status}: {body}")]
    Api { status: u16, body: String },
}
