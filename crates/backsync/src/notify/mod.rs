//! Run reports and their delivery to the operator.
//!
//! - [`report`] turns a finished run into a structured [`Report`]
//! - [`format`] renders reports into HTML chat messages
//! - [`telegram`] posts messages through the Telegram Bot API

pub mod error;
pub mod format;
pub mod report;
pub mod telegram;

use async_trait::async_trait;

pub use error::NotifyError;
pub use report::{ChangeSummary, DirectoryReport, Report, ReportOptions, RunStarted};
pub use telegram::TelegramNotifier;

/// Delivers a rendered message to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError>;
}
