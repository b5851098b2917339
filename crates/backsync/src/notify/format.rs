//! HTML rendering of notifications for Telegram's `parse_mode=HTML`.

use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, Local};

use super::report::{ChangeSummary, DirectoryReport, Report, RunStarted};
use crate::sanitize::escape_html;
use crate::sync::Classification;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Human readable size in binary steps: `1536` → `1.50 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

/// `H:MM:SS`, sub-second part dropped.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn format_time(at: &DateTime<Local>) -> String {
    at.format(TIME_FORMAT).to_string()
}

fn or_na(value: Option<u64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn size_or_na(value: Option<u64>) -> String {
    value.map_or_else(|| "N/A".to_string(), format_size)
}

/// Message sent before the first directory is synced.
pub fn format_start_message(started: &RunStarted) -> String {
    let mut message = String::new();
    let _ = writeln!(message, "🔄 <b>Backup Sync Started</b>\n");
    let _ = writeln!(message, "📅 <b>Time:</b> {}", format_time(&started.started_at));
    let _ = writeln!(
        message,
        "📁 <b>Directories:</b> {}\n",
        started.directories.len()
    );
    for dir in &started.directories {
        let _ = writeln!(
            message,
            "📂 {}: {} → {}",
            escape_html(&dir.name),
            escape_html(&dir.source_path),
            escape_html(&dir.dest_path)
        );
    }
    let _ = write!(
        message,
        "\n<b>Source Server:</b> {}",
        escape_html(&started.source_server)
    );
    message
}

/// Message for `--test-telegram`.
pub fn format_test_message(at: &DateTime<Local>) -> String {
    format!(
        "🧪 <b>Test Notification</b>\n\n\
         📅 <b>Time:</b> {}\n\n\
         This is a test message from the backup sync service.\n\
         If you can see this, Telegram notifications are working correctly! ✅",
        format_time(at)
    )
}

/// Completion message, shaped by the run's classification.
pub fn format_report(report: &Report) -> String {
    match report.classification {
        Classification::Success => format_success(report),
        Classification::Failure => format_failure(report),
        Classification::PartialSuccess => format_partial(report),
    }
}

fn write_header(message: &mut String, title: &str, report: &Report) {
    let _ = writeln!(message, "{}\n", title);
    let _ = writeln!(message, "📅 <b>Time:</b> {}", format_time(&report.started_at));
    let _ = writeln!(
        message,
        "⏱️ <b>Total Duration:</b> {}",
        format_duration(report.total_duration)
    );
}

fn write_change_block(message: &mut String, icon: &str, label: &str, changes: &ChangeSummary) {
    if changes.count == 0 {
        return;
    }
    let _ = writeln!(message, "   {} {}: {} files", icon, label, changes.count);
    for path in &changes.sample {
        let _ = writeln!(message, "      • {}", escape_html(path));
    }
    if changes.remaining > 0 {
        let _ = writeln!(message, "      ... and {} more", changes.remaining);
    }
}

fn write_directory_detail(message: &mut String, dir: &DirectoryReport) {
    let stats = dir.stats.clone().unwrap_or_default();
    let _ = writeln!(message, "\n📂 <b>{}</b>", escape_html(&dir.name));
    let _ = writeln!(message, "   ⏱️ Duration: {}", format_duration(dir.duration));
    let _ = writeln!(message, "   🗂️ Files: {}", or_na(stats.total_files));
    let _ = writeln!(
        message,
        "   📊 Transferred: {} files",
        or_na(stats.files_transferred)
    );
    let _ = writeln!(message, "   💾 Size: {}", size_or_na(stats.total_size_bytes));
    let _ = writeln!(message, "   📤 Sent: {}", size_or_na(stats.bytes_sent));

    write_change_block(message, "➕", "Added", &dir.added);
    write_change_block(message, "🔄", "Updated", &dir.updated);
    write_change_block(message, "🗑️", "Deleted", &dir.deleted);

    if !dir.has_changes() {
        let _ = writeln!(message, "   ✅ No changes (files up to date)");
    }
}

fn format_success(report: &Report) -> String {
    let mut message = String::new();
    write_header(&mut message, "🟢 <b>Backup Sync Successful</b>", report);
    let _ = writeln!(
        message,
        "📁 <b>Directories:</b> {}",
        report.directories.len()
    );
    for dir in report.succeeded() {
        write_directory_detail(&mut message, dir);
    }
    message
}

fn format_failure(report: &Report) -> String {
    let mut message = String::new();
    let failed: Vec<_> = report.failed().collect();

    write_header(&mut message, "🔴 <b>Backup Sync Failed</b>", report);
    let _ = writeln!(message, "📁 <b>Failed Directories:</b> {}", failed.len());

    for dir in failed.iter().take(report.max_failures_listed) {
        let _ = writeln!(message, "\n📂 <b>{}</b>", escape_html(&dir.name));
        let _ = writeln!(
            message,
            "   ❌ Error: {}",
            escape_html(dir.error.as_deref().unwrap_or("Unknown error"))
        );
        let _ = writeln!(
            message,
            "   📍 {}:{} → local:{}",
            escape_html(&report.source_server),
            escape_html(&dir.source_path),
            escape_html(&dir.dest_path)
        );
    }

    if failed.len() > report.max_failures_listed {
        let _ = writeln!(
            message,
            "\n... and {} more failures",
            failed.len() - report.max_failures_listed
        );
    }

    let _ = write!(message, "\nPlease check the logs for more details.");
    message
}

fn format_partial(report: &Report) -> String {
    let mut message = String::new();
    write_header(&mut message, "🟡 <b>Backup Sync Partial Success</b>", report);
    let _ = writeln!(message, "✅ <b>Successful:</b> {}", report.summary.succeeded.len());
    let _ = writeln!(message, "❌ <b>Failed:</b> {}", report.summary.failed.len());

    let _ = writeln!(message, "\n<b>Successful:</b>");
    for dir in report.succeeded() {
        let _ = writeln!(
            message,
            "📂 {} ({})",
            escape_html(&dir.name),
            dir.change_tag()
        );
    }

    let _ = writeln!(message, "\n<b>Failed:</b>");
    for dir in report.failed() {
        match &dir.error {
            Some(error) => {
                let _ = writeln!(
                    message,
                    "📂 {}: {}",
                    escape_html(&dir.name),
                    escape_html(error)
                );
            }
            None => {
                let _ = writeln!(message, "📂 {}", escape_html(&dir.name));
            }
        }
    }

    let _ = write!(message, "\nPlease check the logs for error details.");
    message
}
