//! Parsing of a finished job's transcript into stats and a change ledger.
//!
//! The trailing `--stats` block looks like:
//!
//! ```text
//! Number of files: 1,234 (reg: 1,100, dir: 134)
//! Number of regular files transferred: 12
//! Total file size: 2,100,000,000 bytes
//! Total bytes sent: 4,096
//! Total bytes received: 1.05M
//! ```
//!
//! Parsing never fails: unknown or malformed lines are skipped and missing
//! fields stay `None`.

use std::sync::LazyLock;

use regex::Regex;

use super::itemize::parse_change_line;
use super::types::{ChangeEvent, JobStats};

static RE_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9][0-9,.]*)\s*([kKmMgGtTpP])?").unwrap());
static RE_REGULAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"reg:\s*([0-9][0-9,.]*\s*[kKmMgGtTpP]?)").unwrap());
static RE_DIRECTORIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dir:\s*([0-9][0-9,.]*\s*[kKmMgGtTpP]?)").unwrap());

/// One recognized line of the stats block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsLine {
    /// `Number of files: N (reg: R, dir: D)`; the breakdown is missing on old rsync.
    FileCount {
        total: Option<u64>,
        regular: Option<u64>,
        directories: Option<u64>,
    },
    /// `Number of regular files transferred: N` (`Number of files transferred` before 3.1).
    FilesTransferred(Option<u64>),
    /// `Total file size: N bytes`
    TotalFileSize(Option<u64>),
    /// `Total bytes sent: N`
    BytesSent(Option<u64>),
    /// `Total bytes received: N`
    BytesReceived(Option<u64>),
    /// Any other label of the block (created/deleted counts, literal data, timings...).
    OtherField,
    /// Not a stats line at all.
    Unrecognized,
}

impl StatsLine {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some((label, value)) = line.split_once(':') else {
            return Self::Unrecognized;
        };
        let value = value.trim();

        match label {
            "Number of files" => Self::FileCount {
                total: parse_quantity(value),
                regular: capture_quantity(&RE_REGULAR, value),
                directories: capture_quantity(&RE_DIRECTORIES, value),
            },
            "Number of regular files transferred" | "Number of files transferred" => {
                Self::FilesTransferred(parse_quantity(value))
            }
            "Total file size" => Self::TotalFileSize(parse_quantity(value)),
            "Total bytes sent" => Self::BytesSent(parse_quantity(value)),
            "Total bytes received" => Self::BytesReceived(parse_quantity(value)),
            "Number of created files"
            | "Number of deleted files"
            | "Total transferred file size"
            | "Literal data"
            | "Matched data"
            | "File list size"
            | "File list generation time"
            | "File list transfer time" => Self::OtherField,
            _ => Self::Unrecognized,
        }
    }

    fn is_stats(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }

    fn apply(self, stats: &mut JobStats) {
        match self {
            Self::FileCount {
                total,
                regular,
                directories,
            } => {
                stats.total_files = total.or(stats.total_files);
                stats.regular_files = regular.or(stats.regular_files);
                stats.directories = directories.or(stats.directories);
            }
            Self::FilesTransferred(n) => stats.files_transferred = n.or(stats.files_transferred),
            Self::TotalFileSize(n) => stats.total_size_bytes = n.or(stats.total_size_bytes),
            Self::BytesSent(n) => stats.bytes_sent = n.or(stats.bytes_sent),
            Self::BytesReceived(n) => stats.bytes_received = n.or(stats.bytes_received),
            Self::OtherField | Self::Unrecognized => {}
        }
    }
}

/// Stats and change ledger extracted from one transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTranscript {
    pub stats: JobStats,
    pub changes: Vec<ChangeEvent>,
}

/// Parses the full line sequence of a successful job.
///
/// Change lines are only collected before the stats block starts; each stats
/// field is extracted independently of the others.
pub fn parse_transcript<S: AsRef<str>>(lines: &[S]) -> ParsedTranscript {
    let mut parsed = ParsedTranscript::default();
    let mut in_summary = false;

    for line in lines {
        let line = line.as_ref();

        let stats_line = StatsLine::parse(line);
        if stats_line.is_stats() {
            in_summary = true;
            stats_line.apply(&mut parsed.stats);
            continue;
        }

        if in_summary {
            continue;
        }

        if let Some(change) = parse_change_line(line) {
            parsed.changes.push(change);
        }
    }

    parsed
}

/// Normalizes a displayed quantity to a plain number.
///
/// Grouping commas are dropped and `K`, `M`, `G`, `T`, `P` suffixes use
/// decimal multipliers, the way rsync's `-h` output is meant to be read.
/// Fractional values are rounded to the nearest unit.
///
/// `"2.1 GB"` → `2_100_000_000`, `"1,234 bytes"` → `1_234`, `"n/a"` → `None`.
pub fn parse_quantity(text: &str) -> Option<u64> {
    let caps = RE_QUANTITY.captures(text.trim())?;
    let number = caps.get(1)?.as_str();
    let multiplier = caps
        .get(2)
        .map(|m| suffix_multiplier(m.as_str()))
        .unwrap_or(1);

    let dots = number.matches('.').count();
    let commas = number.matches(',').count();

    // "1.234.567" uses dots for grouping; "1,234.5" uses them as decimal point.
    let normalized: String = if dots > 1 && commas == 0 {
        number.chars().filter(|c| *c != '.').collect()
    } else {
        number.chars().filter(|c| *c != ',').collect()
    };
    let normalized = normalized.trim_end_matches('.');

    if !normalized.contains('.') {
        return normalized.parse::<u64>().ok()?.checked_mul(multiplier);
    }

    let value: f64 = normalized.parse().ok()?;
    let scaled = (value * multiplier as f64).round();
    if !scaled.is_finite() || scaled < 0.0 || scaled > u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

fn suffix_multiplier(suffix: &str) -> u64 {
    match suffix.to_ascii_uppercase().as_str() {
        "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        _ => 1,
    }
}

fn capture_quantity(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_quantity(m.as_str()))
}
