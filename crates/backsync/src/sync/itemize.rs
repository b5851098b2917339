//! Parser for rsync `--itemize-changes` lines.
//!
//! An itemized line is an 11-character marker followed by a space and the
//! path: `YXcstpoguax path`.
//!
//! - `Y` update type: `<` sent, `>` received, `c` local change, `h` hard link,
//!   `.` not updated, `*` message (`*deleting`)
//! - `X` file type: `f` file, `d` directory, `L` symlink, `D` device, `S` special
//! - the remaining nine columns are attribute flags; `.` means unchanged and a
//!   newly created item shows `+` in every column.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{ChangeEvent, ChangeKind};

static RE_ITEMIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([<>ch.])([fdLDS])([.+? a-zA-Z]{9}) (.+)$").unwrap());

const DELETING_PREFIX: &str = "*deleting";

/// Update type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    Sent,
    Received,
    LocalChange,
    HardLink,
    NotUpdated,
}

impl UpdateType {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Sent),
            '>' => Some(Self::Received),
            'c' => Some(Self::LocalChange),
            'h' => Some(Self::HardLink),
            '.' => Some(Self::NotUpdated),
            _ => None,
        }
    }
}

/// File type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
    Symlink,
    Device,
    Special,
}

impl FileType {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'f' => Some(Self::RegularFile),
            'd' => Some(Self::Directory),
            'L' => Some(Self::Symlink),
            'D' => Some(Self::Device),
            'S' => Some(Self::Special),
            _ => None,
        }
    }
}

/// The fixed-width marker of a transfer line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemizeMarker<'a> {
    pub update: UpdateType,
    pub file_type: FileType,
    /// The nine attribute columns.
    pub flags: &'a str,
}

impl ItemizeMarker<'_> {
    /// Every attribute column is `+`: the item did not exist before.
    pub fn is_new(&self) -> bool {
        self.flags.chars().all(|c| c == '+')
    }

    /// At least one content or attribute column reports a difference.
    pub fn has_changes(&self) -> bool {
        self.flags.chars().any(|c| !matches!(c, '.' | ' ' | '?'))
    }
}

/// Every shape of line the ledger parser recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemizedLine<'a> {
    /// A marker-prefixed transfer or attribute line.
    Transfer {
        marker: ItemizeMarker<'a>,
        path: &'a str,
    },
    /// `*deleting   path`.
    Deletion { path: &'a str },
    /// Anything else: progress noise, headers, stats, warnings.
    Unrecognized,
}

impl<'a> ItemizedLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = line.strip_prefix(DELETING_PREFIX) {
            // the marker field is padded to 11 columns, then one separator
            let path = rest.trim_start_matches(' ');
            if path.is_empty() || path.len() == rest.len() {
                return Self::Unrecognized;
            }
            return Self::Deletion { path };
        }

        let Some(caps) = RE_ITEMIZED.captures(line) else {
            return Self::Unrecognized;
        };

        let update = caps[1].chars().next().and_then(UpdateType::from_char);
        let file_type = caps[2].chars().next().and_then(FileType::from_char);
        let (Some(update), Some(file_type)) = (update, file_type) else {
            return Self::Unrecognized;
        };

        let flags = caps.get(3).map_or("", |m| m.as_str());
        let path = caps.get(4).map_or("", |m| m.as_str());

        Self::Transfer {
            marker: ItemizeMarker {
                update,
                file_type,
                flags,
            },
            path,
        }
    }

    /// Maps a recognized line to a file-level change, if it represents one.
    pub fn change_kind(&self) -> Option<ChangeKind> {
        match self {
            Self::Deletion { path } if path.ends_with('/') => None,
            Self::Deletion { .. } => Some(ChangeKind::Deleted),
            Self::Transfer { marker, .. } if marker.file_type == FileType::Directory => None,
            Self::Transfer { marker, .. } if marker.is_new() => Some(ChangeKind::Added),
            Self::Transfer { marker, .. } if marker.has_changes() => Some(ChangeKind::Updated),
            Self::Transfer { .. } => None,
            Self::Unrecognized => None,
        }
    }

    fn path(&self) -> Option<&'a str> {
        match self {
            Self::Transfer { path, .. } | Self::Deletion { path } => Some(*path),
            Self::Unrecognized => None,
        }
    }
}

/// Classifies one line of tool output into a change event.
///
/// Returns `None` for directories, unchanged items and anything that is not
/// an itemized line.
pub fn parse_change_line(line: &str) -> Option<ChangeEvent> {
    let parsed = ItemizedLine::parse(line);
    let kind = parsed.change_kind()?;
    let path = parsed.path()?;
    Some(ChangeEvent::new(path, kind))
}
