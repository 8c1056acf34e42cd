//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Entry descriptors for committed and staged archive files

use std::fmt;
use std::path::{Path, PathBuf};

/// Directory + file name of an archive entry.
///
/// An empty directory or `"."` is the archive root. Equality and hashing are
/// case-sensitive on the raw strings; directory lookups go through
/// [`EntryPath::lookup_key`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryPath {
    directory: String,
    file_name: String,
}

impl EntryPath {
    /// Build a path from its directory and file name parts
    #[must_use]
    pub fn new(file_name: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Split a full `dir/sub/file.ext` path at its last separator.
    ///
    /// Backslashes are treated as separators, and leading `./` or `/`
    /// is dropped.
    #[must_use]
    pub fn parse(full_path: &str) -> Self {
        let normalized = normalize_path(full_path);
        match normalized.rsplit_once('/') {
            Some((directory, file_name)) => Self::new(file_name, directory),
            None => Self::new(normalized, ""),
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// True when the entry sits at the archive root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.directory.is_empty() || self.directory == "."
    }

    /// `directory/file_name`, or just `file_name` at the root
    #[must_use]
    pub fn full_path(&self) -> String {
        if self.is_root() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.directory, self.file_name)
        }
    }

    /// Case-insensitive key used for directory membership
    #[must_use]
    pub fn lookup_key(&self) -> String {
        lookup_key(&self.full_path())
    }

    /// Destination path of this entry below `root`
    #[must_use]
    pub fn to_local_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        if !self.is_root() {
            path.extend(self.directory.split('/').filter(|s| !s.is_empty() && *s != "."));
        }
        path.push(&self.file_name);
        path
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

/// Normalize separators to `/` and strip leading `./` and `/`
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    loop {
        if let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_string();
        } else if let Some(rest) = normalized.strip_prefix('/') {
            normalized = rest.to_string();
        } else {
            break;
        }
    }
    normalized
}

/// Case-insensitive directory key for a full entry path
#[must_use]
pub fn lookup_key(full_path: &str) -> String {
    normalize_path(full_path).to_lowercase()
}

/// Flag written for new non-empty entries of v8/v9 chained directories
pub const DEFAULT_ENTRY_FLAG: i32 = 0x7D401F60;

/// Chained-directory flag for an entry that has none stored
#[must_use]
pub const fn default_entry_flag(size: u32) -> i32 {
    if size > 0 { DEFAULT_ENTRY_FLAG } else { 0 }
}

/// An entry whose bytes already live in one of the data parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetEntry {
    pub path: EntryPath,
    /// Offset within the logical concatenation of all data parts
    pub offset: u64,
    /// Physical part index (1+ for multi-part archives, 0 for single-file)
    pub part: usize,
    /// Offset within the physical part
    pub part_offset: u64,
    pub size: u32,
    /// Non-zero only for compressed entries of pre-v3 archives
    pub inflated_size: u32,
    /// Opaque per-entry flag of v8/v9 chained directories
    pub flag: i32,
}

impl OffsetEntry {
    /// End of this entry's range in logical offset space
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }

    /// True when two entries in the same part share any byte
    #[must_use]
    pub fn overlaps(&self, other: &OffsetEntry) -> bool {
        self.part == other.part
            && self.size > 0
            && other.size > 0
            && self.offset < other.end()
            && other.offset < self.end()
    }
}

/// A staged entry backed by a file on the local file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub path: EntryPath,
    pub local_path: PathBuf,
}

/// Either kind of entry in the merged directory view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArkEntry {
    Offset(OffsetEntry),
    Pending(PendingEntry),
}

impl ArkEntry {
    #[must_use]
    pub fn path(&self) -> &EntryPath {
        match self {
            ArkEntry::Offset(entry) => &entry.path,
            ArkEntry::Pending(entry) => &entry.path,
        }
    }

    #[must_use]
    pub fn full_path(&self) -> String {
        self.path().full_path()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, ArkEntry::Pending(_))
    }

    /// Stored size for committed entries, `None` for pending ones
    #[must_use]
    pub fn size(&self) -> Option<u32> {
        match self {
            ArkEntry::Offset(entry) => Some(entry.size),
            ArkEntry::Pending(_) => None,
        }
    }
}
