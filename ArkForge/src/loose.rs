//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Directory-backed archive without a header
//!
//! Every regular file below the root is a committed entry addressed by its
//! relative path. Committing copies staged files into the tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::archive::Archive;
use crate::ark::entry::{ArkEntry, EntryPath, OffsetEntry, PendingEntry, lookup_key};
use crate::error::{Error, Result};

/// Archive view of a plain directory tree
#[derive(Debug, Clone)]
pub struct LooseArchive {
    root: PathBuf,
    committed: Vec<OffsetEntry>,
    pending: Vec<PendingEntry>,
    index: HashMap<String, ArkEntry>,
}

impl LooseArchive {
    /// Scan `root` and index every file below it
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::InvalidPath(format!(
                "not a directory: {}",
                root.display()
            )));
        }

        let mut archive = Self {
            root,
            committed: Vec::new(),
            pending: Vec::new(),
            index: HashMap::new(),
        };
        archive.scan()?;

        tracing::info!(
            "Opened directory archive {} ({} entries)",
            archive.root.display(),
            archive.committed.len()
        );
        Ok(archive)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(&mut self) -> Result<()> {
        let mut committed = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;
            let len = entry.metadata()?.len();
            let Ok(size) = u32::try_from(len) else {
                tracing::warn!("Skipping {}: too large for an entry", entry.path().display());
                continue;
            };

            committed.push(OffsetEntry {
                path: EntryPath::parse(&relative.to_string_lossy()),
                offset: 0,
                part: 0,
                part_offset: 0,
                size,
                inflated_size: 0,
                flag: 0,
            });
        }

        self.committed = committed;
        self.rebuild_index();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for entry in &self.committed {
            self.index
                .insert(entry.path.lookup_key(), ArkEntry::Offset(entry.clone()));
        }
        for entry in &self.pending {
            self.index
                .insert(entry.path.lookup_key(), ArkEntry::Pending(entry.clone()));
        }
    }
}

impl Archive for LooseArchive {
    fn lookup(&self, path: &str) -> Option<ArkEntry> {
        self.index.get(&lookup_key(path)).cloned()
    }

    fn entries(&self) -> Vec<ArkEntry> {
        let committed = self
            .committed
            .iter()
            .filter(|e| matches!(self.index.get(&e.path.lookup_key()), Some(ArkEntry::Offset(_))))
            .cloned()
            .map(ArkEntry::Offset);

        let mut entries: Vec<ArkEntry> = self
            .pending
            .iter()
            .cloned()
            .map(ArkEntry::Pending)
            .chain(committed)
            .collect();
        entries.sort_by_cached_key(ArkEntry::full_path);
        entries
    }

    fn stage(&mut self, local_path: &Path, target_path: &str) -> Result<()> {
        let path = EntryPath::parse(target_path);
        if path.file_name().is_empty() {
            return Err(Error::InvalidPath(format!("empty entry path: {target_path:?}")));
        }
        if !local_path.is_file() {
            return Err(Error::InvalidPath(format!(
                "not a file: {}",
                local_path.display()
            )));
        }

        let key = path.lookup_key();
        let entry = PendingEntry {
            path,
            local_path: local_path.to_path_buf(),
        };

        self.pending.retain(|e| e.path.lookup_key() != key);
        self.index.insert(key, ArkEntry::Pending(entry.clone()));
        self.pending.push(entry);
        Ok(())
    }

    fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        for entry in &self.pending {
            // Replace an existing file even when its name differs in case
            let key = entry.path.lookup_key();
            let destination = self
                .committed
                .iter()
                .find(|c| c.path.lookup_key() == key)
                .map_or_else(
                    || entry.path.to_local_path(&self.root),
                    |c| c.path.to_local_path(&self.root),
                );

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&entry.local_path, &destination)?;
            tracing::debug!("Copied {} to {}", entry.local_path.display(), destination.display());
        }

        let count = self.pending.len();
        self.pending.clear();
        self.scan()?;

        tracing::info!("Committed {} files to {}", count, self.root.display());
        Ok(())
    }

    fn read_bytes(&self, entry: &ArkEntry) -> Result<Vec<u8>> {
        let path = match entry {
            ArkEntry::Offset(entry) => entry.path.to_local_path(&self.root),
            ArkEntry::Pending(entry) => entry.local_path.clone(),
        };
        Ok(fs::read(path)?)
    }
}
