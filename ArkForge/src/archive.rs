//! Common contract of header-backed and directory-backed archives

use std::path::Path;

use crate::ark::{ArkArchive, ArkEntry};
use crate::error::{Error, Result};
use crate::loose::LooseArchive;

/// Read, stage and commit access to an archive directory.
///
/// Implemented by [`ArkArchive`] (header + data parts) and
/// [`LooseArchive`] (a plain directory tree).
pub trait Archive: Send + Sync {
    /// Find an entry by path, case-insensitively. Staged entries shadow
    /// committed ones.
    fn lookup(&self, path: &str) -> Option<ArkEntry>;

    /// Staged entries and the committed entries they do not shadow,
    /// sorted together by full path
    fn entries(&self) -> Vec<ArkEntry>;

    /// Stage `local_path` for inclusion at `target_path`, replacing an
    /// earlier staging of the same path
    fn stage(&mut self, local_path: &Path, target_path: &str) -> Result<()>;

    fn has_pending_changes(&self) -> bool;

    /// Write all staged files; a no-op without pending changes
    fn commit(&mut self) -> Result<()>;

    fn read_bytes(&self, entry: &ArkEntry) -> Result<Vec<u8>>;

    /// Look up `path` and read its bytes
    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .lookup(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))?;
        self.read_bytes(&entry)
    }
}

impl Archive for ArkArchive {
    fn lookup(&self, path: &str) -> Option<ArkEntry> {
        ArkArchive::lookup(self, path)
    }

    fn entries(&self) -> Vec<ArkEntry> {
        ArkArchive::entries(self)
    }

    fn stage(&mut self, local_path: &Path, target_path: &str) -> Result<()> {
        ArkArchive::stage(self, local_path, target_path)
    }

    fn has_pending_changes(&self) -> bool {
        ArkArchive::has_pending_changes(self)
    }

    fn commit(&mut self) -> Result<()> {
        ArkArchive::commit(self)
    }

    fn read_bytes(&self, entry: &ArkEntry) -> Result<Vec<u8>> {
        ArkArchive::read_bytes(self, entry)
    }
}

/// Open a directory as a [`LooseArchive`] or anything else as an
/// [`ArkArchive`]
pub fn open_archive<P: AsRef<Path>>(path: P) -> Result<Box<dyn Archive>> {
    let path = path.as_ref();
    if path.is_dir() {
        Ok(Box::new(LooseArchive::open(path)?))
    } else {
        Ok(Box::new(ArkArchive::open(path)?))
    }
}
