//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Header-backed ARK archive: open, stage, commit and read

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;

use super::allocator::Allocator;
use super::entry::{ArkEntry, EntryPath, OffsetEntry, PendingEntry, default_entry_flag, lookup_key};
use super::header::{ArkHeader, HeaderEncryption, HeaderReader, HeaderWriter, MAX_HDR_SIZE};
use super::parts::{
    is_numbered_part, part_path, probe_part_size, resolve_header_path, stored_part_path,
};
use super::version::ArkVersion;
use crate::config::ArkOptions;
use crate::error::{Error, Result};

/// Where a directory key currently points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Committed(usize),
    Pending(usize),
}

/// A versioned, possibly multi-part ARK archive.
///
/// Committed entries come from the header; staged entries live only in
/// memory until [`ArkArchive::commit`] copies their bytes into the data
/// parts and rewrites the header. File handles are opened per operation.
#[derive(Debug, Clone)]
pub struct ArkArchive {
    header: ArkHeader,
    /// `[0]` is the header file, `[1..]` the data parts in order.
    /// Single-file archives only have `[0]`.
    paths: Vec<PathBuf>,
    pending: Vec<PendingEntry>,
    index: HashMap<String, Slot>,
}

impl ArkArchive {
    /// Open an archive from its header file.
    ///
    /// A data part path (`main_0.ark`) is redirected to its header, and a
    /// plain `.ark` file is parsed in place as a single-file archive.
    ///
    /// # Errors
    /// Returns [`Error::HeaderTooLarge`] for headers above 20 MiB, and any
    /// error from [`HeaderReader::read`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = resolve_header_path(path.as_ref())?;

        let standalone_ark = !is_numbered_part(&path)
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ark"));

        let header = if standalone_ark {
            HeaderReader::new(BufReader::new(File::open(&path)?)).read()?
        } else {
            let size = fs::metadata(&path)?.len();
            if size > MAX_HDR_SIZE {
                return Err(Error::HeaderTooLarge { size });
            }
            HeaderReader::new(Cursor::new(fs::read(&path)?)).read()?
        };

        let paths = if header.version.is_single_file() {
            vec![path.clone()]
        } else {
            std::iter::once(path.clone())
                .chain(resolve_part_paths(&path, &header))
                .collect()
        };

        tracing::info!(
            "Opened {} archive {} ({} parts, {} entries)",
            header.version,
            path.display(),
            paths.len().saturating_sub(1),
            header.entries.len()
        );

        let mut archive = Self {
            header,
            paths,
            pending: Vec::new(),
            index: HashMap::new(),
        };
        archive.rebuild_index();
        Ok(archive)
    }

    /// Create an empty archive at `hdr_path`.
    ///
    /// Multi-part versions get one empty data part next to the header.
    ///
    /// # Errors
    /// Returns [`Error::EncryptionNotSupported`] when a key is given for a
    /// single-file version.
    pub fn create<P: AsRef<Path>>(hdr_path: P, options: &ArkOptions) -> Result<Self> {
        let hdr_path = hdr_path.as_ref().to_path_buf();
        let version = options.version;

        if version.is_single_file() && options.encrypted() {
            return Err(Error::EncryptionNotSupported {
                version: version.as_i32(),
            });
        }

        if let Some(parent) = hdr_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let encryption = options
            .key
            .map(|key| HeaderEncryption::for_version(version, key));

        File::create(&hdr_path)?;

        let mut archive = Self {
            header: ArkHeader::new(version, encryption),
            paths: vec![hdr_path.clone()],
            pending: Vec::new(),
            index: HashMap::new(),
        };

        if !version.is_single_file() {
            let part = part_path(&hdr_path, 0);
            File::create(&part)?;
            archive.paths.push(part);
            archive.header.part_sizes.push(0);
        }

        archive.write_header()?;

        tracing::info!(
            "Created {} archive {}{}",
            version,
            hdr_path.display(),
            if encryption.is_some() { " (encrypted)" } else { "" }
        );

        Ok(archive)
    }

    #[must_use]
    pub fn version(&self) -> ArkVersion {
        self.header.version
    }

    /// Change the version used by the next header write.
    ///
    /// Moving between single-file and multi-part versions is refused since
    /// the file layout would no longer match.
    pub fn set_version(&mut self, version: ArkVersion) -> Result<()> {
        if version.is_single_file() != self.header.version.is_single_file() {
            return Err(Error::UnsupportedVersion {
                version: version.as_i32(),
            });
        }
        if version.is_single_file() && self.header.is_encrypted() {
            return Err(Error::EncryptionNotSupported {
                version: version.as_i32(),
            });
        }

        tracing::debug!("Changing archive version {} -> {}", self.header.version, version);
        let prefix_changes = (version < ArkVersion::V9) != (self.header.version < ArkVersion::V9);
        self.header.set_version(version);

        // Stored part names carry a `gen/` prefix only before v9
        if prefix_changes {
            for name in &mut self.header.part_names {
                let file_name = name.rsplit(['/', '\\']).next().unwrap_or_default().to_string();
                *name = stored_part_name(version, &file_name);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.header.is_encrypted()
    }

    /// Header cipher key, if the header is encrypted
    #[must_use]
    pub fn key(&self) -> Option<i32> {
        self.header.encryption.map(|e| e.key)
    }

    /// Encrypt the next header write with `key`, or write plaintext on `None`
    pub fn set_key(&mut self, key: Option<i32>) -> Result<()> {
        if key.is_some() && self.header.version.is_single_file() {
            return Err(Error::EncryptionNotSupported {
                version: self.header.version.as_i32(),
            });
        }
        self.header.encryption = key.map(|key| HeaderEncryption::for_version(self.header.version, key));
        Ok(())
    }

    /// The parsed header, including blocks that are only round-tripped
    #[must_use]
    pub fn header(&self) -> &ArkHeader {
        &self.header
    }

    /// Header file path
    #[must_use]
    pub fn header_path(&self) -> &Path {
        &self.paths[0]
    }

    /// All physical files: header first, then data parts
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of data parts (0 for single-file archives)
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.paths.len() - 1
    }

    /// Committed entries in header order
    #[must_use]
    pub fn committed(&self) -> &[OffsetEntry] {
        &self.header.entries
    }

    /// Staged entries in staging order
    #[must_use]
    pub fn pending(&self) -> &[PendingEntry] {
        &self.pending
    }

    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Find an entry by path, case-insensitively. Staged entries shadow
    /// committed ones.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<ArkEntry> {
        match self.index.get(&lookup_key(path))? {
            Slot::Committed(i) => self.header.entries.get(*i).cloned().map(ArkEntry::Offset),
            Slot::Pending(i) => self.pending.get(*i).cloned().map(ArkEntry::Pending),
        }
    }

    /// Merged directory: staged entries plus the committed entries they do
    /// not shadow, sorted by full path
    #[must_use]
    pub fn entries(&self) -> Vec<ArkEntry> {
        let committed = self
            .header
            .entries
            .iter()
            .enumerate()
            .filter(|(i, e)| self.index.get(&e.path.lookup_key()) == Some(&Slot::Committed(*i)))
            .map(|(_, e)| ArkEntry::Offset(e.clone()));

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

    /// Stage a local file for inclusion at `target_path`.
    ///
    /// Staging the same path again (case-insensitively) replaces the
    /// earlier staged file.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] for an empty target or a local path
    /// that is not a file.
    pub fn stage<P: AsRef<Path>>(&mut self, local_path: P, target_path: &str) -> Result<()> {
        let local_path = local_path.as_ref();
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

        if let Some(Slot::Pending(i)) = self.index.get(&key) {
            tracing::debug!("Replacing staged entry {}", entry.path);
            self.pending[*i] = entry;
        } else {
            tracing::debug!("Staged {} from {}", entry.path, local_path.display());
            self.index.insert(key, Slot::Pending(self.pending.len()));
            self.pending.push(entry);
        }

        Ok(())
    }

    /// Read an entry's bytes: from its data part when committed, or from
    /// the staged local file when pending
    ///
    /// # Errors
    /// Returns [`Error::PartNotFound`] or [`Error::PartFileMissing`] when the
    /// owning part is unavailable.
    pub fn read_bytes(&self, entry: &ArkEntry) -> Result<Vec<u8>> {
        match entry {
            ArkEntry::Pending(pending) => Ok(fs::read(&pending.local_path)?),
            ArkEntry::Offset(entry) => {
                let path = self
                    .paths
                    .get(entry.part)
                    .ok_or(Error::PartNotFound { index: entry.part })?;
                if !path.exists() {
                    return Err(Error::PartFileMissing { path: path.clone() });
                }

                let mut file = File::open(path)?;
                file.seek(SeekFrom::Start(entry.part_offset))?;
                let mut data = vec![0u8; entry.size as usize];
                file.read_exact(&mut data)?;
                Ok(data)
            }
        }
    }

    /// Look up `path` and read its bytes
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] if the path is not in the directory.
    pub fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .lookup(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))?;
        self.read_bytes(&entry)
    }

    /// Copy staged files into the data parts and rewrite the header.
    ///
    /// Files are placed smallest first, each into the smallest gap that
    /// fits (single-part archives only) or at the end of the last part.
    /// Data is written before the header; a failure in between leaves the
    /// two out of sync.
    ///
    /// # Errors
    /// Returns [`Error::LegacyArchiveFull`] when a single-file archive
    /// already has committed entries, and [`Error::EntryTooLarge`] for files
    /// that do not fit a 32-bit size.
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let shadowed: HashSet<String> = self.pending.iter().map(|e| e.path.lookup_key()).collect();
        let mut remaining: Vec<OffsetEntry> = self
            .header
            .entries
            .iter()
            .filter(|e| !shadowed.contains(&e.path.lookup_key()))
            .cloned()
            .collect();
        remaining.sort_by_key(|e| (e.offset, e.size));

        let mut staged: Vec<(PendingEntry, u32)> = Vec::with_capacity(self.pending.len());
        for entry in &self.pending {
            let len = fs::metadata(&entry.local_path)?.len();
            let size = u32::try_from(len).map_err(|_| Error::EntryTooLarge {
                path: entry.local_path.clone(),
                size: len,
            })?;
            staged.push((entry.clone(), size));
        }
        staged.sort_by_key(|(_, size)| *size);

        let single_file = self.header.version.is_single_file();
        if single_file {
            if !remaining.is_empty() {
                return Err(Error::LegacyArchiveFull {
                    version: self.header.version.as_i32(),
                });
            }
            self.write_legacy_placeholder()?;
        }

        let part_sizes = self.measure_part_sizes()?;
        let mut allocator = Allocator::new(&remaining, &part_sizes);
        tracing::debug!(
            "Committing {} files ({} kept entries, {} gaps)",
            staged.len(),
            remaining.len(),
            allocator.gaps().len()
        );

        for (pending, size) in staged {
            let placement = allocator.place(u64::from(size));
            let part = if single_file { 0 } else { placement.part_slot + 1 };
            let target = self
                .paths
                .get(part)
                .ok_or(Error::PartNotFound { index: part })?;

            copy_into_part(target, placement.part_offset, &pending.local_path)?;

            remaining.push(OffsetEntry {
                path: pending.path.clone(),
                offset: placement.offset,
                part,
                part_offset: placement.part_offset,
                size,
                inflated_size: if single_file {
                    inflated_size(&pending.local_path)
                } else {
                    0
                },
                flag: default_entry_flag(size),
            });
        }

        let count = self.pending.len();
        self.pending.clear();
        self.header.entries = remaining;
        self.write_header()?;
        self.rebuild_index();

        tracing::info!(
            "Committed {} files to {} ({} entries)",
            count,
            self.paths[0].display(),
            self.header.entries.len()
        );
        Ok(())
    }

    /// Append an empty data part, at `path` or next to the header.
    ///
    /// With more than one part, commits always append to the last part.
    ///
    /// # Errors
    /// Returns [`Error::SingleFileArchive`] for pre-v3 archives.
    pub fn add_part(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        if self.header.version.is_single_file() {
            return Err(Error::SingleFileArchive {
                version: self.header.version.as_i32(),
            });
        }

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => part_path(&self.paths[0], self.part_count()),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        File::create(&path)?;

        self.paths.push(path.clone());
        self.header.part_sizes.push(0);
        self.write_header()?;

        tracing::info!("Added archive part {}", path.display());
        Ok(path)
    }

    /// Copy the header and all parts into `directory` and open the copy.
    ///
    /// # Errors
    /// Returns [`Error::PendingChanges`] while entries are staged.
    pub fn copy_to_directory<P: AsRef<Path>>(&self, directory: P) -> Result<ArkArchive> {
        if self.has_pending_changes() {
            return Err(Error::PendingChanges);
        }

        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;

        for path in &self.paths {
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
            fs::copy(path, directory.join(file_name))?;
        }

        let copied = directory.join(
            self.paths[0]
                .file_name()
                .ok_or_else(|| Error::InvalidPath(self.paths[0].display().to_string()))?,
        );
        tracing::info!("Copied archive to {}", directory.display());
        ArkArchive::open(copied)
    }

    /// Rewrite the header from the current state
    pub fn write_header(&mut self) -> Result<()> {
        if self.header.version.is_single_file() {
            let bytes = HeaderWriter::new(&self.header).to_bytes()?;
            // Entry data follows the header in the same file
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.paths[0])?;
            file.write_all(&bytes)?;
            return Ok(());
        }

        self.header.part_sizes = self.measure_part_sizes()?;
        self.sync_part_blocks();

        let bytes = HeaderWriter::new(&self.header).to_bytes()?;
        fs::write(&self.paths[0], bytes)?;
        tracing::debug!("Wrote {} header to {}", self.header.version, self.paths[0].display());
        Ok(())
    }

    /// Header with zero offsets for every staged entry, written before the
    /// data of a single-file archive so the data lands after it
    fn write_legacy_placeholder(&mut self) -> Result<()> {
        self.header.entries = self
            .pending
            .iter()
            .map(|e| OffsetEntry {
                path: e.path.clone(),
                offset: 0,
                part: 0,
                part_offset: 0,
                size: 0,
                inflated_size: 0,
                flag: 0,
            })
            .collect();

        let bytes = HeaderWriter::new(&self.header).to_bytes()?;
        self.header.entries.clear();
        fs::write(&self.paths[0], bytes)?;
        Ok(())
    }

    /// Current logical sizes of the data parts (the whole file for
    /// single-file archives)
    fn measure_part_sizes(&self) -> Result<Vec<u64>> {
        if self.header.version.is_single_file() {
            return Ok(vec![fs::metadata(&self.paths[0])?.len()]);
        }

        self.paths[1..]
            .iter()
            .map(|path| probe_part_size(path, self.header.version).map(|info| info.size))
            .collect()
    }

    /// Keep part names, flags and collections in step with the part list
    fn sync_part_blocks(&mut self) {
        let version = self.header.version;
        let parts = self.part_count();

        if self.header.stores_part_names() {
            let names = self.paths[1..]
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    match self.header.part_names.get(i) {
                        Some(stored) if stored.rsplit('/').next() == Some(file_name.as_str()) => {
                            stored.clone()
                        }
                        _ => stored_part_name(version, &file_name),
                    }
                })
                .collect();
            self.header.part_names = names;
        } else {
            self.header.part_names.clear();
        }

        if version.has_part_flags() {
            let flag = self.header.fresh_part_flag();
            self.header.part_flags.resize(parts, flag);
        }

        if version >= ArkVersion::V9 && self.header.file_collections.len() < parts {
            self.header.file_collections.resize(parts, Vec::new());
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, entry) in self.header.entries.iter().enumerate() {
            self.index.insert(entry.path.lookup_key(), Slot::Committed(i));
        }
        for (i, entry) in self.pending.iter().enumerate() {
            self.index.insert(entry.path.lookup_key(), Slot::Pending(i));
        }
    }
}

/// Part file name as stored in the header (`gen/` prefixed before v9)
fn stored_part_name(version: ArkVersion, file_name: &str) -> String {
    if version < ArkVersion::V9 {
        format!("gen/{file_name}")
    } else {
        file_name.to_string()
    }
}

/// Data part paths for an opened header.
///
/// The header's own name decides (`main.hdr` -> `main_0.ark`); a stored name
/// is only used when that file exists and the synthesized one does not.
fn resolve_part_paths(hdr_path: &Path, header: &ArkHeader) -> Vec<PathBuf> {
    (0..header.part_sizes.len())
        .map(|i| {
            let synthesized = part_path(hdr_path, i);
            if synthesized.exists() {
                return synthesized;
            }
            match header.part_names.get(i).map(|name| stored_part_path(hdr_path, name)) {
                Some(stored) if stored.exists() => stored,
                _ => {
                    tracing::warn!("Archive part {} not found", synthesized.display());
                    synthesized
                }
            }
        })
        .collect()
}

/// Positioned write of a local file into a part, without truncating it
fn copy_into_part(part_path: &Path, offset: u64, local_path: &Path) -> Result<()> {
    let mut part = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(part_path)?;
    part.seek(SeekFrom::Start(offset))?;

    let mut source = File::open(local_path)?;
    io::copy(&mut source, &mut part)?;
    part.flush()?;

    tracing::debug!(
        "Wrote {} to {} at {offset}",
        local_path.display(),
        part_path.display()
    );
    Ok(())
}

/// Decompressed size of a `.gz` or `.z` file, 0 for anything else or on
/// failure
fn inflated_size(path: &Path) -> u32 {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let result = if extension.eq_ignore_ascii_case("gz") {
        gzip_inflated_size(path)
    } else if extension == "z" || extension == "Z" {
        deflate_inflated_size(path)
    } else {
        return 0;
    };

    result.unwrap_or_else(|e| {
        tracing::warn!("Could not measure inflated size of {}: {e}", path.display());
        0
    })
}

/// ISIZE field from the gzip trailer
fn gzip_inflated_size(path: &Path) -> io::Result<u32> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    file.read_exact(&mut magic)?;
    if magic != [0x1F, 0x8B] {
        return Ok(0);
    }

    file.seek(SeekFrom::End(-4))?;
    let mut size = [0u8; 4];
    file.read_exact(&mut size)?;
    Ok(u32::from_le_bytes(size))
}

/// Byte count of a raw deflate stream once inflated
fn deflate_inflated_size(path: &Path) -> io::Result<u32> {
    let mut decoder = DeflateDecoder::new(BufReader::new(File::open(path)?));
    let size = io::copy(&mut decoder, &mut io::sink())?;
    Ok(size as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, GzEncoder};

    #[test]
    fn test_inflated_size_gzip_and_deflate() {
        let dir = tempfile::tempdir().unwrap();
        let payload = vec![b'x'; 1000];

        let gz = dir.path().join("song.mid.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&payload).unwrap();
        fs::write(&gz, encoder.finish().unwrap()).unwrap();
        assert_eq!(inflated_size(&gz), 1000);

        let z = dir.path().join("song.mid.z");
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&payload).unwrap();
        fs::write(&z, encoder.finish().unwrap()).unwrap();
        assert_eq!(inflated_size(&z), 1000);

        let plain = dir.path().join("song.mid");
        fs::write(&plain, &payload).unwrap();
        assert_eq!(inflated_size(&plain), 0);

        let fake = dir.path().join("fake.gz");
        fs::write(&fake, b"not gzip at all").unwrap();
        assert_eq!(inflated_size(&fake), 0);
    }

    #[test]
    fn test_stored_part_name_prefix() {
        assert_eq!(stored_part_name(ArkVersion::V5, "main_0.ark"), "gen/main_0.ark");
        assert_eq!(stored_part_name(ArkVersion::V9, "main_0.ark"), "main_0.ark");
    }

    #[test]
    fn test_stage_replaces_pending_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();

        let mut archive =
            ArkArchive::create(dir.path().join("main.hdr"), &ArkOptions::default()).unwrap();
        archive.stage(&a, "songs/Foo.mid").unwrap();
        archive.stage(&b, "SONGS/foo.MID").unwrap();

        assert_eq!(archive.pending().len(), 1);
        assert_eq!(archive.read_entry("songs/foo.mid").unwrap(), b"second");
    }

    #[test]
    fn test_stage_rejects_bad_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive =
            ArkArchive::create(dir.path().join("main.hdr"), &ArkOptions::default()).unwrap();
        assert!(matches!(
            archive.stage(dir.path().join("missing"), "a.txt"),
            Err(Error::InvalidPath(_))
        ));

        let file = dir.path().join("x");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(archive.stage(&file, ""), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_set_version_keeps_layout_family() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive =
            ArkArchive::create(dir.path().join("main.hdr"), &ArkOptions::default()).unwrap();
        archive.set_version(ArkVersion::V5).unwrap();
        assert_eq!(archive.version(), ArkVersion::V5);
        assert!(archive.set_version(ArkVersion::V2).is_err());
    }
}
