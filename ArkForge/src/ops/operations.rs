//! Core archive operations

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use super::ProgressCallback;
use super::progress::{ArkPhase, ArkProgress};
use crate::archive::{Archive, open_archive};
use crate::ark::crypt::{crypt_in_place, decrypt_file, encrypt_file};
use crate::ark::{ArkArchive, ArkEntry, ArkVersion, EntryPath, HeaderEncryption};
use crate::config::ArkOptions;
use crate::error::{Error, Result};

/// One row of a detailed listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub path: String,
    /// `None` for staged entries
    pub size: Option<u32>,
    /// Physical part index (0 = header file)
    pub part: Option<usize>,
    /// Offset within that part
    pub offset: Option<u64>,
    pub pending: bool,
}

impl From<&ArkEntry> for EntryInfo {
    fn from(entry: &ArkEntry) -> Self {
        match entry {
            ArkEntry::Offset(e) => Self {
                path: e.path.full_path(),
                size: Some(e.size),
                part: Some(e.part),
                offset: Some(e.part_offset),
                pending: false,
            },
            ArkEntry::Pending(e) => Self {
                path: e.path.full_path(),
                size: None,
                part: None,
                offset: None,
                pending: true,
            },
        }
    }
}

/// Size and location of one data part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartSummary {
    pub path: PathBuf,
    /// Logical size recorded in the header
    pub size: u64,
    pub exists: bool,
}

/// Summary of a header-backed archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveInfo {
    pub header_path: PathBuf,
    pub version: ArkVersion,
    pub encrypted: bool,
    pub key: Option<i32>,
    pub xor: bool,
    pub broken_v4: bool,
    pub parts: Vec<PartSummary>,
    pub entry_count: usize,
    pub total_size: u64,
    pub hash_blocks: usize,
    pub file_collections: usize,
}

/// High-level archive operations.
pub struct ArkOperations;

impl ArkOperations {
    /// List entry paths of an archive (or loose directory)
    ///
    /// # Errors
    ///
    /// Returns any error from opening the archive, such as
    /// [`Error::UnsupportedVersion`] or [`Error::CorruptHeader`].
    ///
    /// [`Error::UnsupportedVersion`]: crate::Error::UnsupportedVersion
    /// [`Error::CorruptHeader`]: crate::Error::CorruptHeader
    pub fn list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        Self::list_with_progress(path, &|_| {})
    }

    /// List entry paths with progress callback
    ///
    /// # Errors
    ///
    /// Returns any error from opening the archive.
    pub fn list_with_progress<P: AsRef<Path>>(
        path: P,
        progress: ProgressCallback,
    ) -> Result<Vec<String>> {
        progress(&ArkProgress::new(ArkPhase::ReadingHeader, 1, 1));
        let archive = open_archive(path)?;
        let entries: Vec<String> = archive.entries().iter().map(ArkEntry::full_path).collect();
        progress(&ArkProgress::new(
            ArkPhase::Complete,
            entries.len(),
            entries.len(),
        ));
        Ok(entries)
    }

    /// List entries with sizes and locations
    ///
    /// # Errors
    ///
    /// Returns any error from opening the archive.
    pub fn list_detailed<P: AsRef<Path>>(path: P) -> Result<Vec<EntryInfo>> {
        let archive = open_archive(path)?;
        Ok(archive.entries().iter().map(EntryInfo::from).collect())
    }

    /// Describe the header and parts of an archive
    ///
    /// # Errors
    ///
    /// Returns any error from [`ArkArchive::open`].
    pub fn info<P: AsRef<Path>>(path: P) -> Result<ArchiveInfo> {
        let archive = ArkArchive::open(path)?;
        let header = archive.header();

        let parts = archive
            .paths()
            .iter()
            .skip(1)
            .zip(&header.part_sizes)
            .map(|(path, &size)| PartSummary {
                path: path.clone(),
                size,
                exists: path.exists(),
            })
            .collect();

        Ok(ArchiveInfo {
            header_path: archive.header_path().to_path_buf(),
            version: archive.version(),
            encrypted: archive.is_encrypted(),
            key: archive.key(),
            xor: header.encryption.is_some_and(|e| e.xor),
            broken_v4: header.broken_v4,
            parts,
            entry_count: header.entries.len(),
            total_size: header.entries.iter().map(|e| u64::from(e.size)).sum(),
            hash_blocks: header.hash_blocks.len(),
            file_collections: header.file_collections.len(),
        })
    }

    /// Read one entry without extracting
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if the path is not in the archive.
    ///
    /// [`Error::EntryNotFound`]: crate::Error::EntryNotFound
    pub fn read_file_bytes<P: AsRef<Path>>(path: P, entry_path: &str) -> Result<Vec<u8>> {
        open_archive(path)?.read_entry(entry_path)
    }

    /// Extract every entry to a directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output directory cannot be created.
    /// Returns [`Error::ExtractionPartialFailure`] if some entries fail.
    ///
    /// [`Error::Io`]: crate::Error::Io
    /// [`Error::ExtractionPartialFailure`]: crate::Error::ExtractionPartialFailure
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(path: P, output_dir: Q) -> Result<()> {
        Self::extract_with_progress(path, output_dir, &|_| {})
    }

    /// Extract every entry with progress callback
    ///
    /// Entries are copied in parallel; every read opens its own handle on
    /// the owning part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output directory cannot be created.
    /// Returns [`Error::ExtractionPartialFailure`] if some entries fail.
    ///
    /// [`Error::Io`]: crate::Error::Io
    /// [`Error::ExtractionPartialFailure`]: crate::Error::ExtractionPartialFailure
    pub fn extract_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
        path: P,
        output_dir: Q,
        progress: ProgressCallback,
    ) -> Result<()> {
        Self::extract_parallel(path, output_dir, None::<&[&str]>, None, progress)
    }

    /// Extract the named entries to a directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] for the first requested path that is
    /// not in the archive.
    /// Returns [`Error::ExtractionPartialFailure`] if some entries fail.
    ///
    /// [`Error::EntryNotFound`]: crate::Error::EntryNotFound
    /// [`Error::ExtractionPartialFailure`]: crate::Error::ExtractionPartialFailure
    pub fn extract_files<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<str>>(
        path: P,
        output_dir: Q,
        file_paths: &[S],
    ) -> Result<()> {
        Self::extract_files_with_progress(path, output_dir, file_paths, &|_| {})
    }

    /// Extract the named entries with progress callback
    ///
    /// # Errors
    ///
    /// See [`ArkOperations::extract_files`].
    pub fn extract_files_with_progress<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<str>>(
        path: P,
        output_dir: Q,
        file_paths: &[S],
        progress: ProgressCallback,
    ) -> Result<()> {
        if file_paths.is_empty() {
            return Ok(());
        }
        Self::extract_parallel(path, output_dir, Some(file_paths), None, progress)
    }

    /// Extract all entries, or only `file_paths`, on `threads` workers.
    ///
    /// `threads = None` uses rayon's global pool.
    ///
    /// # Errors
    ///
    /// See [`ArkOperations::extract_files`].
    pub fn extract_parallel<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<str>>(
        path: P,
        output_dir: Q,
        file_paths: Option<&[S]>,
        threads: Option<usize>,
        progress: ProgressCallback,
    ) -> Result<()> {
        let output_dir = output_dir.as_ref();

        progress(&ArkProgress::new(ArkPhase::ReadingHeader, 1, 1));
        let archive = open_archive(path.as_ref())?;

        let entries = match file_paths {
            None => archive.entries(),
            Some(paths) => paths
                .iter()
                .map(|p| {
                    let p = p.as_ref();
                    archive
                        .lookup(p)
                        .ok_or_else(|| Error::EntryNotFound(p.to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        fs::create_dir_all(output_dir)?;

        let run = || extract_entries(archive.as_ref(), &entries, output_dir, progress);
        match threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(io::Error::other)?
                .install(run)?,
            None => run()?,
        }

        tracing::info!(
            "Extracted {} entries from {} to {}",
            entries.len(),
            path.as_ref().display(),
            output_dir.display()
        );
        progress(&ArkProgress::new(
            ArkPhase::Complete,
            entries.len(),
            entries.len(),
        ));
        Ok(())
    }

    /// Create an archive from every file below `source_dir`
    ///
    /// # Errors
    ///
    /// Returns [`Error::WalkDirError`] if directory traversal fails, and
    /// any error from [`ArkArchive::create`] or [`ArkArchive::commit`].
    ///
    /// [`Error::WalkDirError`]: crate::Error::WalkDirError
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
        source_dir: P,
        hdr_path: Q,
        options: &ArkOptions,
    ) -> Result<ArkArchive> {
        Self::create_with_progress(source_dir, hdr_path, options, &|_| {})
    }

    /// Create an archive from a directory with progress callback
    ///
    /// # Errors
    ///
    /// See [`ArkOperations::create`].
    pub fn create_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
        source_dir: P,
        hdr_path: Q,
        options: &ArkOptions,
        progress: ProgressCallback,
    ) -> Result<ArkArchive> {
        progress(&ArkProgress::new(ArkPhase::ScanningFiles, 0, 0));
        let files = collect_files(source_dir.as_ref(), "")?;

        let mut archive = ArkArchive::create(hdr_path, options)?;
        stage_and_commit(&mut archive, &files, progress)?;
        Ok(archive)
    }

    /// Stage a file or directory into an existing archive and commit.
    ///
    /// A directory is added recursively below `target`; a file is added at
    /// `target`, or under its own name when `target` is empty. Returns the
    /// number of files added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `local` does not exist, and any
    /// error from staging or committing.
    ///
    /// [`Error::InvalidPath`]: crate::Error::InvalidPath
    pub fn add<P: AsRef<Path>, L: AsRef<Path>>(
        archive_path: P,
        local: L,
        target: &str,
    ) -> Result<usize> {
        Self::add_with_progress(archive_path, local, target, &|_| {})
    }

    /// Stage and commit with progress callback
    ///
    /// # Errors
    ///
    /// See [`ArkOperations::add`].
    pub fn add_with_progress<P: AsRef<Path>, L: AsRef<Path>>(
        archive_path: P,
        local: L,
        target: &str,
        progress: ProgressCallback,
    ) -> Result<usize> {
        let local = local.as_ref();

        progress(&ArkProgress::new(ArkPhase::ScanningFiles, 0, 0));
        let files = if local.is_dir() {
            collect_files(local, target)?
        } else if local.is_file() {
            let target = if target.is_empty() {
                local
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            } else {
                target.to_string()
            };
            vec![(local.to_path_buf(), target)]
        } else {
            return Err(Error::InvalidPath(format!(
                "no such file or directory: {}",
                local.display()
            )));
        };

        let mut archive = open_archive(archive_path)?;
        stage_and_commit(archive.as_mut(), &files, progress)?;
        Ok(files.len())
    }

    /// Decrypt an encrypted header, writing the plaintext without the key.
    ///
    /// Returns the key and whether the `0xFF` layer was used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the input is already plaintext
    /// and [`Error::UnsupportedVersion`] if no known version decrypts.
    ///
    /// [`Error::CorruptHeader`]: crate::Error::CorruptHeader
    /// [`Error::UnsupportedVersion`]: crate::Error::UnsupportedVersion
    pub fn decrypt_header<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
    ) -> Result<HeaderEncryption> {
        let mut prefix = [0u8; 8];
        File::open(input.as_ref())?.read_exact(&mut prefix)?;

        let key = LittleEndian::read_i32(&prefix[..4]);
        if ArkVersion::from_raw(key).is_some() {
            return Err(Error::CorruptHeader("header is not encrypted".to_string()));
        }

        for xor in [0x00u8, 0xFF] {
            let mut version = [0u8; 4];
            version.copy_from_slice(&prefix[4..]);
            crypt_in_place(&mut version, key, xor);

            if ArkVersion::from_raw(LittleEndian::read_i32(&version)).is_some() {
                decrypt_file(input, output, xor)?;
                return Ok(HeaderEncryption { key, xor: xor != 0 });
            }
        }

        Err(Error::UnsupportedVersion { version: key })
    }

    /// Encrypt a plaintext header with `key`.
    ///
    /// The `0xFF` layer is applied when the header's version requires it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] if the input does not start
    /// with a known version and [`Error::EncryptionNotSupported`] for
    /// single-file versions.
    ///
    /// [`Error::UnsupportedVersion`]: crate::Error::UnsupportedVersion
    /// [`Error::EncryptionNotSupported`]: crate::Error::EncryptionNotSupported
    pub fn encrypt_header<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        key: i32,
    ) -> Result<HeaderEncryption> {
        let mut raw = [0u8; 4];
        File::open(input.as_ref())?.read_exact(&mut raw)?;

        let raw = LittleEndian::read_i32(&raw);
        let version =
            ArkVersion::from_raw(raw).ok_or(Error::UnsupportedVersion { version: raw })?;
        if version.is_single_file() {
            return Err(Error::EncryptionNotSupported {
                version: version.as_i32(),
            });
        }

        let encryption = HeaderEncryption::for_version(version, key);
        encrypt_file(input, output, key, encryption.xor_byte())?;
        Ok(encryption)
    }
}

/// Stage `files` (local path, entry path) and commit
fn stage_and_commit<A: Archive + ?Sized>(
    archive: &mut A,
    files: &[(PathBuf, String)],
    progress: ProgressCallback,
) -> Result<()> {
    let total = files.len();
    for (i, (local, target)) in files.iter().enumerate() {
        progress(&ArkProgress::with_file(
            ArkPhase::StagingFiles,
            i + 1,
            total,
            target.as_str(),
        ));
        archive.stage(local, target)?;
    }

    progress(&ArkProgress::new(ArkPhase::Committing, total, total));
    archive.commit()?;
    progress(&ArkProgress::new(ArkPhase::Complete, total, total));
    Ok(())
}

/// Regular files below `root` paired with their entry paths under `prefix`
fn collect_files(root: &Path, prefix: &str) -> Result<Vec<(PathBuf, String)>> {
    let prefix = prefix.trim_matches(|c| c == '/' || c == '\\');
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() == ".DS_Store" {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;
        let relative = relative.to_string_lossy().replace('\\', "/");

        let target = if prefix.is_empty() {
            relative
        } else {
            format!("{prefix}/{relative}")
        };
        files.push((entry.path().to_path_buf(), target));
    }

    tracing::debug!("Found {} files below {}", files.len(), root.display());
    Ok(files)
}

/// Destination of `path` below `output_dir`, refusing parent components
fn output_path(output_dir: &Path, path: &EntryPath) -> Option<PathBuf> {
    let escapes = path
        .directory()
        .split('/')
        .chain(std::iter::once(path.file_name()))
        .any(|c| c == "..");
    (!escapes).then(|| path.to_local_path(output_dir))
}

fn extract_entries(
    archive: &dyn Archive,
    entries: &[ArkEntry],
    output_dir: &Path,
    progress: ProgressCallback,
) -> Result<()> {
    let total = entries.len();
    let processed = AtomicUsize::new(0);

    let errors: Vec<(String, String)> = entries
        .par_iter()
        .filter_map(|entry| {
            let name = entry.full_path();
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&ArkProgress::with_file(
                ArkPhase::ExtractingFiles,
                current,
                total,
                name.as_str(),
            ));

            let Some(target) = output_path(output_dir, entry.path()) else {
                return Some((name, "path escapes the output directory".to_string()));
            };

            let result = archive.read_bytes(entry).and_then(|data| {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, data)?;
                Ok(())
            });

            match result {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("Failed to extract {name}: {e}");
                    Some((name, e.to_string()))
                }
            }
        })
        .collect();

    if let Some((path, error)) = errors.first() {
        return Err(Error::ExtractionPartialFailure {
            total,
            failed: errors.len(),
            first_error: format!("{path}: {error}"),
        });
    }
    Ok(())
}
