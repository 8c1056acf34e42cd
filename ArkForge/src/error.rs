//! Error types for `ArkForge`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `ArkForge` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Header Errors ====================
    /// The version field did not resolve to a known schema, neither in
    /// plaintext nor after decryption (with and without the 0xFF layer).
    #[error("unsupported ARK version: 0x{version:08X}")]
    UnsupportedVersion {
        /// The raw version value that was read (or requested).
        version: i32,
    },

    /// The header is structurally inconsistent.
    #[error("corrupt ARK header: {0}")]
    CorruptHeader(String),

    /// The header file exceeds the size limit for in-memory parsing.
    #[error("HDR file is too large: {size} bytes (limit is 20MB)")]
    HeaderTooLarge {
        /// The size of the header file in bytes.
        size: u64,
    },

    /// Header encryption was requested for a single-file archive.
    #[error("ARK version {version} is single-file and cannot be encrypted")]
    EncryptionNotSupported {
        /// The archive version.
        version: i32,
    },

    // ==================== Archive Errors ====================
    /// Pre-v3 archives cannot grow once any entry is committed.
    #[error("can't add more files to an existing ark for version {version}")]
    LegacyArchiveFull {
        /// The archive version.
        version: i32,
    },

    /// Single-file archives have no separate data parts.
    #[error("ARK version {version} is single-file and has no data parts")]
    SingleFileArchive {
        /// The archive version.
        version: i32,
    },

    /// The requested entry does not exist in the archive directory.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// A staged file does not fit in the 32-bit entry size field.
    #[error("file too large for an ARK entry: {path} ({size} bytes)")]
    EntryTooLarge {
        /// The local file path.
        path: PathBuf,
        /// The file size in bytes.
        size: u64,
    },

    /// The archive has staged entries that must be committed first.
    #[error("archive has pending changes; commit them first")]
    PendingChanges,

    /// An entry references a part the archive does not have.
    #[error("archive part {index} not found")]
    PartNotFound {
        /// The part index (0 = header file, 1+ = data parts).
        index: usize,
    },

    /// A data part file does not exist on disk.
    #[error("archive part file not found: {path}")]
    PartFileMissing {
        /// The expected path to the part.
        path: PathBuf,
    },

    /// Extraction completed but some entries failed.
    #[error("extraction failed for {failed} of {total} entries: {first_error}")]
    ExtractionPartialFailure {
        /// Number of entries attempted.
        total: usize,
        /// Number of failed entries.
        failed: usize,
        /// The first error message encountered.
        first_error: String,
    },

    // ==================== File System Errors ====================
    /// Invalid file or entry path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),

    // ==================== Configuration Errors ====================
    /// Configuration could not be read or written.
    #[error("config error: {0}")]
    Config(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// A specialized Result type for `ArkForge` operations.
pub type Result<T> = std::result::Result<T, Error>;
