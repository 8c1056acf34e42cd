//! # ArkForge
//!
//! A pure-Rust library for reading, staging and incrementally committing
//! ARK/HDR archives, the versioned multi-part asset archives used by
//! Harmonix titles.
//!
//! ## Supported Versions
//!
//! - **v2** - single-file archive with the directory at the front
//! - **v3 - v7** - header plus numbered data parts, hashed string table
//! - **v8 - v10** - chained directory, optional encrypted header (`0xFF`
//!   layer on v10)
//!
//! ## Quick Start
//!
//! ### Reading an Archive
//!
//! ```no_run
//! use arkforge::ark::ArkArchive;
//!
//! let archive = ArkArchive::open("gen/main.hdr")?;
//! for entry in archive.entries() {
//!     println!("{}", entry.full_path());
//! }
//! let data = archive.read_entry("config/gen/rb.dtb")?;
//! # Ok::<(), arkforge::Error>(())
//! ```
//!
//! ### Adding Files
//!
//! ```no_run
//! use arkforge::ark::ArkArchive;
//!
//! let mut archive = ArkArchive::open("gen/main.hdr")?;
//! archive.stage("local/song.mid", "songs/foo/foo.mid")?;
//! archive.commit()?;
//! # Ok::<(), arkforge::Error>(())
//! ```
//!
//! ### One-shot Operations
//!
//! ```no_run
//! use arkforge::ops::ArkOperations;
//!
//! let files = ArkOperations::list("gen/main.hdr")?;
//! println!("Found {} files", files.len());
//! ArkOperations::extract("gen/main.hdr", "output/")?;
//! # Ok::<(), arkforge::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `arkforge` command-line binary

pub mod archive;
pub mod ark;
pub mod config;
pub mod error;
pub mod loose;
pub mod ops;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::archive::{Archive, open_archive};
    pub use crate::ark::{
        ArkArchive, ArkEntry, ArkHeader, ArkVersion, DEFAULT_KEY, EntryPath, OffsetEntry,
        PendingEntry,
    };
    pub use crate::config::{ArkConfig, ArkOptions};
    pub use crate::error::{Error, Result};
    pub use crate::loose::LooseArchive;
    pub use crate::ops::{ArkOperations, ArkPhase, ArkProgress};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
