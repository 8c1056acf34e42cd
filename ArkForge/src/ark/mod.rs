//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! ARK archive format reader/writer
//!
//! Covers every header revision from the single-file v2 layout to the
//! multi-part, optionally encrypted v10 layout, with incremental commits
//! that reuse free space between existing entries.

pub mod allocator;
mod archive;
pub mod crypt;
pub mod entry;
pub mod hash;
pub mod header;
pub mod parts;
mod version;

pub use archive::ArkArchive;
pub use crypt::{DEFAULT_KEY, decrypt_file, encrypt_file};
pub use entry::{ArkEntry, EntryPath, OffsetEntry, PendingEntry};
pub use header::{ArkHeader, HeaderEncryption, MAX_HDR_SIZE};
pub use parts::PART_TRAILER;
pub use version::ArkVersion;
