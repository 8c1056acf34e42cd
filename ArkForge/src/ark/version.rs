//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! ARK schema versions and their per-version layout switches

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Header schema revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ArkVersion {
    /// Single-file archives (header and data share one file)
    V2 = 2,
    V3 = 3,
    /// 64-bit part sizes (or 32-bit for the "broken" hybrid)
    V4 = 4,
    V5 = 5,
    V6 = 6,
    V7 = 7,
    V8 = 8,
    #[default]
    V9 = 9,
    V10 = 10,
}

impl ArkVersion {
    /// All supported versions, oldest first
    pub const ALL: [ArkVersion; 9] = [
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V7,
        Self::V8,
        Self::V9,
        Self::V10,
    ];

    /// Map a raw header value to a known version
    #[must_use]
    pub fn from_raw(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| *v as i32 == value)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Header and data live in the same file and the archive cannot grow
    /// once entries are committed
    #[must_use]
    pub const fn is_single_file(self) -> bool {
        (self as i32) < 3
    }

    /// A hash/timestamp block follows the version field
    #[must_use]
    pub const fn has_hash_block(self) -> bool {
        (self as i32) >= 6
    }

    /// Part count and part sizes are stored in the header
    #[must_use]
    pub const fn has_part_sizes(self) -> bool {
        (self as i32) >= 3
    }

    /// Data-part file names are stored in the header (broken v4 also has them)
    #[must_use]
    pub const fn has_part_names(self) -> bool {
        (self as i32) >= 5
    }

    /// A 32-bit flag per part follows the part names
    #[must_use]
    pub const fn has_part_flags(self) -> bool {
        matches!(self, Self::V6 | Self::V7 | Self::V8 | Self::V9)
    }

    /// A block of file-collection string lists precedes the directory
    #[must_use]
    pub const fn has_file_collections(self) -> bool {
        (self as i32) >= 7
    }

    /// Directory uses the per-entry hash-chain scheme instead of the
    /// string blob + open-addressed table
    #[must_use]
    pub const fn uses_hash_chain(self) -> bool {
        (self as i32) >= 8
    }

    /// Chained entries carry an extra 32-bit flag
    #[must_use]
    pub const fn has_entry_flag(self) -> bool {
        matches!(self, Self::V8 | Self::V9)
    }

    /// Whole-stream 0xFF XOR is applied on top of the keystream when encrypted
    #[must_use]
    pub const fn uses_xor(self) -> bool {
        (self as i32) >= 10
    }

    /// Data parts may carry an encrypted-data trailer
    #[must_use]
    pub const fn has_part_trailer(self) -> bool {
        (self as i32) >= 10
    }
}

impl TryFrom<i32> for ArkVersion {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or(Error::UnsupportedVersion { version: value })
    }
}

impl From<ArkVersion> for i32 {
    fn from(version: ArkVersion) -> Self {
        version as i32
    }
}

impl fmt::Display for ArkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", *self as i32)
    }
}
