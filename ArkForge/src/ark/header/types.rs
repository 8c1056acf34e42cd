//! Types for ARK header handling
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

use super::FRESH_HASH_BLOCK;
use crate::ark::entry::OffsetEntry;
use crate::ark::version::ArkVersion;

/// Cipher settings of an encrypted header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEncryption {
    /// Keystream seed, stored in the first four bytes of the header
    pub key: i32,
    /// Whole-stream `0xFF` XOR on top of the keystream (v10+ only)
    pub xor: bool,
}

impl HeaderEncryption {
    /// Encryption for `version` with `key`; the XOR layer follows the version
    #[must_use]
    pub fn for_version(version: ArkVersion, key: i32) -> Self {
        Self {
            key,
            xor: version.uses_xor(),
        }
    }

    /// The constant XOR byte applied to every encrypted byte
    #[must_use]
    pub fn xor_byte(&self) -> u8 {
        if self.xor { 0xFF } else { 0x00 }
    }
}

/// Parsed contents of an ARK header.
///
/// Blocks that carry no meaning for entry access (hash block, part flags,
/// file collections) are kept as read so they survive a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArkHeader {
    pub version: ArkVersion,
    pub encryption: Option<HeaderEncryption>,
    /// v4 header with 32-bit part sizes and stored part names
    pub broken_v4: bool,
    /// 16-byte hash/timestamp blocks (v6+)
    pub hash_blocks: Vec<[u8; 16]>,
    /// Logical data part sizes (v3+)
    pub part_sizes: Vec<u64>,
    /// Part file names as stored in the header (v5+ and broken v4)
    pub part_names: Vec<String>,
    /// Per-part flags (v6-v9)
    pub part_flags: Vec<i32>,
    /// File-collection string lists (v7+)
    pub file_collections: Vec<Vec<String>>,
    /// Committed entries in on-disk order
    pub entries: Vec<OffsetEntry>,
}

impl ArkHeader {
    /// Empty header for a freshly created archive
    #[must_use]
    pub fn new(version: ArkVersion, encryption: Option<HeaderEncryption>) -> Self {
        Self {
            version,
            encryption,
            broken_v4: false,
            hash_blocks: if version.has_hash_block() {
                vec![FRESH_HASH_BLOCK]
            } else {
                Vec::new()
            },
            part_sizes: Vec::new(),
            part_names: Vec::new(),
            part_flags: Vec::new(),
            file_collections: Vec::new(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    /// Classic entries store 64-bit offsets (v4 through v7, unless broken v4)
    #[must_use]
    pub fn uses_wide_offsets(&self) -> bool {
        !self.broken_v4 && (4..=7).contains(&self.version.as_i32())
    }

    /// Part sizes are 64-bit on disk (v4 unless broken)
    #[must_use]
    pub fn uses_wide_part_sizes(&self) -> bool {
        self.version == ArkVersion::V4 && !self.broken_v4
    }

    /// Part names are present on disk
    #[must_use]
    pub fn stores_part_names(&self) -> bool {
        self.version.has_part_names() || (self.version == ArkVersion::V4 && self.broken_v4)
    }

    /// Part flag value written for parts without a stored flag
    #[must_use]
    pub fn fresh_part_flag(&self) -> i32 {
        if self.version < ArkVersion::V9 { -1 } else { 0 }
    }

    /// Adjust the version-dependent blocks after a version change so the
    /// next write produces a self-consistent header
    pub fn set_version(&mut self, version: ArkVersion) {
        if version == self.version {
            return;
        }
        self.version = version;
        self.broken_v4 = false;

        if version.has_hash_block() && self.hash_blocks.is_empty() {
            self.hash_blocks.push(FRESH_HASH_BLOCK);
        }
        if !version.has_part_flags() {
            self.part_flags.clear();
        } else {
            let flag = self.fresh_part_flag();
            self.part_flags.iter_mut().for_each(|f| *f = flag);
        }
        if let Some(encryption) = self.encryption.as_mut() {
            encryption.xor = version.uses_xor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_header_blocks() {
        let v9 = ArkHeader::new(ArkVersion::V9, None);
        assert_eq!(v9.hash_blocks, vec![FRESH_HASH_BLOCK]);
        assert_eq!(v9.fresh_part_flag(), 0);

        let v5 = ArkHeader::new(ArkVersion::V5, None);
        assert!(v5.hash_blocks.is_empty());
        assert!(v5.uses_wide_offsets());
    }

    #[test]
    fn test_offset_width() {
        let mut header = ArkHeader::new(ArkVersion::V4, None);
        assert!(header.uses_wide_offsets());
        assert!(header.uses_wide_part_sizes());
        assert!(!header.stores_part_names());

        header.broken_v4 = true;
        assert!(!header.uses_wide_offsets());
        assert!(!header.uses_wide_part_sizes());
        assert!(header.stores_part_names());

        assert!(!ArkHeader::new(ArkVersion::V3, None).uses_wide_offsets());
        assert!(!ArkHeader::new(ArkVersion::V8, None).uses_wide_offsets());
    }

    #[test]
    fn test_encryption_xor_follows_version() {
        assert!(!HeaderEncryption::for_version(ArkVersion::V9, 1).xor);
        assert_eq!(HeaderEncryption::for_version(ArkVersion::V10, 1).xor_byte(), 0xFF);
    }
}
