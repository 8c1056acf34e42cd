//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! ARK header reader with version detection and transparent decryption

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{ArkHeader, HeaderEncryption};
use crate::ark::crypt::CipherReader;
use crate::ark::entry::{EntryPath, OffsetEntry, default_entry_flag};
use crate::ark::hash::{StringLookup, decode_lossy};
use crate::ark::parts::locate_part;
use crate::ark::version::ArkVersion;
use crate::error::{Error, Result};

/// Upper bound for up-front allocations driven by header counts
const PREALLOC_LIMIT: usize = 4096;

/// Raw classic entry before its string slots are resolved
struct ClassicEntry {
    offset: u64,
    file_slot: i32,
    dir_slot: i32,
    size: u32,
    inflated_size: u32,
}

/// ARK header reader
pub struct HeaderReader<R: Read + Seek> {
    reader: R,
}

impl<R: Read + Seek> HeaderReader<R> {
    /// Create a reader positioned at the start of a header
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Detect the version and encryption, then parse the whole header.
    ///
    /// The first field is either a known version (plaintext header) or a
    /// cipher key. Encrypted headers are retried with the `0xFF` XOR layer
    /// when the keystream alone does not yield a known version.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedVersion`] if no known version can be
    /// resolved, or [`Error::CorruptHeader`] for inconsistent contents.
    pub fn read(mut self) -> Result<ArkHeader> {
        let first = self.reader.read_i32::<LittleEndian>()?;

        if let Some(version) = ArkVersion::from_raw(first) {
            tracing::debug!("Detected plaintext ARK header {version}");
            return parse_body(&mut self.reader, version, None);
        }

        let key = first;
        let body_start = self.reader.stream_position()?;

        for xor in [0x00u8, 0xFF] {
            self.reader.seek(SeekFrom::Start(body_start))?;
            let mut decrypted = CipherReader::new(&mut self.reader, key, xor)?;
            let raw = decrypted.read_i32::<LittleEndian>()?;

            let Some(version) = ArkVersion::from_raw(raw) else {
                continue;
            };

            if version.is_single_file() {
                return Err(Error::EncryptionNotSupported {
                    version: version.as_i32(),
                });
            }

            tracing::debug!(
                "Detected encrypted ARK header {version} (key 0x{key:08X}, xor {})",
                xor != 0
            );
            let encryption = HeaderEncryption {
                key,
                xor: xor != 0,
            };
            return parse_body(&mut decrypted, version, Some(encryption));
        }

        Err(Error::UnsupportedVersion { version: first })
    }
}

/// Parse everything after the version field
fn parse_body<R: Read + Seek>(
    reader: &mut R,
    version: ArkVersion,
    encryption: Option<HeaderEncryption>,
) -> Result<ArkHeader> {
    let mut header = ArkHeader::new(version, encryption);
    header.hash_blocks.clear();

    if version.is_single_file() {
        header.entries = read_legacy_directory(reader)?;
        tracing::debug!("Read {} entries from single-file archive", header.entries.len());
        return Ok(header);
    }

    if version.has_hash_block() {
        let count = read_count(reader, "hash block")?;
        header.hash_blocks.reserve(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let mut block = [0u8; 16];
            reader.read_exact(&mut block)?;
            header.hash_blocks.push(block);
        }
    }

    read_part_sizes(reader, &mut header)?;

    if header.stores_part_names() {
        let count = read_count(reader, "part name")?;
        header.part_names.reserve(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            header.part_names.push(read_string(reader)?);
        }
    }

    if version.has_part_flags() {
        let count = read_count(reader, "part flag")?;
        header.part_flags.reserve(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            header.part_flags.push(reader.read_i32::<LittleEndian>()?);
        }
    }

    if version.has_file_collections() {
        let count = read_count(reader, "file collection")?;
        header.file_collections.reserve(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let files = read_count(reader, "file collection entry")?;
            let mut collection = Vec::with_capacity(files.min(PREALLOC_LIMIT));
            for _ in 0..files {
                collection.push(read_string(reader)?);
            }
            header.file_collections.push(collection);
        }
    }

    header.entries = if version.uses_hash_chain() {
        read_chained_directory(reader, &header)?
    } else {
        read_classic_directory(reader, &header)?
    };

    tracing::debug!(
        "Read {} header: {} parts, {} entries",
        version,
        header.part_sizes.len(),
        header.entries.len()
    );

    Ok(header)
}

/// Part count (twice) followed by part sizes, with broken-v4 detection
fn read_part_sizes<R: Read + Seek>(reader: &mut R, header: &mut ArkHeader) -> Result<()> {
    let part_count = read_count(reader, "part")?;
    let size_count = read_count(reader, "part size")?;

    if part_count != size_count {
        tracing::warn!("Header declares {part_count} parts but {size_count} part sizes");
    }

    let sizes_start = reader.stream_position()?;
    let mut sizes = Vec::with_capacity(size_count.min(PREALLOC_LIMIT));

    if header.version == ArkVersion::V4 {
        for _ in 0..size_count {
            sizes.push(reader.read_u64::<LittleEndian>()?);
        }

        // A v4 header whose last 64-bit size is out of 32-bit range is really
        // laid out like v3 with stored part names
        if sizes.last().is_some_and(|last| *last > u64::from(u32::MAX)) {
            tracing::debug!("Detected broken v4 header");
            header.broken_v4 = true;
            reader.seek(SeekFrom::Start(sizes_start))?;
            sizes.clear();
            for _ in 0..size_count {
                sizes.push(u64::from(reader.read_u32::<LittleEndian>()?));
            }
        }
    } else {
        for _ in 0..size_count {
            sizes.push(u64::from(reader.read_u32::<LittleEndian>()?));
        }
    }

    header.part_sizes = sizes;
    Ok(())
}

/// String blob followed by its slot table
fn read_string_lookup<R: Read>(reader: &mut R) -> Result<StringLookup> {
    let blob_size = reader.read_u32::<LittleEndian>()? as usize;
    let mut blob = Vec::with_capacity(blob_size.min(PREALLOC_LIMIT * 16));
    reader.by_ref().take(blob_size as u64).read_to_end(&mut blob)?;
    if blob.len() != blob_size {
        return Err(Error::CorruptHeader(format!(
            "string blob truncated ({} of {blob_size} bytes)",
            blob.len()
        )));
    }

    let slots = read_count(reader, "string table")?;
    let mut table = Vec::with_capacity(slots.min(PREALLOC_LIMIT));
    for _ in 0..slots {
        table.push(reader.read_i32::<LittleEndian>()?);
    }

    Ok(StringLookup::new(blob, table))
}

fn read_classic_entries<R: Read>(
    reader: &mut R,
    wide_offsets: bool,
) -> Result<Vec<ClassicEntry>> {
    let count = read_count(reader, "entry")?;
    let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));

    for _ in 0..count {
        let offset = if wide_offsets {
            reader.read_u64::<LittleEndian>()?
        } else {
            u64::from(reader.read_u32::<LittleEndian>()?)
        };

        entries.push(ClassicEntry {
            offset,
            file_slot: reader.read_i32::<LittleEndian>()?,
            dir_slot: reader.read_i32::<LittleEndian>()?,
            size: reader.read_u32::<LittleEndian>()?,
            inflated_size: reader.read_u32::<LittleEndian>()?,
        });
    }

    Ok(entries)
}

fn resolve_classic_entries(
    raw: Vec<ClassicEntry>,
    strings: &StringLookup,
    part_sizes: Option<&[u64]>,
) -> Result<Vec<OffsetEntry>> {
    raw.into_iter()
        .map(|entry| {
            let path = EntryPath::new(
                strings.resolve(entry.file_slot)?,
                strings.resolve(entry.dir_slot)?,
            );

            // Single-file archives address their own file directly
            let (part, part_offset) = match part_sizes {
                Some(sizes) => {
                    let (slot, local) = locate_part(entry.offset, sizes);
                    (slot + 1, local)
                }
                None => (0, entry.offset),
            };

            Ok(OffsetEntry {
                path,
                offset: entry.offset,
                part,
                part_offset,
                size: entry.size,
                inflated_size: entry.inflated_size,
                flag: 0,
            })
        })
        .collect()
}

/// Pre-v3 directory: entries first, then the string blob and slot table
fn read_legacy_directory<R: Read>(reader: &mut R) -> Result<Vec<OffsetEntry>> {
    let raw = read_classic_entries(reader, false)?;
    let strings = read_string_lookup(reader)?;
    resolve_classic_entries(raw, &strings, None)
}

/// v3-v7 directory: string blob and slot table, then entries
fn read_classic_directory<R: Read>(reader: &mut R, header: &ArkHeader) -> Result<Vec<OffsetEntry>> {
    let strings = read_string_lookup(reader)?;
    let raw = read_classic_entries(reader, header.uses_wide_offsets())?;
    resolve_classic_entries(raw, &strings, Some(&header.part_sizes))
}

/// v8+ directory: self-describing entries linked into hash chains
fn read_chained_directory<R: Read>(reader: &mut R, header: &ArkHeader) -> Result<Vec<OffsetEntry>> {
    let count = read_count(reader, "entry")?;
    let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));

    for index in 0..count {
        let offset = reader.read_i64::<LittleEndian>()?;
        let full_path = read_string(reader)?;
        let previous = reader.read_i32::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let flag = if header.version.has_entry_flag() {
            reader.read_i32::<LittleEndian>()?
        } else {
            0
        };

        if previous >= 0 && previous as usize >= index {
            tracing::warn!("Entry {index} ({full_path}) links forward to entry {previous}");
        }

        let offset = u64::try_from(offset).map_err(|_| {
            Error::CorruptHeader(format!("negative offset {offset} for {full_path}"))
        })?;
        let (slot, part_offset) = locate_part(offset, &header.part_sizes);

        entries.push(OffsetEntry {
            path: EntryPath::parse(&full_path),
            offset,
            part: slot + 1,
            part_offset,
            size,
            inflated_size: 0,
            flag: if header.version.has_entry_flag() {
                flag
            } else {
                default_entry_flag(size)
            },
        });
    }

    // Trailing bucket table is rebuilt on write
    let buckets = read_count(reader, "hash bucket")?;
    for _ in 0..buckets {
        reader.read_i32::<LittleEndian>()?;
    }

    Ok(entries)
}

/// Read a non-negative 32-bit count
fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let count = reader.read_i32::<LittleEndian>()?;
    usize::try_from(count)
        .map_err(|_| Error::CorruptHeader(format!("negative {what} count {count}")))
}

/// 32-bit length-prefixed UTF-8 string
fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_count(reader, "string length")?;
    let mut bytes = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(Error::CorruptHeader(format!(
            "string truncated ({} of {len} bytes)",
            bytes.len()
        )));
    }

    Ok(decode_lossy(bytes))
}
