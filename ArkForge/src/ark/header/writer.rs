//! ARK header writer
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! The header is serialized into memory first and encrypted in one pass
//! before it reaches the file.

use std::collections::BTreeMap;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::ArkHeader;
use crate::ark::crypt::crypt_in_place;
use crate::ark::entry::OffsetEntry;
use crate::ark::hash::{StringTable, calc_hash, classic_table_size};
use crate::ark::version::ArkVersion;
use crate::error::{Error, Result};

/// ARK header writer
pub struct HeaderWriter<'a> {
    header: &'a ArkHeader,
}

impl<'a> HeaderWriter<'a> {
    #[must_use]
    pub fn new(header: &'a ArkHeader) -> Self {
        Self { header }
    }

    /// Serialize the header, encrypting it when the header has a key.
    ///
    /// # Errors
    /// Returns [`Error::EncryptionNotSupported`] for encrypted single-file
    /// archives, or [`Error::CorruptHeader`] when a field does not fit its
    /// on-disk width.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = self.header;
        let mut body = Vec::new();

        body.write_i32::<LittleEndian>(header.version.as_i32())?;

        if header.version.is_single_file() {
            if header.is_encrypted() {
                return Err(Error::EncryptionNotSupported {
                    version: header.version.as_i32(),
                });
            }
            write_legacy_directory(&mut body, &header.entries)?;
            return Ok(body);
        }

        if header.version.has_hash_block() {
            write_count(&mut body, header.hash_blocks.len())?;
            for block in &header.hash_blocks {
                body.write_all(block)?;
            }
        }

        self.write_part_sizes(&mut body)?;

        if header.stores_part_names() {
            write_count(&mut body, header.part_names.len())?;
            for name in &header.part_names {
                write_string(&mut body, name)?;
            }
        }

        if header.version.has_part_flags() {
            write_count(&mut body, header.part_sizes.len())?;
            for index in 0..header.part_sizes.len() {
                let flag = header
                    .part_flags
                    .get(index)
                    .copied()
                    .unwrap_or_else(|| header.fresh_part_flag());
                body.write_i32::<LittleEndian>(flag)?;
            }
        }

        if header.version.has_file_collections() {
            write_count(&mut body, header.file_collections.len())?;
            for collection in &header.file_collections {
                write_count(&mut body, collection.len())?;
                for file in collection {
                    write_string(&mut body, file)?;
                }
            }
        }

        if header.version.uses_hash_chain() {
            write_chained_directory(&mut body, header.version, &header.entries)?;
        } else {
            write_classic_directory(&mut body, header.uses_wide_offsets(), &header.entries)?;
        }

        let Some(encryption) = header.encryption else {
            return Ok(body);
        };

        crypt_in_place(&mut body, encryption.key, encryption.xor_byte());

        let mut out = Vec::with_capacity(body.len() + 4);
        out.write_i32::<LittleEndian>(encryption.key)?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn write_part_sizes(&self, body: &mut Vec<u8>) -> Result<()> {
        let header = self.header;
        write_count(body, header.part_sizes.len())?;
        write_count(body, header.part_sizes.len())?;

        for size in &header.part_sizes {
            if header.uses_wide_part_sizes() {
                body.write_u64::<LittleEndian>(*size)?;
            } else {
                let size = u32::try_from(*size).map_err(|_| {
                    Error::CorruptHeader(format!(
                        "part size {size} does not fit a {} header",
                        header.version
                    ))
                })?;
                body.write_u32::<LittleEndian>(size)?;
            }
        }

        Ok(())
    }
}

/// Strings of the classic directory in first-seen order, and the entry
/// records sorted by their slots
struct ClassicLayout<'e> {
    table: StringTable,
    entries: Vec<(&'e OffsetEntry, u32, u32)>,
}

/// Build the blob and slot table with entries taken in offset order
fn classic_layout(entries: &[OffsetEntry], sort_by_slot: bool) -> ClassicLayout<'_> {
    let mut ordered: Vec<&OffsetEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.offset);

    let strings = ordered
        .iter()
        .flat_map(|e| [e.path.directory(), e.path.file_name()]);
    let table = StringTable::build(strings, classic_table_size(entries.len()));

    let slot = |value: &str| table.slot(value).unwrap_or(0) as u32;
    let mut records: Vec<(&OffsetEntry, u32, u32)> = ordered
        .into_iter()
        .map(|e| (e, slot(e.path.file_name()), slot(e.path.directory())))
        .collect();

    if sort_by_slot {
        records.sort_by_key(|(_, file, dir)| (*dir, *file));
    }

    ClassicLayout {
        table,
        entries: records,
    }
}

fn write_string_table(body: &mut Vec<u8>, table: &StringTable) -> Result<()> {
    body.write_u32::<LittleEndian>(table.blob().len() as u32)?;
    body.write_all(table.blob())?;
    write_count(body, table.table().len())?;
    for offset in table.table() {
        body.write_u32::<LittleEndian>(*offset)?;
    }
    Ok(())
}

fn write_classic_entries(
    body: &mut Vec<u8>,
    records: &[(&OffsetEntry, u32, u32)],
    wide_offsets: bool,
) -> Result<()> {
    write_count(body, records.len())?;

    for (entry, file_slot, dir_slot) in records {
        if wide_offsets {
            body.write_u64::<LittleEndian>(entry.offset)?;
        } else {
            let offset = u32::try_from(entry.offset).map_err(|_| {
                Error::CorruptHeader(format!(
                    "offset {} of {} needs a 64-bit header",
                    entry.offset, entry.path
                ))
            })?;
            body.write_u32::<LittleEndian>(offset)?;
        }
        body.write_u32::<LittleEndian>(*file_slot)?;
        body.write_u32::<LittleEndian>(*dir_slot)?;
        body.write_u32::<LittleEndian>(entry.size)?;
        body.write_u32::<LittleEndian>(entry.inflated_size)?;
    }

    Ok(())
}

fn write_legacy_directory(body: &mut Vec<u8>, entries: &[OffsetEntry]) -> Result<()> {
    let layout = classic_layout(entries, false);
    write_classic_entries(body, &layout.entries, false)?;
    write_string_table(body, &layout.table)
}

fn write_classic_directory(
    body: &mut Vec<u8>,
    wide_offsets: bool,
    entries: &[OffsetEntry],
) -> Result<()> {
    let layout = classic_layout(entries, true);
    write_string_table(body, &layout.table)?;
    write_classic_entries(body, &layout.entries, wide_offsets)
}

/// Hash bucket of `path` for the chained directory of `version`
#[must_use]
pub fn chain_hash(version: ArkVersion, path: &str, entry_count: usize) -> usize {
    if version == ArkVersion::V9 {
        calc_hash(path, entry_count)
    } else {
        0
    }
}

fn write_chained_directory(
    body: &mut Vec<u8>,
    version: ArkVersion,
    entries: &[OffsetEntry],
) -> Result<()> {
    let count = entries.len();

    let mut buckets: BTreeMap<usize, Vec<(String, &OffsetEntry)>> = BTreeMap::new();
    for entry in entries {
        let path = entry.path.full_path();
        buckets
            .entry(chain_hash(version, &path, count))
            .or_default()
            .push((path, entry));
    }

    write_count(body, count)?;

    let mut last_in_bucket = BTreeMap::new();
    let mut index: i32 = -1;

    for (hash, mut bucket) in buckets {
        bucket.sort_by(|a, b| a.0.cmp(&b.0));
        let mut previous: i32 = -1;

        for (path, entry) in bucket {
            let offset = i64::try_from(entry.offset).map_err(|_| {
                Error::CorruptHeader(format!("offset {} of {path} out of range", entry.offset))
            })?;

            body.write_i64::<LittleEndian>(offset)?;
            write_string(body, &path)?;
            body.write_i32::<LittleEndian>(previous)?;
            body.write_u32::<LittleEndian>(entry.size)?;
            if version.has_entry_flag() {
                body.write_i32::<LittleEndian>(entry.flag)?;
            }

            index += 1;
            previous = index;
        }

        last_in_bucket.insert(hash, index);
    }

    if version == ArkVersion::V9 {
        write_count(body, count)?;
        for hash in 0..count {
            body.write_i32::<LittleEndian>(last_in_bucket.get(&hash).copied().unwrap_or(-1))?;
        }
    } else {
        write_count(body, 1)?;
        body.write_i32::<LittleEndian>(last_in_bucket.get(&0).copied().unwrap_or(-1))?;
    }

    Ok(())
}

fn write_count(body: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = i32::try_from(count)
        .map_err(|_| Error::CorruptHeader(format!("count {count} out of range")))?;
    body.write_i32::<LittleEndian>(count)?;
    Ok(())
}

fn write_string(body: &mut Vec<u8>, value: &str) -> Result<()> {
    write_count(body, value.len())?;
    body.write_all(value.as_bytes())?;
    Ok(())
}
