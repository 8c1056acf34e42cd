//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! String hashing and the classic string blob + open-addressed slot table

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Multiplicative string hash reduced modulo `table_size` after every
/// UTF-16 code unit. A zero table size is treated as one.
#[must_use]
pub fn calc_hash(value: &str, table_size: usize) -> usize {
    let size = table_size.max(1) as i32;
    let mut hash: i32 = 0;

    for unit in value.encode_utf16() {
        hash = hash.wrapping_mul(0x7F).wrapping_add(i32::from(unit));
        hash = hash.wrapping_sub(hash.wrapping_div(size).wrapping_mul(size));
    }

    hash.rem_euclid(size) as usize
}

/// Slot count of the classic hash table for `entry_count` entries
#[must_use]
pub const fn classic_table_size(entry_count: usize) -> usize {
    entry_count * 2 + 200
}

/// String blob and slot table written by classic (pre-v8) directories.
///
/// The blob starts with the empty string at offset 0, which always owns
/// slot 0. Every other string is placed at its hash slot, probing forward on
/// collision and wrapping around to slot 1.
#[derive(Debug, Clone)]
pub struct StringTable {
    blob: Vec<u8>,
    table: Vec<u32>,
    slots: HashMap<String, usize>,
}

impl StringTable {
    /// Build the blob and table for `strings`, in first-seen order.
    ///
    /// Duplicates are written once.
    #[must_use]
    pub fn build<'a, I>(strings: I, table_size: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let table_size = table_size.max(1);
        let mut blob = vec![0u8];
        let mut table = vec![0u32; table_size];
        let mut occupied = vec![false; table_size];
        let mut slots = HashMap::new();

        occupied[0] = true;
        slots.insert(String::new(), 0);

        for value in strings {
            if slots.contains_key(value) {
                continue;
            }

            let offset = blob.len() as u32;
            blob.extend_from_slice(value.as_bytes());
            blob.push(0);

            let mut slot = calc_hash(value, table_size);
            let mut probes = 0;
            while occupied[slot] {
                slot += 1;
                if slot >= table_size {
                    slot = 1;
                }
                probes += 1;
                if probes >= table_size {
                    // Table is full; this cannot happen with 2n + 200 slots
                    break;
                }
            }

            occupied[slot] = true;
            table[slot] = offset;
            slots.insert(value.to_string(), slot);
        }

        Self { blob, table, slots }
    }

    /// Slot assigned to `value`
    #[must_use]
    pub fn slot(&self, value: &str) -> Option<usize> {
        self.slots.get(value).copied()
    }

    #[must_use]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Blob offset per slot
    #[must_use]
    pub fn table(&self) -> &[u32] {
        &self.table
    }
}

/// Read-side view of a classic blob + slot table
#[derive(Debug, Clone, Default)]
pub struct StringLookup {
    blob: Vec<u8>,
    table: Vec<i32>,
}

impl StringLookup {
    #[must_use]
    pub fn new(blob: Vec<u8>, table: Vec<i32>) -> Self {
        Self { blob, table }
    }

    /// Resolve a slot index to its string. Negative slots mean the root.
    pub fn resolve(&self, slot: i32) -> Result<String> {
        let Ok(index) = usize::try_from(slot) else {
            return Ok(String::new());
        };

        let offset = *self.table.get(index).ok_or_else(|| {
            Error::CorruptHeader(format!(
                "string slot {slot} outside table of {}",
                self.table.len()
            ))
        })?;

        let start = usize::try_from(offset)
            .ok()
            .filter(|start| *start <= self.blob.len())
            .ok_or_else(|| {
                Error::CorruptHeader(format!(
                    "string offset {offset} outside blob of {} bytes",
                    self.blob.len()
                ))
            })?;

        let bytes = &self.blob[start..];
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());

        Ok(decode_lossy(bytes[..end].to_vec()))
    }
}

/// Decode header string bytes, replacing invalid UTF-8 sequences
#[must_use]
pub fn decode_lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let text = String::from_utf8_lossy(e.as_bytes()).into_owned();
            tracing::warn!("Header string {text:?} is not valid UTF-8");
            text
        }
    }
}
