//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Per-version ARK header codec
//!
//! Headers come in nine schema revisions. Versions below 3 share one file
//! with the entry data; later versions keep the header (`.hdr`) apart from
//! one or more data parts (`_0.ark`, `_1.ark`, ...). Directories use either a
//! string blob with an open-addressed slot table (v2-v7) or per-entry hash
//! chains (v8+).

mod reader;
mod types;
mod writer;

pub use reader::HeaderReader;
pub use types::*;
pub use writer::HeaderWriter;

/// Largest multi-part header that is parsed in memory (20 MiB)
pub const MAX_HDR_SIZE: u64 = 20 * 0x100000;

/// Hash/timestamp block written by fresh v6+ headers
pub const FRESH_HASH_BLOCK: [u8; 16] = [0xFF; 16];
