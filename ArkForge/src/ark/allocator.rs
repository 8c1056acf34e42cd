//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Free-space allocation for incremental commits
//!
//! Unused ranges between committed entries are tracked as gaps. New data
//! goes into the smallest gap that can hold it, or is appended to the end
//! of the last part. Gap reuse is only enabled for single-part archives.

use super::entry::OffsetEntry;
use super::parts::{last_part_start, locate_part};

/// An unused byte range in logical offset space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub offset: u64,
    pub size: u64,
}

/// Where a new entry's bytes go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Logical offset across all parts
    pub offset: u64,
    /// Zero-based index into the part size list
    pub part_slot: usize,
    /// Offset within that part
    pub part_offset: u64,
}

/// Gap list and append point for one commit
#[derive(Debug, Clone)]
pub struct Allocator {
    gaps: Vec<Gap>,
    end: u64,
    part_sizes: Vec<u64>,
    reuse_gaps: bool,
}

impl Allocator {
    /// Build the allocator for the entries that survive a commit.
    ///
    /// `part_sizes` are the current logical part sizes; the append point
    /// never falls inside existing part data even when no entry covers it.
    #[must_use]
    pub fn new(entries: &[OffsetEntry], part_sizes: &[u64]) -> Self {
        let gaps = find_gaps(entries);
        let entries_end = entries.iter().map(OffsetEntry::end).max().unwrap_or(0);
        let total: u64 = part_sizes.iter().sum();

        Self {
            gaps,
            end: entries_end.max(total),
            part_sizes: part_sizes.to_vec(),
            reuse_gaps: part_sizes.len() <= 1,
        }
    }

    #[must_use]
    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    /// Current append point in logical offset space
    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Reserve `len` bytes, preferring the smallest gap that fits
    pub fn place(&mut self, len: u64) -> Placement {
        if let Some(offset) = self.take_best_fit(len) {
            let (part_slot, part_offset) = locate_part(offset, &self.part_sizes);
            tracing::debug!("Placed {len} bytes in gap at {offset}");
            return Placement {
                offset,
                part_slot,
                part_offset,
            };
        }

        let offset = self.end;
        self.end += len;

        let part_slot = self.part_sizes.len().saturating_sub(1);
        let part_offset = offset - last_part_start(&self.part_sizes);
        tracing::debug!("Appended {len} bytes at {offset}");

        Placement {
            offset,
            part_slot,
            part_offset,
        }
    }

    fn take_best_fit(&mut self, len: u64) -> Option<u64> {
        if !self.reuse_gaps {
            return None;
        }

        let (index, gap) = self
            .gaps
            .iter()
            .enumerate()
            .filter(|(_, gap)| gap.size >= len)
            .min_by_key(|(_, gap)| gap.size)
            .map(|(index, gap)| (index, *gap))?;

        if gap.size == len {
            self.gaps.remove(index);
        } else {
            let slot = &mut self.gaps[index];
            slot.offset += len;
            slot.size -= len;
        }

        Some(gap.offset)
    }
}

/// Unused ranges between entries, including any before the first one.
///
/// Entries are walked in `(offset, size)` order and the covered end only
/// ever moves forward, so zero-length or nested entries never open a gap.
#[must_use]
pub fn find_gaps(entries: &[OffsetEntry]) -> Vec<Gap> {
    let mut ranges: Vec<(u64, u64)> = entries.iter().map(|e| (e.offset, e.end())).collect();
    ranges.sort_unstable();

    let mut gaps = Vec::new();
    let mut covered = 0u64;

    for (start, end) in ranges {
        if start > covered {
            gaps.push(Gap {
                offset: covered,
                size: start - covered,
            });
        }
        covered = covered.max(end);
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ark::entry::EntryPath;

    fn entry(offset: u64, size: u32) -> OffsetEntry {
        OffsetEntry {
            path: EntryPath::parse(&format!("e_{offset}_{size}")),
            offset,
            part: 1,
            part_offset: offset,
            size,
            inflated_size: 0,
            flag: 0,
        }
    }

    #[test]
    fn test_fresh_archive_places_smallest_first() {
        let mut allocator = Allocator::new(&[], &[0]);

        // Commit processes files by ascending size: 5, 10, 20
        let offsets: Vec<u64> = [5, 10, 20].iter().map(|len| allocator.place(*len).offset).collect();
        assert_eq!(offsets, vec![0, 5, 15]);
        assert_eq!(allocator.end(), 35);
    }

    #[test]
    fn test_gap_reuse_shrinks_gap() {
        let entries = [entry(0, 10), entry(50, 10)];
        let mut allocator = Allocator::new(&entries, &[60]);
        assert_eq!(allocator.gaps(), &[Gap { offset: 10, size: 40 }]);

        let placement = allocator.place(30);
        assert_eq!(placement.offset, 10);
        assert_eq!(placement.part_offset, 10);
        assert_eq!(allocator.gaps(), &[Gap { offset: 40, size: 10 }]);
    }

    #[test]
    fn test_exact_fit_removes_gap() {
        let entries = [entry(0, 10), entry(20, 5)];
        let mut allocator = Allocator::new(&entries, &[25]);
        assert_eq!(allocator.place(10).offset, 10);
        assert!(allocator.gaps().is_empty());
        assert_eq!(allocator.place(1).offset, 25);
    }

    #[test]
    fn test_best_fit_prefers_smallest_gap() {
        let entries = [entry(10, 10), entry(50, 10), entry(65, 5)];
        let mut allocator = Allocator::new(&entries, &[70]);
        assert_eq!(
            allocator.gaps(),
            &[
                Gap { offset: 0, size: 10 },
                Gap { offset: 20, size: 30 },
                Gap { offset: 60, size: 5 },
            ]
        );

        assert_eq!(allocator.place(4).offset, 60);
        assert_eq!(allocator.place(8).offset, 0);
        assert_eq!(allocator.place(12).offset, 20);
    }

    #[test]
    fn test_zero_length_entries_never_open_gaps() {
        let entries = [entry(0, 10), entry(10, 0), entry(10, 5), entry(3, 0)];
        assert!(find_gaps(&entries).is_empty());
    }

    #[test]
    fn test_append_respects_part_size() {
        // Trailing bytes not covered by any entry are never overwritten
        let entries = [entry(0, 10)];
        let mut allocator = Allocator::new(&entries, &[40]);
        assert_eq!(allocator.place(5).offset, 40);
    }

    #[test]
    fn test_multi_part_always_appends_to_last_part() {
        let entries = [entry(0, 10), entry(50, 10), entry(100, 20)];
        let mut allocator = Allocator::new(&entries, &[60, 60]);

        let placement = allocator.place(5);
        assert_eq!(placement.offset, 120);
        assert_eq!(placement.part_slot, 1);
        assert_eq!(placement.part_offset, 60);
    }
}
