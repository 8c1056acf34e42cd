//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Multi-part layout: offset resolution, part naming and part size probing

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use super::version::ArkVersion;
use crate::error::{Error, Result};

/// Marker closing a v10+ part that carries an encrypted data block
pub const PART_TRAILER: &[u8; 32] = b"mcnxyxcmvmcxyxcmskdldkjshagsdhfj";

/// Resolve a logical offset to `(part slot, offset within that part)`.
///
/// `sizes` are the data part sizes in part order and the returned slot is a
/// zero-based index into it. An offset equal to the cumulative size of the
/// first K parts lands at the start of part K. Offsets past the end stay in
/// the last part.
#[must_use]
pub fn locate_part(offset: u64, sizes: &[u64]) -> (usize, u64) {
    let Some(&first) = sizes.first() else {
        return (0, offset);
    };

    let mut index = 0;
    let mut start = 0u64;
    let mut next = first;

    while offset >= next && index < sizes.len() - 1 {
        start = next;
        index += 1;
        next += sizes[index];
    }

    (index, offset - start)
}

/// Logical offset where the last part starts
#[must_use]
pub fn last_part_start(sizes: &[u64]) -> u64 {
    match sizes.split_last() {
        Some((_, preceding)) => preceding.iter().sum(),
        None => 0,
    }
}

/// Extension for data parts, matching the case of the header file name.
///
/// The header's extension decides (`MAIN.HDR` -> `.ARK`); a header without
/// one falls back to its stem.
#[must_use]
pub fn part_extension(hdr_path: &Path) -> &'static str {
    let reference = hdr_path
        .extension()
        .or_else(|| hdr_path.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if !reference.is_empty() && reference.chars().all(char::is_uppercase) {
        ".ARK"
    } else {
        ".ark"
    }
}

/// Path of the data part with zero-based file suffix `index` (`main_0.ark`)
#[must_use]
pub fn part_path(hdr_path: &Path, index: usize) -> PathBuf {
    let stem = hdr_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = part_extension(hdr_path);

    hdr_path.with_file_name(format!("{stem}_{index}{ext}"))
}

/// Synthesize `count` data part paths next to the header
#[must_use]
pub fn part_paths(hdr_path: &Path, count: usize) -> Vec<PathBuf> {
    (0..count).map(|i| part_path(hdr_path, i)).collect()
}

/// Resolve a stored part name against the header's directory.
///
/// Stored names may carry a relative prefix (`gen/main_0.ark`) or even an
/// absolute path, so only the file name is kept.
#[must_use]
pub fn stored_part_path(hdr_path: &Path, stored: &str) -> PathBuf {
    let normalized = stored.replace('\\', "/");
    let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
    hdr_path.with_file_name(file_name)
}

/// True for `NAME_<digits>.ark` (case-insensitive extension)
#[must_use]
pub fn is_numbered_part(path: &Path) -> bool {
    let is_ark = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ark"));

    let numbered = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit_once('_'))
        .is_some_and(|(_, digits)| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));

    is_ark && numbered
}

/// Map a data part path (`main_0.ark`) to its sibling header (`main.hdr`).
///
/// Any other path is returned unchanged. The header extension is matched
/// case-insensitively; when no header is found the input path is kept.
pub fn resolve_header_path(path: &Path) -> Result<PathBuf> {
    if !is_numbered_part(path) {
        return Ok(path.to_path_buf());
    }

    let Some((name, _)) = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit_once('_'))
    else {
        return Ok(path.to_path_buf());
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let wanted = format!("{}.hdr", name.to_lowercase());

    for entry in fs::read_dir(&directory)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().to_lowercase() == wanted {
            tracing::debug!(
                "Redirecting {} to header {}",
                path.display(),
                entry.path().display()
            );
            return Ok(entry.path());
        }
    }

    tracing::warn!("No header found next to part {}", path.display());
    Ok(path.to_path_buf())
}

/// Physical size information for one data part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartInfo {
    /// Size as seen by entry offsets
    pub size: u64,
    /// The part ends with an encrypted data trailer
    pub encrypted: bool,
}

/// Measure a part, honoring the v10+ encrypted trailer
pub fn probe_part_size(path: &Path, version: ArkVersion) -> Result<PartInfo> {
    if !path.exists() {
        return Err(Error::PartFileMissing {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let plain = PartInfo {
        size: len,
        encrypted: false,
    };

    if !version.has_part_trailer() || len < PART_TRAILER.len() as u64 + 4 {
        return Ok(plain);
    }

    file.seek(SeekFrom::End(-(PART_TRAILER.len() as i64 + 4)))?;
    let encrypted_len = file.read_i32::<LittleEndian>()?;
    let mut marker = [0u8; 32];
    file.read_exact(&mut marker)?;

    if &marker != PART_TRAILER {
        return Ok(plain);
    }

    let size = len.saturating_sub(u64::from(encrypted_len.max(0).unsigned_abs()));
    tracing::debug!(
        "Part {} has encrypted trailer ({} bytes)",
        path.display(),
        encrypted_len
    );

    Ok(PartInfo {
        size,
        encrypted: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_locate_part_within_parts() {
        let sizes = [100, 50, 25];
        assert_eq!(locate_part(0, &sizes), (0, 0));
        assert_eq!(locate_part(99, &sizes), (0, 99));
        assert_eq!(locate_part(120, &sizes), (1, 20));
        assert_eq!(locate_part(160, &sizes), (2, 10));
    }

    #[test]
    fn test_locate_part_boundary_starts_next_part() {
        let sizes = [100, 50, 25];
        assert_eq!(locate_part(100, &sizes), (1, 0));
        assert_eq!(locate_part(150, &sizes), (2, 0));
    }

    #[test]
    fn test_locate_part_past_end_stays_in_last() {
        let sizes = [100, 50];
        assert_eq!(locate_part(200, &sizes), (1, 100));
        assert_eq!(locate_part(7, &[]), (0, 7));
        assert_eq!(locate_part(7, &[0]), (0, 7));
    }

    #[test]
    fn test_last_part_start() {
        assert_eq!(last_part_start(&[100, 50, 25]), 150);
        assert_eq!(last_part_start(&[42]), 0);
        assert_eq!(last_part_start(&[]), 0);
    }

    #[test]
    fn test_part_paths_follow_header_case() {
        assert_eq!(
            part_paths(Path::new("gen/main.hdr"), 2),
            vec![PathBuf::from("gen/main_0.ark"), PathBuf::from("gen/main_1.ark")]
        );
        assert_eq!(part_path(Path::new("GEN/MAIN.HDR"), 3), PathBuf::from("GEN/MAIN_3.ARK"));
        assert_eq!(part_path(Path::new("MAIN"), 0), PathBuf::from("MAIN_0.ARK"));
    }

    #[test]
    fn test_stored_part_path_keeps_file_name() {
        let hdr = Path::new("/data/gen/main.hdr");
        assert_eq!(
            stored_part_path(hdr, "gen/main_0.ark"),
            PathBuf::from("/data/gen/main_0.ark")
        );
        assert_eq!(
            stored_part_path(hdr, "C:\\dev\\main_1.ark"),
            PathBuf::from("/data/gen/main_1.ark")
        );
    }

    #[test]
    fn test_is_numbered_part() {
        assert!(is_numbered_part(Path::new("main_0.ark")));
        assert!(is_numbered_part(Path::new("MAIN_12.ARK")));
        assert!(!is_numbered_part(Path::new("main.ark")));
        assert!(!is_numbered_part(Path::new("main_x.ark")));
        assert!(!is_numbered_part(Path::new("main_0.hdr")));
    }

    #[test]
    fn test_resolve_header_path_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let hdr = dir.path().join("MAIN.HDR");
        let part = dir.path().join("main_0.ark");
        std::fs::write(&hdr, [0u8; 4]).unwrap();
        std::fs::write(&part, []).unwrap();

        assert_eq!(resolve_header_path(&part).unwrap(), hdr);
        assert_eq!(resolve_header_path(&hdr).unwrap(), hdr);
    }

    #[test]
    fn test_probe_part_size_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main_0.ark");
        {
            let mut file = File::create(&path).unwrap();
            file.write_all(&[0xAA; 100]).unwrap();
            file.write_all(&[0xBB; 20]).unwrap();
            file.write_all(&56i32.to_le_bytes()).unwrap();
            file.write_all(PART_TRAILER).unwrap();
        }

        let info = probe_part_size(&path, ArkVersion::V10).unwrap();
        assert_eq!(info, PartInfo { size: 100, encrypted: true });

        let info = probe_part_size(&path, ArkVersion::V9).unwrap();
        assert_eq!(info, PartInfo { size: 156, encrypted: false });
    }

    #[test]
    fn test_probe_missing_part() {
        let dir = tempfile::tempdir().unwrap();
        let err = probe_part_size(&dir.path().join("nope_0.ark"), ArkVersion::V9).unwrap_err();
        assert!(matches!(err, Error::PartFileMissing { .. }));
    }
}
