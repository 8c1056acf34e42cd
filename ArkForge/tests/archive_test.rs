//! End-to-end tests for header-backed archives

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use arkforge::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

/// Write `files` below `dir/src` and return their local paths
fn write_sources(dir: &Path, files: &[(&str, Vec<u8>)]) -> Vec<PathBuf> {
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    files
        .iter()
        .enumerate()
        .map(|(i, (_, data))| {
            let path = src.join(format!("file{i}.bin"));
            fs::write(&path, data).unwrap();
            path
        })
        .collect()
}

fn sample_files() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("main.dta", b"(main)".to_vec()),
        ("config/gen/rb.dtb", vec![0xAB; 300]),
        ("songs/foo/foo.mid", (0..=255u8).collect()),
        ("songs/foo/foo.mogg", vec![7; 1024]),
        ("songs/bar/bar.mid", b"bar".to_vec()),
        ("ui/empty.txt", Vec::new()),
    ]
}

fn header_name(version: ArkVersion) -> &'static str {
    if version.is_single_file() { "main.ark" } else { "main.hdr" }
}

fn committed_archive(
    dir: &TempDir,
    version: ArkVersion,
    key: Option<i32>,
) -> (ArkArchive, Vec<(&'static str, Vec<u8>)>) {
    let files = sample_files();
    let locals = write_sources(dir.path(), &files);

    let mut options = ArkOptions::new(version);
    if let Some(key) = key {
        options = options.with_key(key);
    }
    let mut archive = ArkArchive::create(dir.path().join(header_name(version)), &options).unwrap();
    for ((target, _), local) in files.iter().zip(&locals) {
        archive.stage(local, target).unwrap();
    }
    archive.commit().unwrap();
    (archive, files)
}

fn assert_no_overlap(archive: &ArkArchive) {
    let entries = archive.committed();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            assert!(!a.overlaps(b), "{} overlaps {}", a.path, b.path);
        }
    }
}

fn path_set(archive: &ArkArchive) -> BTreeSet<String> {
    archive.entries().iter().map(ArkEntry::full_path).collect()
}

#[test]
fn test_round_trip_every_version() {
    for version in ArkVersion::ALL {
        let dir = tempdir().unwrap();
        let (archive, files) = committed_archive(&dir, version, None);
        assert!(!archive.has_pending_changes());

        let reopened = ArkArchive::open(archive.header_path()).unwrap();
        assert_eq!(reopened.version(), version);

        let expected: BTreeSet<String> = files.iter().map(|(p, _)| (*p).to_string()).collect();
        assert_eq!(path_set(&reopened), expected, "{version}");

        for (path, data) in &files {
            assert_eq!(&reopened.read_entry(path).unwrap(), data, "{version} {path}");
        }
        assert_no_overlap(&reopened);
    }
}

#[test]
fn test_encrypted_round_trip() {
    for version in [ArkVersion::V4, ArkVersion::V6, ArkVersion::V9, ArkVersion::V10] {
        let dir = tempdir().unwrap();
        let (archive, files) = committed_archive(&dir, version, Some(DEFAULT_KEY));

        let raw = fs::read(archive.header_path()).unwrap();
        assert_eq!(i32::from_le_bytes(raw[..4].try_into().unwrap()), DEFAULT_KEY);

        let reopened = ArkArchive::open(archive.header_path()).unwrap();
        assert_eq!(reopened.key(), Some(DEFAULT_KEY));
        assert_eq!(
            reopened.header().encryption.unwrap().xor,
            version >= ArkVersion::V10
        );
        for (path, data) in &files {
            assert_eq!(&reopened.read_entry(path).unwrap(), data);
        }
    }
}

#[test]
fn test_single_file_rejects_encryption() {
    let dir = tempdir().unwrap();
    let options = ArkOptions::new(ArkVersion::V2).with_key(DEFAULT_KEY);
    assert!(matches!(
        ArkArchive::create(dir.path().join("main.ark"), &options),
        Err(Error::EncryptionNotSupported { version: 2 })
    ));
}

#[test]
fn test_lookup_is_case_insensitive_and_reports_missing() {
    let dir = tempdir().unwrap();
    let (archive, _) = committed_archive(&dir, ArkVersion::V9, None);

    let entry = archive.lookup("SONGS/Foo/FOO.MID").unwrap();
    assert_eq!(entry.full_path(), "songs/foo/foo.mid");
    assert_eq!(entry.size(), Some(256));

    assert!(archive.lookup("songs/foo/foo.milo").is_none());
    assert!(archive.lookup("").is_none());
    assert!(matches!(
        archive.read_entry("songs/nope.mid"),
        Err(Error::EntryNotFound(_))
    ));
}

#[test]
fn test_smallest_file_first_placement() {
    let dir = tempdir().unwrap();
    let locals = write_sources(
        dir.path(),
        &[("five", vec![5; 5]), ("twenty", vec![20; 20]), ("ten", vec![10; 10])],
    );

    let hdr = dir.path().join("main.hdr");
    let mut archive = ArkArchive::create(&hdr, &ArkOptions::new(ArkVersion::V9)).unwrap();
    archive.stage(&locals[0], "five").unwrap();
    archive.stage(&locals[1], "twenty").unwrap();
    archive.stage(&locals[2], "ten").unwrap();
    archive.commit().unwrap();

    let reopened = ArkArchive::open(&hdr).unwrap();
    assert_eq!(reopened.committed().len(), 3);

    let placed = |name: &str| match reopened.lookup(name).unwrap() {
        ArkEntry::Offset(e) => (e.offset, e.size),
        ArkEntry::Pending(_) => panic!("{name} is still pending"),
    };
    assert_eq!(placed("five"), (0, 5));
    assert_eq!(placed("ten"), (5, 10));
    assert_eq!(placed("twenty"), (15, 20));
}

#[test]
fn test_replacement_reuses_freed_gap() {
    let dir = tempdir().unwrap();
    let locals = write_sources(
        dir.path(),
        &[
            ("head", vec![1; 10]),
            ("middle", vec![2; 40]),
            ("tail", vec![3; 10]),
            ("smaller", vec![4; 30]),
            ("filler", vec![5; 10]),
        ],
    );

    let hdr = dir.path().join("main.hdr");
    let mut archive = ArkArchive::create(&hdr, &ArkOptions::new(ArkVersion::V9)).unwrap();
    archive.stage(&locals[0], "head").unwrap();
    archive.stage(&locals[1], "middle").unwrap();
    archive.commit().unwrap();
    archive.stage(&locals[2], "tail").unwrap();
    archive.commit().unwrap();

    // [0,10) head, [10,50) middle, [50,60) tail
    let offset = |archive: &ArkArchive, name: &str| match archive.lookup(name).unwrap() {
        ArkEntry::Offset(e) => e.offset,
        ArkEntry::Pending(_) => panic!("{name} is still pending"),
    };
    assert_eq!(offset(&archive, "tail"), 50);

    // Replacing middle frees [10,50); the 30-byte file takes its start
    archive.stage(&locals[3], "MIDDLE").unwrap();
    archive.commit().unwrap();
    assert_eq!(offset(&archive, "middle"), 10);
    assert_eq!(archive.read_entry("middle").unwrap(), vec![4; 30]);

    // The remaining [40,50) is used before appending
    archive.stage(&locals[4], "filler").unwrap();
    archive.commit().unwrap();
    assert_eq!(offset(&archive, "filler"), 40);

    let reopened = ArkArchive::open(&hdr).unwrap();
    assert_eq!(reopened.committed().len(), 4);
    assert_eq!(reopened.read_entry("head").unwrap(), vec![1; 10]);
    assert_eq!(reopened.read_entry("tail").unwrap(), vec![3; 10]);
    assert_eq!(fs::metadata(dir.path().join("main_0.ark")).unwrap().len(), 60);
    assert_no_overlap(&reopened);
}

#[test]
fn test_pending_entries_shadow_committed() {
    let dir = tempdir().unwrap();
    let (mut archive, _) = committed_archive(&dir, ArkVersion::V7, None);

    let local = dir.path().join("new.mid");
    fs::write(&local, b"new contents").unwrap();
    archive.stage(&local, "Songs/Foo/Foo.mid").unwrap();
    assert!(archive.has_pending_changes());

    let entries = archive.entries();
    let matching: Vec<&ArkEntry> = entries
        .iter()
        .filter(|e| e.path().lookup_key() == "songs/foo/foo.mid")
        .collect();
    assert_eq!(matching.len(), 1);
    assert!(matching[0].is_pending());
    assert_eq!(archive.read_entry("songs/foo/foo.mid").unwrap(), b"new contents");

    archive.commit().unwrap();
    assert!(!archive.has_pending_changes());
    assert_eq!(archive.committed().len(), sample_files().len());
    assert_eq!(archive.read_entry("songs/foo/foo.mid").unwrap(), b"new contents");
}

#[test]
fn test_entries_are_sorted_across_pending_and_committed() {
    let dir = tempdir().unwrap();
    let (mut archive, _) = committed_archive(&dir, ArkVersion::V9, None);

    let local = dir.path().join("extra.bin");
    fs::write(&local, b"extra").unwrap();
    archive.stage(&local, "songs/baz/baz.mid").unwrap();
    archive.stage(&local, "zz/last.txt").unwrap();

    let paths: Vec<String> = archive.entries().iter().map(ArkEntry::full_path).collect();
    assert_eq!(
        paths,
        vec![
            "config/gen/rb.dtb",
            "main.dta",
            "songs/bar/bar.mid",
            "songs/baz/baz.mid",
            "songs/foo/foo.mid",
            "songs/foo/foo.mogg",
            "ui/empty.txt",
            "zz/last.txt",
        ]
    );
    assert!(archive.entries()[3].is_pending());
}

#[test]
fn test_commit_without_changes_is_noop() {
    let dir = tempdir().unwrap();
    let (mut archive, _) = committed_archive(&dir, ArkVersion::V5, None);
    let before = fs::read(archive.header_path()).unwrap();
    archive.commit().unwrap();
    assert_eq!(fs::read(archive.header_path()).unwrap(), before);
}

#[test]
fn test_single_file_archive_cannot_grow() {
    let dir = tempdir().unwrap();
    let (mut archive, _) = committed_archive(&dir, ArkVersion::V2, None);

    let local = dir.path().join("late.dta");
    fs::write(&local, b"late").unwrap();
    archive.stage(&local, "late.dta").unwrap();
    assert!(matches!(
        archive.commit(),
        Err(Error::LegacyArchiveFull { version: 2 })
    ));
    assert!(matches!(
        archive.add_part(None),
        Err(Error::SingleFileArchive { version: 2 })
    ));
}

#[test]
fn test_multi_part_appends_to_last_part() {
    let dir = tempdir().unwrap();
    let (mut archive, _) = committed_archive(&dir, ArkVersion::V6, None);
    let first_part_len = fs::metadata(&archive.paths()[1]).unwrap().len();

    let new_part = archive.add_part(None).unwrap();
    assert_eq!(new_part, dir.path().join("main_1.ark"));
    assert_eq!(archive.part_count(), 2);

    // Replacing frees space in part 1, but with two parts nothing is reused
    let local = dir.path().join("tiny.dta");
    fs::write(&local, b"x").unwrap();
    archive.stage(&local, "main.dta").unwrap();
    archive.commit().unwrap();

    let reopened = ArkArchive::open(dir.path().join("main.hdr")).unwrap();
    assert_eq!(reopened.header().part_sizes, vec![first_part_len, 1]);
    let ArkEntry::Offset(entry) = reopened.lookup("main.dta").unwrap() else {
        panic!("main.dta is pending");
    };
    assert_eq!(entry.part, 2);
    assert_eq!(entry.part_offset, 0);
    assert_eq!(entry.offset, first_part_len);
    assert_eq!(reopened.read_entry("main.dta").unwrap(), b"x");
    assert_eq!(reopened.read_entry("songs/foo/foo.mogg").unwrap(), vec![7; 1024]);
    assert_no_overlap(&reopened);
}

#[test]
fn test_open_part_redirects_to_header() {
    let dir = tempdir().unwrap();
    let (archive, _) = committed_archive(&dir, ArkVersion::V8, None);

    let via_part = ArkArchive::open(dir.path().join("main_0.ark")).unwrap();
    assert_eq!(via_part.header_path(), archive.header_path());
    assert_eq!(path_set(&via_part), path_set(&archive));
}

#[test]
fn test_copy_to_directory() {
    let dir = tempdir().unwrap();
    let (mut archive, files) = committed_archive(&dir, ArkVersion::V10, Some(0x1234_5678));

    let local = dir.path().join("staged.dta");
    fs::write(&local, b"staged").unwrap();
    archive.stage(&local, "staged.dta").unwrap();
    assert!(matches!(
        archive.copy_to_directory(dir.path().join("copy")),
        Err(Error::PendingChanges)
    ));
    archive.commit().unwrap();

    let copy = archive.copy_to_directory(dir.path().join("copy")).unwrap();
    assert_eq!(copy.header_path(), dir.path().join("copy").join("main.hdr"));
    assert_eq!(copy.key(), Some(0x1234_5678));
    for (path, data) in &files {
        assert_eq!(&copy.read_entry(path).unwrap(), data);
    }
    assert_eq!(copy.read_entry("staged.dta").unwrap(), b"staged");
}

#[test]
fn test_set_version_rewrites_layout() {
    let dir = tempdir().unwrap();
    let (mut archive, files) = committed_archive(&dir, ArkVersion::V5, None);

    archive.set_version(ArkVersion::V9).unwrap();
    archive.write_header().unwrap();

    let reopened = ArkArchive::open(archive.header_path()).unwrap();
    assert_eq!(reopened.version(), ArkVersion::V9);
    assert_eq!(reopened.header().part_names, vec!["main_0.ark".to_string()]);
    for (path, data) in &files {
        assert_eq!(&reopened.read_entry(path).unwrap(), data);
    }
}

#[test]
fn test_set_version_below_v9_restores_gen_prefix() {
    let dir = tempdir().unwrap();
    let (mut archive, files) = committed_archive(&dir, ArkVersion::V9, None);
    assert_eq!(archive.header().part_names, vec!["main_0.ark".to_string()]);

    archive.set_version(ArkVersion::V5).unwrap();
    archive.write_header().unwrap();

    let reopened = ArkArchive::open(archive.header_path()).unwrap();
    assert_eq!(reopened.version(), ArkVersion::V5);
    assert_eq!(reopened.header().part_names, vec!["gen/main_0.ark".to_string()]);
    for (path, data) in &files {
        assert_eq!(&reopened.read_entry(path).unwrap(), data);
    }
}

#[test]
fn test_missing_part_is_reported_on_read() {
    let dir = tempdir().unwrap();
    let (archive, _) = committed_archive(&dir, ArkVersion::V9, None);
    fs::remove_file(dir.path().join("main_0.ark")).unwrap();

    let reopened = ArkArchive::open(archive.header_path()).unwrap();
    assert!(matches!(
        reopened.read_entry("main.dta"),
        Err(Error::PartFileMissing { .. })
    ));
}

#[test]
fn test_unknown_version_is_rejected() {
    let dir = tempdir().unwrap();
    let hdr = dir.path().join("bogus.hdr");
    fs::write(&hdr, [0x0B, 0, 0, 0, 0, 0, 0, 0]).unwrap();
    // 11 is neither a known version nor a key that decrypts to one
    assert!(matches!(
        ArkArchive::open(&hdr),
        Err(Error::UnsupportedVersion { .. })
    ));
}
