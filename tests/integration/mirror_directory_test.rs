//! Integration tests for mirroring a directory tree through the library API
//!
//! Covers structure preservation, setup failures, per-file fault isolation
//! and the concrete transform strategies.

use std::fs;
use std::path::{Path, PathBuf};

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use treemirror::error::FailureStage;
use treemirror::transform::{FixedContent, Frobnicator, MimeFilter, XmlScrubber};
use treemirror::{mirror_tree, Identity, MirrorConfig, MirrorError};

fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

#[test]
fn test_prepend_scenario() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");

    write_file(input.path(), "a/1.bin", &[0xAA]);
    write_file(input.path(), "b/2.bin", &[0xBB]);

    let mut frob = Frobnicator::from_hex(Some("00"), None).unwrap();
    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut frob).unwrap();

    assert_eq!(summary.processed_count(), 2);
    assert_eq!(summary.failed_count(), 0);
    assert_eq!(fs::read(output.join("a/1.bin")).unwrap(), vec![0x00, 0xAA]);
    assert_eq!(fs::read(output.join("b/2.bin")).unwrap(), vec![0x00, 0xBB]);
}

#[test]
fn test_identity_preserves_structure_and_bytes() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");

    write_file(input.path(), "root.txt", b"root");
    write_file(input.path(), "level1/mid.dat", &[1, 2, 3]);
    write_file(input.path(), "level1/level2/deep.bin", &[0xde, 0xad]);
    write_file(input.path(), "empty/zero.bin", &[]);

    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut Identity).unwrap();

    assert_eq!(list_files(input.path()), list_files(&output));
    for relative in list_files(input.path()) {
        assert_eq!(
            fs::read(input.path().join(&relative)).unwrap(),
            fs::read(output.join(&relative)).unwrap()
        );
        assert!(summary.processed.contains_key(&relative));
    }
    assert_eq!(summary.total(), 4);
}

#[test]
fn test_output_exists_without_force() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_file(input.path(), "a.bin", &[1]);
    write_file(output.path(), "keep.txt", b"untouched");

    let res = mirror_tree(MirrorConfig::new(input.path(), output.path()), &mut Identity);

    assert_matches!(res, Err(MirrorError::OutputExists { .. }));
    assert_eq!(list_files(output.path()), vec![PathBuf::from("keep.txt")]);
    assert_eq!(fs::read(output.path().join("keep.txt")).unwrap(), b"untouched");
}

#[test]
fn test_output_exists_with_force_overwrites() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_file(input.path(), "a.bin", b"new");
    write_file(output.path(), "a.bin", b"old contents");
    write_file(output.path(), "other.bin", b"other");

    let config = MirrorConfig::new(input.path(), output.path()).with_force(true);
    let summary = mirror_tree(config, &mut Identity).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(fs::read(output.path().join("a.bin")).unwrap(), b"new");
    assert_eq!(fs::read(output.path().join("other.bin")).unwrap(), b"other");
}

#[test]
fn test_missing_input_root() {
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");

    let res = mirror_tree(
        MirrorConfig::new(workspace.path().join("missing"), &output),
        &mut Identity,
    );

    assert_matches!(res, Err(MirrorError::InputNotFound { .. }));
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn test_special_files_behind_symlinks_fail_without_blocking() {
    use std::sync::mpsc;
    use std::time::Duration;

    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");
    let fifo = workspace.path().join("pipe");

    let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());
    write_file(input.path(), "ok.bin", b"fine");
    std::os::unix::fs::symlink(&fifo, input.path().join("evidence.bin")).unwrap();
    std::os::unix::fs::symlink("/dev/zero", input.path().join("zero.bin")).unwrap();

    let config = MirrorConfig::new(input.path(), &output).with_max_file_size(1024);
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        tx.send(mirror_tree(config, &mut Identity)).unwrap();
    });
    let summary = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("mirror run blocked on a special file")
        .unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.failed_count(), 2);
    for name in ["evidence.bin", "zero.bin"] {
        let failure = &summary.failed[Path::new(name)];
        assert_eq!(failure.stage, FailureStage::Read);
        assert!(failure.reason.contains("not a regular file"));
    }
    assert_eq!(fs::read(output.join("ok.bin")).unwrap(), b"fine");
}

#[cfg(unix)]
#[test]
fn test_unreadable_entry_is_isolated() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");

    for i in 0..4 {
        write_file(input.path(), &format!("dir{}/file{}.bin", i % 2, i), &[i as u8]);
    }
    // A dangling link cannot be read, even by root
    std::os::unix::fs::symlink(
        input.path().join("does-not-exist"),
        input.path().join("dir0/broken.bin"),
    )
    .unwrap();

    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut Identity).unwrap();

    assert_eq!(summary.processed_count(), 4);
    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.total(), 5);
    assert_eq!(
        summary.failed[Path::new("dir0/broken.bin")].stage,
        FailureStage::Read
    );
    for i in 0..4 {
        let relative = format!("dir{}/file{}.bin", i % 2, i);
        assert_eq!(fs::read(output.join(relative)).unwrap(), vec![i as u8]);
    }
    assert!(!output.join("dir0/broken.bin").exists());
}

#[test]
fn test_write_failure_is_isolated() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_file(input.path(), "a/1.bin", &[1]);
    write_file(input.path(), "b/2.bin", &[2]);
    // A directory where the file should go makes the write fail
    fs::create_dir_all(output.path().join("a/1.bin")).unwrap();

    let config = MirrorConfig::new(input.path(), output.path()).with_force(true);
    let summary = mirror_tree(config, &mut Identity).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.failed[Path::new("a/1.bin")].stage, FailureStage::Write);
    assert_eq!(fs::read(output.path().join("b/2.bin")).unwrap(), vec![2]);
}

#[test]
fn test_transform_failure_is_isolated() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");
    write_file(input.path(), "good.bin", b"ok");
    write_file(input.path(), "bad.bin", b"reject me");

    let mut picky = |bytes: &[u8]| -> Result<Vec<u8>, treemirror::TransformError> {
        if bytes.starts_with(b"reject") {
            Err(treemirror::TransformError::xml("rejected"))
        } else {
            Ok(bytes.to_vec())
        }
    };
    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut picky).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(
        summary.failed[Path::new("bad.bin")].stage,
        FailureStage::Transform
    );
    assert!(!output.join("bad.bin").exists());
}

#[test]
fn test_tallies_are_disjoint_and_complete() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");
    write_file(input.path(), "doc.xml", b"<Root><Script><User>bob</User></Script></Root>");
    write_file(input.path(), "notes.txt", b"not xml at all");
    write_file(input.path(), "sub/more.xml", b"<Root/>");

    let mut scrubber = XmlScrubber::new();
    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut scrubber).unwrap();

    assert_eq!(summary.processed_count(), 2);
    assert_eq!(summary.skipped_count(), 1);
    assert_eq!(summary.failed_count(), 0);
    assert_eq!(summary.total(), list_files(input.path()).len());
    for path in summary.processed.keys() {
        assert!(!summary.skipped.contains_key(path));
        assert!(!summary.failed.contains_key(path));
    }
    assert!(summary.skipped.contains_key(Path::new("notes.txt")));
    assert!(!output.join("notes.txt").exists());

    let scrubbed = fs::read_to_string(output.join("doc.xml")).unwrap();
    assert!(scrubbed.contains("<User>redacted</User>"));
    assert_eq!(scrubber.totals().users, 1);
}

#[test]
fn test_fixed_content_overwrite() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");
    write_file(input.path(), "big.jpg", &vec![7u8; 10_000]);
    write_file(input.path(), "nested/empty.jpg", &[]);
    write_file(input.path(), "nested/small.jpg", b"x");

    let mut redact = FixedContent::new(b"CLEAN".to_vec());
    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut redact).unwrap();

    assert_eq!(summary.processed_count(), 3);
    for relative in list_files(input.path()) {
        assert_eq!(fs::read(output.join(relative)).unwrap(), b"CLEAN");
    }
}

#[test]
fn test_in_place_redaction_with_force() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.jpg", b"secret a");
    write_file(dir.path(), "b/c.jpg", b"secret c");

    let config = MirrorConfig::new(dir.path(), dir.path()).with_force(true);
    let summary = mirror_tree(config, &mut FixedContent::new(b"clean".to_vec())).unwrap();

    assert_eq!(summary.processed_count(), 2);
    assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"clean");
    assert_eq!(fs::read(dir.path().join("b/c.jpg")).unwrap(), b"clean");
}

#[test]
fn test_mime_exclusion_omits_files() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");
    write_file(input.path(), "readme.txt", b"hello");
    write_file(input.path(), "blob/data.bin", &[0x00, 0x13, 0x37, 0xfe]);

    let mut filter = MimeFilter::default();
    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut filter).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.skipped_count(), 1);
    assert_eq!(list_files(&output), vec![PathBuf::from("readme.txt")]);
    assert!(!output.join("blob").exists());
    assert_eq!(filter.excluded(), 1);
}

#[test]
fn test_summary_json_report() {
    let input = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let output = workspace.path().join("out");
    write_file(input.path(), "a.bin", &[1, 2]);

    let summary = mirror_tree(MirrorConfig::new(input.path(), &output), &mut Identity).unwrap();
    let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();

    assert_eq!(json["processed"]["a.bin"], 2);
    assert_eq!(json["statistics"]["bytes_written"], 2);
}
