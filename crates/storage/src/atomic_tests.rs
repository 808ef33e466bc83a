// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn writes_contents_under_final_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task.json");

    write_atomic(&path, b"{\"ok\":true}").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"{\"ok\":true}");
    assert!(!tmp_path(&path).exists());
}

#[test]
fn overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task.json");

    write_atomic(&path, b"one").unwrap();
    write_atomic(&path, b"two").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"two");
}

#[test]
fn creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a/b/c/artifact.txt");

    write_atomic(&path, b"deep").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"deep");
}

#[cfg(unix)]
#[test]
fn written_files_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task.json");
    write_atomic(&path, b"x").unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[cfg(unix)]
#[test]
fn created_directories_are_group_readable_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/task.json");
    write_atomic(&path, b"x").unwrap();

    let mode = fs::metadata(dir.path().join("nested"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o750);
}
