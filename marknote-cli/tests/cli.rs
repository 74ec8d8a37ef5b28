//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_commands() {
    Command::cargo_bin("marknote")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("unpublish"));
}

#[test]
fn init_creates_workspace() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("marknote")
        .unwrap()
        .args(["init", "--token", "tok", "--endpoint", "https://svc.test/api"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(dir.path().join("marknote.json").is_file());
    assert!(dir.path().join("notes").is_dir());
}

#[test]
fn init_refuses_an_initialized_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marknote.json"), "{}").unwrap();

    Command::cargo_bin("marknote")
        .unwrap()
        .args(["init", "--token", "t", "--endpoint", "e"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already"));
}

#[test]
fn new_requires_an_initialized_workspace() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("marknote")
        .unwrap()
        .current_dir(dir.path())
        .args(["new", "a title"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("marknote init"));
}

#[test]
fn new_creates_note_files() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("marknote")
        .unwrap()
        .args(["init", "--token", "t", "--endpoint", "https://svc.test/api"])
        .arg(dir.path())
        .assert()
        .success();

    Command::cargo_bin("marknote")
        .unwrap()
        .current_dir(dir.path())
        .args(["new", "Weekly sync/notes"])
        .assert()
        .success();

    let created: Vec<_> = std::fs::read_dir(dir.path().join("notes"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(created, vec!["Weekly sync-notes.md"]);
}
