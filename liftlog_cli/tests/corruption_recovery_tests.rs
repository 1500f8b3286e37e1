//! Corruption recovery tests for liftlog_cli.
//!
//! These tests verify the system can handle:
//! - Corrupted journal files
//! - Corrupted profile snapshots
//! - Missing files
//! - Partial writes

use assert_cmd::Command;
use std::fs;
use std::io::Write as IoWrite;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("liftlog").expect("Failed to find liftlog binary")
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_session_journal_ignored_during_read() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("journal")).unwrap();
    fs::write(
        data_dir.join("journal/sessions.jsonl"),
        "{ invalid json }\n{ more invalid }",
    )
    .expect("Failed to write corrupted journal");

    // Reads skip the corrupted lines
    cli()
        .arg("trend")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    // Writes still work alongside the corruption
    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("squat")
        .arg("--set")
        .arg("5x100")
        .assert()
        .success();
}

#[test]
fn test_partial_journal_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // Simulate a crash during write: valid line then a truncated one
    fs::create_dir_all(data_dir.join("journal")).unwrap();
    let journal_path = data_dir.join("journal/sessions.jsonl");

    let mut file = fs::File::create(&journal_path).unwrap();
    writeln!(file, r#"{{"id":"00000000-0000-0000-0000-000000000000"}}"#).unwrap();
    write!(file, r#"{{"id":"partial"#).unwrap();
    drop(file);

    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("squat")
        .arg("--set")
        .arg("5x100")
        .assert()
        .success();
}

#[test]
fn test_corrupted_profile_snapshot_recovers() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // Unlock something so a profile snapshot exists
    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("squat")
        .arg("--set")
        .arg("5x100")
        .assert()
        .success();

    // Corrupt every profile snapshot
    for entry in fs::read_dir(data_dir.join("profiles")).unwrap() {
        fs::write(entry.unwrap().path(), "{ invalid json }}}}").unwrap();
    }

    // Listing still works (falls back to defaults)
    cli()
        .arg("achievements")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    // The next unlock pass rebuilds the snapshot from the ledger
    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("bench_press")
        .arg("--set")
        .arg("1x102.5")
        .assert()
        .success();

    cli()
        .arg("achievements")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    // Snapshot is valid JSON again and reflects the ledger
    for entry in fs::read_dir(data_dir.join("profiles")).unwrap() {
        let content = fs::read_to_string(entry.unwrap().path()).unwrap();
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(&content);
        assert!(parsed.is_ok(), "Profile snapshot should be valid JSON");
    }
}

#[test]
fn test_corrupted_unlock_ledger_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("journal")).unwrap();
    fs::write(data_dir.join("journal/unlocks.jsonl"), "garbage line\n").unwrap();

    // Unlock evaluation proceeds past the corrupt line
    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("squat")
        .arg("--set")
        .arg("5x100")
        .assert()
        .success();

    let ledger = fs::read_to_string(data_dir.join("journal/unlocks.jsonl")).unwrap();
    assert!(ledger.contains("first_workout"));
}

#[test]
fn test_missing_files_are_not_fatal() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // Fresh data dir: every read command copes with nothing on disk
    cli()
        .arg("trend")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .arg("achievements")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();
}

#[test]
fn test_empty_journal_files() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("journal")).unwrap();
    fs::write(data_dir.join("journal/sessions.jsonl"), "").unwrap();
    fs::write(data_dir.join("journal/unlocks.jsonl"), "").unwrap();

    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("squat")
        .arg("--set")
        .arg("5x100")
        .assert()
        .success();
}

#[test]
fn test_rollup_with_valid_journal() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("squat")
        .arg("--set")
        .arg("5x100")
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    assert!(data_dir.join("sessions.csv").exists());
}
