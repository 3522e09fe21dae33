use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let employees = dir.path().join("employees.csv");
    let journal = dir.path().join("journal.jsonl");
    common::write_employees(&employees, &["E1"], 12).unwrap();
    common::write_journal(&journal, &[common::mark_day("E1", "2024-03-04", "P")]).unwrap();

    let mut cmd = Command::new(cargo_bin!("alpr"));
    cmd.arg(&journal)
        .arg("--employees")
        .arg(&employees)
        .arg("--db-path")
        .arg(dir.path().join("some_db"));

    cmd.assert().success().stderr(predicate::str::contains(
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not \
         enabled. Falling back to in-memory storage.",
    ));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let employees = dir.path().join("employees.csv");
    let journal = dir.path().join("journal.jsonl");
    common::write_employees(&employees, &["E1"], 12).unwrap();
    common::write_journal(&journal, &[common::mark_day("E1", "2024-03-04", "P")]).unwrap();

    let mut cmd = Command::new(cargo_bin!("alpr"));
    cmd.arg(&journal)
        .arg("--employees")
        .arg(&employees)
        .arg("--db-path")
        .arg(dir.path().join("test_db"));

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
