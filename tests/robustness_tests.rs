use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_malformed_journal_handling() {
    let dir = tempfile::tempdir().unwrap();
    let employees = dir.path().join("employees.csv");
    let journal = dir.path().join("journal.jsonl");
    common::write_employees(&employees, &["E1"], 12).unwrap();
    common::write_journal(
        &journal,
        &[
            common::mark_day("E1", "2024-03-04", "P"),
            // Truncated JSON
            r#"{"op":"mark_day","employee":"E1""#.to_string(),
            // Unknown operation
            r#"{"op":"pay_everyone"}"#.to_string(),
            common::mark_day("E1", "2024-03-05", "P"),
            r#"{"op":"attendance_summary","employee":"E1","month":"2024-03"}"#.to_string(),
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("alpr"));
    cmd.arg(&journal).arg("--employees").arg(&employees);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading command"))
        .stdout(predicate::str::contains(r#""present_days":2"#));
}

#[test]
fn test_invalid_values_are_reported_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let employees = dir.path().join("employees.csv");
    let journal = dir.path().join("journal.jsonl");
    common::write_employees(&employees, &["E1"], 12).unwrap();
    common::write_journal(
        &journal,
        &[
            common::mark_day("E1", "2024-02-30", "P"),
            common::mark_day("E1", "2024-03-04", "X"),
            common::mark_day("", "2024-03-04", "P"),
            r#"{"op":"submit_leave","employee":"E1","leave_type":"casual","start":"2024-03-10","end":"2024-03-08","reason":"trip"}"#.to_string(),
            r#"{"op":"submit_leave","employee":"ghost","leave_type":"casual","start":"2024-03-08","end":"2024-03-08","reason":"trip"}"#.to_string(),
            r#"{"op":"submit_leave","employee":"E1","leave_type":"casual","start":"2024-03-08","end":"2024-03-08","reason":"  "}"#.to_string(),
            r#"{"op":"transition_leave","leave":"unknown","status":"approved"}"#.to_string(),
            common::mark_day("E1", "2024-03-04", "P"),
        ],
    )
    .unwrap();

    let output = Command::new(cargo_bin!("alpr"))
        .arg(&journal)
        .arg("--employees")
        .arg(&employees)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error processing command"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let outcomes: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(outcomes.len(), 8);
    for outcome in &outcomes[..3] {
        assert!(outcome["error"].as_str().unwrap().starts_with("Validation error"));
    }
    assert!(outcomes[3]["error"].as_str().unwrap().starts_with("Validation error"));
    assert!(outcomes[4]["error"].as_str().unwrap().starts_with("Not found"));
    assert!(outcomes[5]["error"].as_str().unwrap().starts_with("Validation error"));
    assert!(outcomes[6]["error"].as_str().unwrap().starts_with("Not found"));
    assert_eq!(outcomes[7]["ok"], true);
}

#[test]
fn test_invalid_default_radius_fails() {
    let dir = tempfile::tempdir().unwrap();
    let employees = dir.path().join("employees.csv");
    let journal = dir.path().join("journal.jsonl");
    common::write_employees(&employees, &["E1"], 12).unwrap();
    common::write_journal(&journal, &[]).unwrap();

    let mut cmd = Command::new(cargo_bin!("alpr"));
    cmd.arg(&journal)
        .arg("--employees")
        .arg(&employees)
        .arg("--default-radius")
        .arg("-5");

    cmd.assert().failure();
}
