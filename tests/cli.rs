//! End-to-end tests of the ucontainer binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn ucontainer() -> Command {
    Command::cargo_bin("ucontainer").unwrap()
}

#[test]
fn schedule_human_output() {
    ucontainer()
        .args(["schedule", "--containers", "2", "--threads", "4", "--switches", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Schedule Workload"))
        .stdout(predicate::str::contains("Round-robin: yes"));
}

#[test]
fn memory_json_output() {
    let output = ucontainer()
        .args([
            "--json",
            "memory",
            "--containers",
            "2",
            "--threads",
            "4",
            "--objects",
            "2",
            "--iterations",
            "50",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["workload"], "memory");
    assert_eq!(value["report"]["consistent"], true);
    assert_eq!(value["report"]["teardown"]["containers"], 2);
}

#[test]
fn report_written_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");

    ucontainer()
        .args(["schedule", "--json", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"workload\": \"schedule\""));
}

#[test]
fn limits_file_is_applied() {
    let dir = tempdir().unwrap();
    let limits = dir.path().join("limits.json");
    fs::write(&limits, r#"{ "max_region_len": 1024 }"#).unwrap();

    ucontainer()
        .args(["memory", "--iterations", "1", "--object-size", "4096", "--limits"])
        .arg(&limits)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("exceeds the limit"));
}

#[test]
fn bad_limits_file() {
    let dir = tempdir().unwrap();
    let limits = dir.path().join("limits.json");
    fs::write(&limits, r#"{ "page_size": 3 }"#).unwrap();

    ucontainer()
        .args(["schedule", "--limits"])
        .arg(&limits)
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading limits"));
}

#[test]
fn zero_threads_rejected() {
    ucontainer()
        .args(["schedule", "--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one container and one thread"));
}
