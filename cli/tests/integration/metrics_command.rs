//! `rtdeploy metrics`

use predicates::prelude::*;
use tempfile::TempDir;

use crate::{rtdeploy, write};

fn record(target: &str, timestamp: &str, output: &str) -> String {
    serde_json::json!({
        "target": target,
        "timestamp": timestamp,
        "execution_time": 2.5,
        "output": output,
    })
    .to_string()
}

#[test]
fn shows_latest_record_by_name() {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "metrics_lab_20260101_100000.json",
        &record("lab", "2026-01-01T10:00:00Z", "Messages sent: 1\n"),
    );
    write(
        dir.path(),
        "metrics_lab_20260102_100000.json",
        &record("lab", "2026-01-02T10:00:00Z", "Messages sent: 42\nClient log lines: 7\n"),
    );

    rtdeploy()
        .arg("metrics")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("metrics_lab_20260102_100000.json"))
        .stdout(predicate::str::contains("42"))
        .stdout(predicate::str::contains("2026-01-02 10:00:00"));
}

#[test]
fn explicit_file_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        dir.path(),
        "run.json",
        &record("lab", "2026-01-01T10:00:00Z", "Messages sent: 5\nMessages received: x\n"),
    );

    let output = rtdeploy()
        .arg("--json")
        .arg("metrics")
        .arg(&path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["messages_sent"], 5);
    assert_eq!(value["messages_received"], 0);
    assert_eq!(value["execution_time"], 2.5);
}

#[test]
fn all_records_one_row_each() {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "metrics_lab_20260101_100000.json",
        &record("lab", "2026-01-01T10:00:00Z", "Messages sent: 1\n"),
    );
    write(
        dir.path(),
        "metrics_lab_20260102_100000.json",
        &record("lab", "2026-01-02T10:00:00Z", "Messages sent: 2\n"),
    );
    write(dir.path(), "notes.json", "{}");

    rtdeploy()
        .arg("metrics")
        .arg("--all")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01-01 10:00:00"))
        .stdout(predicate::str::contains("2026-01-02 10:00:00"));
}

#[test]
fn empty_directory_is_an_error() {
    let dir = TempDir::new().expect("tempdir");

    rtdeploy()
        .arg("metrics")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no metrics records"));
}
