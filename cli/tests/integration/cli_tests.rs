//! Help, version and argument validation.

use predicates::prelude::*;

use crate::rtdeploy;

#[test]
fn no_args_shows_help_and_exits_two() {
    rtdeploy()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn help_lists_commands() {
    rtdeploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("targets"))
        .stdout(predicate::str::contains("metrics"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn version_flag_prints_version() {
    rtdeploy()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn run_help_shows_phase_selection() {
    rtdeploy()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--steps"))
        .stdout(predicate::str::contains("--build-only"))
        .stdout(predicate::str::contains("--metrics-dir"));
}

#[test]
fn conflicting_phase_flags_rejected() {
    rtdeploy()
        .args(["run", "--build-only", "--execute-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_config_file_is_an_error() {
    rtdeploy()
        .args(["targets", "--config", "/nonexistent/rtdeploy.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read configuration file"));
}
