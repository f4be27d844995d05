//! Binary-level tests for the rtdeploy CLI.

#![allow(clippy::expect_used, deprecated)]

mod cli_tests;
mod metrics_command;

use std::path::{Path, PathBuf};

use assert_cmd::Command;

pub fn rtdeploy() -> Command {
    let mut cmd = Command::cargo_bin("rtdeploy").expect("rtdeploy binary should exist");
    cmd.env_remove("RTDEPLOY_CONFIG").env_remove("RUST_LOG");
    cmd
}

/// Write `content` as `name` inside `dir` and return its path.
pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}
