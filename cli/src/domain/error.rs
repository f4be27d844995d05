//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Problems found before any phase runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Target '{requested}' not found. Available targets: {available}")]
    UnknownTarget { requested: String, available: String },

    #[error("No targets defined in {0}")]
    NoTargets(PathBuf),

    #[error("Invalid configuration for target '{target}': {reason}")]
    InvalidConfiguration { target: String, reason: String },
}

// ── Build errors ──────────────────────────────────────────────────────────────

/// Build-phase failures. Each one halts the run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Build '{unit}': source directory {} does not exist", path.display())]
    SourceMissing { unit: String, path: PathBuf },

    #[error("Build '{unit}' failed with exit code {code}: {stderr}")]
    CommandFailed {
        unit: String,
        code: String,
        stderr: String,
    },

    #[error("Build '{unit}': expected output {} is missing or empty", path.display())]
    OutputFileMissing { unit: String, path: PathBuf },
}

// ── Transfer errors ───────────────────────────────────────────────────────────

/// FTP transfer failures.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Local file not found: {}", .0.display())]
    LocalFileMissing(PathBuf),

    #[error("Cannot create or enter remote directory {path}: {reason}")]
    DirectoryUnavailable { path: String, reason: String },

    #[error("FTP server {address} unreachable: {reason}")]
    ConnectFailed { address: String, reason: String },

    #[error("FTP command '{command}' rejected: {code} {text}")]
    Rejected {
        command: String,
        code: u16,
        text: String,
    },

    #[error("FTP server sent a malformed reply: {0}")]
    MalformedReply(String),

    #[error("FTP connection timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("FTP I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Interactive-session failures. Variants raised mid-session carry the
/// output buffered up to the point of failure.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Telnet server {address} unreachable: {reason}")]
    ConnectFailed { address: String, reason: String },

    #[error("Timed out after {}s waiting for {expected}{}", waited.as_secs(), last_output(partial))]
    PatternTimeout {
        expected: String,
        waited: Duration,
        partial: String,
    },

    #[error("Script '{script}' did not finish within {}s{}", timeout.as_secs(), last_output(partial))]
    ExecutionTimeout {
        script: String,
        timeout: Duration,
        elapsed: Duration,
        partial: String,
    },

    #[error("Remote closed the connection while waiting for {expected}{}", last_output(partial))]
    StreamClosed { expected: String, partial: String },

    #[error("Session is already closed")]
    Closed,

    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Output captured before the failure, when the variant carries any.
    #[must_use]
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Self::PatternTimeout { partial, .. }
            | Self::ExecutionTimeout { partial, .. }
            | Self::StreamClosed { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Lines of received text shown in an error message.
const SHOWN_OUTPUT_LINES: usize = 3;

/// The last few non-blank lines of `partial`, as a message suffix.
fn last_output(partial: &str) -> String {
    let lines: Vec<&str> = partial
        .lines()
        .map(|l| l.trim_matches(|c: char| c.is_whitespace() || c.is_control()))
        .filter(|l| !l.is_empty())
        .collect();
    let shown = &lines[lines.len().saturating_sub(SHOWN_OUTPUT_LINES)..];
    if shown.is_empty() {
        String::new()
    } else {
        format!(" (last output: {})", shown.join(" | "))
    }
}
