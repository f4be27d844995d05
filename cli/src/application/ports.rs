//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::bytes::Regex;
use rtdeploy_common::{RunMetrics, SessionEndpoint, TransferEndpoint};

use crate::domain::{PatternMatch, SessionError, TransferError, UploadReport};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with a timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;

    /// Run a shell command line in the current working directory.
    async fn run_shell(&self, command: &str, timeout: Duration) -> Result<Output> {
        self.run_with_timeout("sh", &["-c", command], timeout).await
    }
}

// ── Local Filesystem Port ─────────────────────────────────────────────────────

/// Local filesystem and working-directory access.
pub trait LocalFs {
    /// Restores the previous working directory when dropped.
    type DirGuard;

    /// Resolve `path` against the current working directory.
    fn absolute(&self, path: &Path) -> Result<PathBuf>;
    /// Make `dir` the process working directory until the guard drops.
    fn enter_dir(&self, dir: &Path) -> Result<Self::DirGuard>;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Size of a regular file, or `None` if it does not exist.
    fn file_size(&self, path: &Path) -> Option<u64>;
}

// ── Transfer Ports ────────────────────────────────────────────────────────────

/// Opens authenticated file-transfer connections.
#[allow(async_fn_in_trait)]
pub trait TransferConnector {
    type Client: TransferClient;

    /// Connect and log in.
    async fn connect(&self, endpoint: &TransferEndpoint) -> Result<Self::Client, TransferError>;
}

/// One logged-in file-transfer connection.
#[allow(async_fn_in_trait)]
pub trait TransferClient {
    /// Enter `path`, creating it first if it does not exist.
    async fn ensure_remote_directory(&mut self, path: &str) -> Result<(), TransferError>;
    /// Change into an existing remote directory.
    async fn change_directory(&mut self, path: &str) -> Result<(), TransferError>;
    /// Upload in binary mode and compare the remote size with the local one.
    async fn upload(&mut self, local: &Path, remote: &str) -> Result<UploadReport, TransferError>;
    /// Download in binary mode, returning the number of bytes written.
    async fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError>;
    /// Log out and close the connection.
    async fn quit(self) -> Result<(), TransferError>
    where
        Self: Sized;
}

// ── Interactive Session Ports ─────────────────────────────────────────────────

/// Opens interactive remote-shell connections.
#[allow(async_fn_in_trait)]
pub trait ShellConnector {
    type Session: ShellSession;

    async fn connect(&self, endpoint: &SessionEndpoint) -> Result<Self::Session, SessionError>;
}

/// A live line-oriented session with expect-style waits.
#[allow(async_fn_in_trait)]
pub trait ShellSession {
    /// Send one line; the implementation appends the line terminator.
    async fn send_line(&mut self, line: &str) -> Result<(), SessionError>;

    /// Wait until one of `patterns` appears in the incoming stream.
    ///
    /// # Errors
    ///
    /// `PatternTimeout` if nothing matched within `timeout`, `StreamClosed`
    /// if the remote hung up first. Both carry the unconsumed buffer.
    async fn expect(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> Result<PatternMatch, SessionError>;

    /// Wait for the remote to close the stream, returning whatever it sent.
    async fn expect_eof(&mut self, timeout: Duration) -> Result<String, SessionError>;

    /// Shut down the connection cleanly.
    async fn close(self)
    where
        Self: Sized;
}

// ── Metrics Store Port ────────────────────────────────────────────────────────

/// Where run-metrics records and downloaded artifacts are kept.
#[allow(async_fn_in_trait)]
pub trait MetricsStore {
    /// Claim a fresh local path for a metrics artifact downloaded from
    /// `target`. The path is never one an earlier run already used.
    async fn reserve_artifact(&self, target: &str, at: DateTime<Utc>) -> Result<PathBuf>;
    /// Write the record under a fresh name and return its path.
    async fn persist(&self, metrics: &RunMetrics) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Show an indeterminate indicator while a long wait is in progress.
    fn begin_wait(&self, message: &str);
    /// Clear the indicator started by `begin_wait`.
    fn end_wait(&self);
}
