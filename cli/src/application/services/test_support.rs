//! Shared test doubles for application service tests.
//!
//! Hand-written recording fakes for every port, plus cross-platform
//! `exit_status()` helpers for building `std::process::Output` values.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::bytes::Regex;
use rtdeploy_common::{RunMetrics, SessionEndpoint, TransferEndpoint};

use crate::application::ports::{
    LocalFs, MetricsStore, ProgressReporter, ShellConnector, ShellSession, TransferClient,
    TransferConnector,
};
use crate::domain::expect::describe;
use crate::domain::{
    ExpectBuffer, PatternMatch, SessionError, SizeCheck, TransferError, UploadReport,
};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> std::process::Output {
    std::process::Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn fail_output() -> std::process::Output {
    std::process::Output {
        status: exit_status(2),
        stdout: Vec::new(),
        stderr: b"make: *** [all] Error 2".to_vec(),
    }
}

/// Shared, ordered log of port calls across several fakes.
pub type CallLog = Rc<RefCell<Vec<String>>>;

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    fn of(&self, kind: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.of("success")
    }

    pub fn warnings(&self) -> Vec<String> {
        self.of("warn")
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(("step", message.to_string()));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(("success", message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(("warn", message.to_string()));
    }
    fn begin_wait(&self, message: &str) {
        self.events.borrow_mut().push(("wait", message.to_string()));
    }
    fn end_wait(&self) {
        self.events.borrow_mut().push(("done", String::new()));
    }
}

// ── Filesystem ────────────────────────────────────────────────────────────────

struct FsState {
    cwd: PathBuf,
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, u64>,
}

/// In-memory filesystem with its own working directory.
pub struct MemoryFs {
    state: Rc<RefCell<FsState>>,
}

pub struct MemoryDirGuard {
    state: Rc<RefCell<FsState>>,
    previous: PathBuf,
}

impl Drop for MemoryDirGuard {
    fn drop(&mut self) {
        self.state.borrow_mut().cwd = self.previous.clone();
    }
}

impl MemoryFs {
    pub fn new(cwd: &str) -> Self {
        let fs = Self {
            state: Rc::new(RefCell::new(FsState {
                cwd: PathBuf::from(cwd),
                dirs: BTreeSet::new(),
                files: BTreeMap::new(),
            })),
        };
        fs.add_dir(cwd);
        fs
    }

    pub fn add_dir(&self, path: &str) {
        let path = PathBuf::from(path);
        let mut state = self.state.borrow_mut();
        for ancestor in path.ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    pub fn add_file(&self, path: &str, size: u64) {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent().and_then(Path::to_str) {
            self.add_dir(parent);
        }
        self.state.borrow_mut().files.insert(path, size);
    }

    pub fn cwd(&self) -> PathBuf {
        self.state.borrow().cwd.clone()
    }

    pub fn dir_exists(&self, path: &str) -> bool {
        self.state.borrow().dirs.contains(Path::new(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd().join(path)
        };
        joined
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
}

impl LocalFs for MemoryFs {
    type DirGuard = MemoryDirGuard;

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.resolve(path))
    }

    fn enter_dir(&self, dir: &Path) -> Result<MemoryDirGuard> {
        let target = self.resolve(dir);
        if !self.is_dir(&target) {
            anyhow::bail!("no such directory: {}", target.display());
        }
        let previous = std::mem::replace(&mut self.state.borrow_mut().cwd, target);
        Ok(MemoryDirGuard {
            state: Rc::clone(&self.state),
            previous,
        })
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state.borrow().dirs.contains(&self.resolve(path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let resolved = self.resolve(path);
        let mut state = self.state.borrow_mut();
        for ancestor in resolved.ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        self.state.borrow().files.get(&self.resolve(path)).copied()
    }
}

// ── Transfer ──────────────────────────────────────────────────────────────────

/// Fake FTP connector. Every client shares the same remote state and log.
#[derive(Clone, Default)]
pub struct FakeTransfer {
    pub log: CallLog,
    pub remote_dirs: Rc<RefCell<BTreeSet<String>>>,
    /// Remote size reported after upload; `None` reports the local size.
    pub truncate_to: Option<u64>,
    pub fail_connect: bool,
    pub fail_download: bool,
    /// Local size used for uploads, keyed by local path.
    pub local_sizes: Rc<RefCell<BTreeMap<PathBuf, u64>>>,
}

pub struct FakeTransferClient {
    inner: FakeTransfer,
}

impl TransferConnector for FakeTransfer {
    type Client = FakeTransferClient;

    async fn connect(&self, endpoint: &TransferEndpoint) -> Result<FakeTransferClient, TransferError> {
        self.log.borrow_mut().push(format!("ftp connect {}", endpoint.address()));
        if self.fail_connect {
            return Err(TransferError::ConnectFailed {
                address: endpoint.address(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(FakeTransferClient {
            inner: self.clone(),
        })
    }
}

impl TransferClient for FakeTransferClient {
    async fn ensure_remote_directory(&mut self, path: &str) -> Result<(), TransferError> {
        self.inner.log.borrow_mut().push(format!("ftp ensure {path}"));
        self.inner.remote_dirs.borrow_mut().insert(path.to_string());
        Ok(())
    }

    async fn change_directory(&mut self, path: &str) -> Result<(), TransferError> {
        self.inner.log.borrow_mut().push(format!("ftp cwd {path}"));
        Ok(())
    }

    async fn upload(&mut self, local: &Path, remote: &str) -> Result<UploadReport, TransferError> {
        self.inner
            .log
            .borrow_mut()
            .push(format!("ftp upload {} {remote}", local.display()));
        let local_size = self
            .inner
            .local_sizes
            .borrow()
            .get(local)
            .copied()
            .ok_or_else(|| TransferError::LocalFileMissing(local.to_path_buf()))?;
        let remote_size = self.inner.truncate_to.unwrap_or(local_size);
        Ok(UploadReport {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            bytes_sent: remote_size,
            check: SizeCheck::compare(local_size, Some(remote_size)),
        })
    }

    async fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError> {
        self.inner
            .log
            .borrow_mut()
            .push(format!("ftp download {remote} {}", local.display()));
        if self.inner.fail_download {
            return Err(TransferError::Rejected {
                command: format!("RETR {remote}"),
                code: 550,
                text: "No such file".to_string(),
            });
        }
        Ok(42)
    }

    async fn quit(self) -> Result<(), TransferError> {
        self.inner.log.borrow_mut().push("ftp quit".to_string());
        Ok(())
    }
}

// ── Interactive session ───────────────────────────────────────────────────────

/// One scripted remote reaction: once `on` is sent, `reply` is queued.
pub struct Exchange {
    pub on: &'static str,
    pub reply: &'static str,
}

/// Fake telnet connector replaying a fixed conversation.
#[derive(Clone, Default)]
pub struct FakeShell {
    pub log: CallLog,
    pub banner: &'static str,
    pub exchanges: Rc<Vec<Exchange>>,
    /// Hang up after replying to `exit`.
    pub hangs_up: bool,
}

pub struct FakeShellSession {
    log: CallLog,
    buffer: ExpectBuffer,
    queued: VecDeque<&'static str>,
    exchanges: Rc<Vec<Exchange>>,
    hangs_up: bool,
    closed: bool,
}

impl ShellConnector for FakeShell {
    type Session = FakeShellSession;

    async fn connect(&self, endpoint: &SessionEndpoint) -> Result<FakeShellSession, SessionError> {
        self.log.borrow_mut().push(format!("telnet connect {}", endpoint.address()));
        Ok(FakeShellSession {
            log: Rc::clone(&self.log),
            buffer: ExpectBuffer::new(),
            queued: VecDeque::from([self.banner]),
            exchanges: Rc::clone(&self.exchanges),
            hangs_up: self.hangs_up,
            closed: false,
        })
    }
}

impl ShellSession for FakeShellSession {
    async fn send_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.log.borrow_mut().push(format!("send {line}"));
        if let Some(ex) = self.exchanges.iter().find(|ex| ex.on == line) {
            self.queued.push_back(ex.reply);
        }
        if line == "exit" && self.hangs_up {
            self.closed = true;
        }
        Ok(())
    }

    async fn expect(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> Result<PatternMatch, SessionError> {
        loop {
            if let Some(m) = self.buffer.find(patterns) {
                return Ok(m);
            }
            match self.queued.pop_front() {
                Some(chunk) => self.buffer.extend(chunk.as_bytes()),
                None => {
                    return Err(SessionError::PatternTimeout {
                        expected: describe(patterns),
                        waited: timeout,
                        partial: self.buffer.pending(),
                    });
                }
            }
        }
    }

    async fn expect_eof(&mut self, timeout: Duration) -> Result<String, SessionError> {
        while let Some(chunk) = self.queued.pop_front() {
            self.buffer.extend(chunk.as_bytes());
        }
        if self.closed {
            Ok(self.buffer.take())
        } else {
            Err(SessionError::PatternTimeout {
                expected: "end of stream".to_string(),
                waited: timeout,
                partial: self.buffer.pending(),
            })
        }
    }

    async fn close(self) {
        self.log.borrow_mut().push("telnet close".to_string());
    }
}

// ── Metrics store ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryMetricsStore {
    pub log: CallLog,
    pub saved: RefCell<Vec<RunMetrics>>,
}

impl MetricsStore for MemoryMetricsStore {
    async fn reserve_artifact(&self, target: &str, at: DateTime<Utc>) -> Result<PathBuf> {
        self.log.borrow_mut().push("metrics reserve".to_string());
        Ok(PathBuf::from(crate::domain::metrics::metrics_file_name(
            target, at, 0, "txt",
        )))
    }

    async fn persist(&self, metrics: &RunMetrics) -> Result<PathBuf> {
        self.log.borrow_mut().push("metrics persist".to_string());
        self.saved.borrow_mut().push(metrics.clone());
        Ok(PathBuf::from(crate::domain::metrics::metrics_file_name(
            &metrics.target,
            metrics.timestamp,
            0,
            "json",
        )))
    }
}
