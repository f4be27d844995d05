//! Upload verification results.

use std::path::PathBuf;

/// How the remote size compared with the local size after an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    Match,
    Mismatch { local: u64, remote: u64 },
    /// The server could not report a size.
    Unknown,
}

impl SizeCheck {
    #[must_use]
    pub fn compare(local: u64, remote: Option<u64>) -> Self {
        match remote {
            Some(remote) if remote == local => Self::Match,
            Some(remote) => Self::Mismatch { local, remote },
            None => Self::Unknown,
        }
    }
}

/// Outcome of one verified upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub local: PathBuf,
    pub remote: String,
    pub bytes_sent: u64,
    pub check: SizeCheck,
}

impl UploadReport {
    /// Warning text for the run report, if the size check was not clean.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self.check {
            SizeCheck::Match => None,
            SizeCheck::Mismatch { local, remote } => Some(format!(
                "size mismatch for {}: local {local} bytes, remote {remote} bytes",
                self.remote
            )),
            SizeCheck::Unknown => Some(format!(
                "could not verify size of {}: server did not report it",
                self.remote
            )),
        }
    }
}
