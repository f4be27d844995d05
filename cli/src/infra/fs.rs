//! Filesystem infrastructure — implements the `LocalFs` port on the host.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;

/// Host filesystem; `enter_dir` changes the real process working directory.
pub struct HostFs;

/// Puts the previous working directory back when dropped.
#[must_use = "the working directory is restored when the guard drops"]
pub struct CwdGuard {
    previous: PathBuf,
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                dir = %self.previous.display(),
                "could not restore working directory: {e}"
            );
        }
    }
}

impl LocalFs for HostFs {
    type DirGuard = CwdGuard;

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        std::path::absolute(path).with_context(|| format!("resolving {}", path.display()))
    }

    fn enter_dir(&self, dir: &Path) -> Result<CwdGuard> {
        let previous = std::env::current_dir().context("reading working directory")?;
        std::env::set_current_dir(dir)
            .with_context(|| format!("entering {}", dir.display()))?;
        Ok(CwdGuard { previous })
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path)
            .ok()
            .filter(std::fs::Metadata::is_file)
            .map(|m| m.len())
    }
}
