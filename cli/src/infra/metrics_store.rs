//! Run-metrics records on the local filesystem.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rtdeploy_common::RunMetrics;

use crate::application::ports::MetricsStore;
use crate::domain::metrics::{is_metrics_record, metrics_file_name};

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Stores records as pretty-printed JSON files in one directory.
pub struct JsonMetricsStore {
    dir: PathBuf,
}

impl JsonMetricsStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record files in the directory, sorted by name (oldest first).
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("cannot read metrics directory {}", self.dir.display()))?;
        let mut records: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_metrics_record)
            })
            .collect();
        records.sort();
        Ok(records)
    }

    /// The most recent record by file name.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.pop())
    }

    /// Read one record.
    pub fn load(path: &Path) -> Result<RunMetrics> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }
}

impl MetricsStore for JsonMetricsStore {
    async fn reserve_artifact(&self, target: &str, at: DateTime<Utc>) -> Result<PathBuf> {
        let dir = self.dir.clone();
        let target = target.to_string();
        tokio::task::spawn_blocking(move || {
            create_new(&dir, &target, at, "txt").map(|(path, _)| path)
        })
        .await
        .context("spawn_blocking for metrics artifact")?
    }

    async fn persist(&self, metrics: &RunMetrics) -> Result<PathBuf> {
        let content =
            serde_json::to_string_pretty(metrics).context("cannot serialize run metrics")?;
        let dir = self.dir.clone();
        let target = metrics.target.clone();
        let at = metrics.timestamp;
        tokio::task::spawn_blocking(move || {
            let (path, mut file) = create_new(&dir, &target, at, "json")?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("cannot write {}", path.display()))?;
            Ok(path)
        })
        .await
        .context("spawn_blocking for metrics persist")?
    }
}

/// Create a file under the first free name; never replaces an existing file.
fn create_new(
    dir: &Path,
    target: &str,
    at: DateTime<Utc>,
    extension: &str,
) -> Result<(PathBuf, std::fs::File)> {
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(metrics_file_name(target, at, attempt, extension));
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("cannot create {}", path.display()));
            }
        }
    }
    anyhow::bail!(
        "no free metrics file name for target '{target}' in {}",
        dir.display()
    )
}
