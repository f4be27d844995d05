//! Run-metrics record persisted after the execute phase.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timing and captured output of one remote script run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub target: String,
    /// When the script finished (or was abandoned).
    pub timestamp: DateTime<Utc>,
    /// Seconds between sending the script command and seeing the prompt.
    pub execution_time: f64,
    /// Everything the script printed before the prompt came back.
    pub output: String,
    /// Local copy of the remote metrics file, if one was retrieved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_file: Option<PathBuf>,
    /// Set when the output is partial because the script hit its deadline.
    #[serde(default)]
    pub timed_out: bool,
}

impl RunMetrics {
    #[must_use]
    pub fn new(target: &str, elapsed: Duration, output: String) -> Self {
        Self {
            target: target.to_string(),
            timestamp: Utc::now(),
            execution_time: elapsed.as_secs_f64(),
            output,
            metrics_file: None,
            timed_out: false,
        }
    }

    /// Record for a script that did not finish before its deadline.
    #[must_use]
    pub fn partial(target: &str, elapsed: Duration, output: String) -> Self {
        Self {
            timed_out: true,
            ..Self::new(target, elapsed, output)
        }
    }
}
