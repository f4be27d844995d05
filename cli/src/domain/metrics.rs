//! Counters extracted from captured script output, and metrics file naming.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rtdeploy_common::RunMetrics;
use serde::Serialize;

const MESSAGES_SENT: &str = "Messages sent:";
const MESSAGES_RECEIVED: &str = "Messages received:";
const SERVER_LINES: &str = "Server log lines:";
const CLIENT_LINES: &str = "Client log lines:";

/// Values the test programs print at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputCounters {
    pub messages_sent: u64,
    pub messages_received: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_lines: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_lines: Option<u64>,
}

/// Scan output line by line for the known counter labels.
///
/// A later occurrence of a label overrides an earlier one. Lines whose
/// value does not parse as an integer are ignored.
#[must_use]
pub fn parse_output(output: &str) -> OutputCounters {
    let mut counters = OutputCounters::default();
    for line in output.lines() {
        if let Some(n) = value_after(line, MESSAGES_SENT) {
            counters.messages_sent = n;
        }
        if let Some(n) = value_after(line, MESSAGES_RECEIVED) {
            counters.messages_received = n;
        }
        if let Some(n) = value_after(line, SERVER_LINES) {
            counters.server_lines = Some(n);
        }
        if let Some(n) = value_after(line, CLIENT_LINES) {
            counters.client_lines = Some(n);
        }
    }
    counters
}

/// One stored record, reduced to the values worth comparing across runs.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub file: PathBuf,
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub execution_time: f64,
    pub timed_out: bool,
    #[serde(flatten)]
    pub counters: OutputCounters,
}

impl MetricsSummary {
    #[must_use]
    pub fn new(file: PathBuf, metrics: &RunMetrics) -> Self {
        Self {
            file,
            target: metrics.target.clone(),
            timestamp: metrics.timestamp,
            execution_time: metrics.execution_time,
            timed_out: metrics.timed_out,
            counters: parse_output(&metrics.output),
        }
    }
}

fn value_after(line: &str, label: &str) -> Option<u64> {
    let (_, rest) = line.split_once(label)?;
    let rest = rest.trim();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    digits.parse().ok()
}

/// Replace anything outside `[A-Za-z0-9_.-]` so a target name is safe in a
/// file name.
#[must_use]
pub fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `metrics_<target>_<YYYYmmdd_HHMMSS>[_<n>].<ext>`; `attempt` 0 has no suffix.
#[must_use]
pub fn metrics_file_name(target: &str, at: DateTime<Utc>, attempt: u32, ext: &str) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    let target = file_safe(target);
    if attempt == 0 {
        format!("metrics_{target}_{stamp}.{ext}")
    } else {
        format!("metrics_{target}_{stamp}_{attempt}.{ext}")
    }
}

/// Whether a file name looks like a persisted metrics record.
#[must_use]
pub fn is_metrics_record(file_name: &str) -> bool {
    file_name.starts_with("metrics_")
        && std::path::Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
