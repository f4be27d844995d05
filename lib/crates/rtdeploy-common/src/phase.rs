//! Workflow phases and their per-run outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three workflow phases, ordered build < transfer < execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Run the local build units.
    Build,
    /// Upload files to the target over FTP.
    #[serde(alias = "upload")]
    #[cfg_attr(feature = "clap", value(alias = "upload"))]
    Transfer,
    /// Run the remote script over telnet.
    Execute,
}

impl Phase {
    /// Every phase, in canonical order.
    pub const ALL: [Phase; 3] = [Phase::Build, Phase::Transfer, Phase::Execute];

    /// Lowercase name as used on the command line and in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Transfer => "transfer",
            Self::Execute => "execute",
        }
    }

    /// Human-readable description of what the phase does.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Build => "building artifacts",
            Self::Transfer => "transferring files",
            Self::Execute => "executing remote script",
        }
    }

    /// Sort into canonical order and drop duplicates.
    #[must_use]
    pub fn normalize(requested: &[Phase]) -> Vec<Phase> {
        let mut phases = requested.to_vec();
        phases.sort_unstable();
        phases.dedup();
        phases
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseResult {
    Succeeded,
    Failed { reason: String },
}

impl PhaseResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// A phase that ran, how it ended, and any non-fatal warnings it raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    #[serde(flatten)]
    pub result: PhaseResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Wall-clock time spent in the phase, in milliseconds.
    pub duration_ms: u64,
}
