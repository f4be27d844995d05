//! Aggregate result of one orchestrated run.

use std::path::PathBuf;

use rtdeploy_common::{Phase, PhaseOutcome, PhaseResult};
use serde::Serialize;

/// Ordered phase outcomes plus what the run left behind.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: String,
    /// Phases that ran, in order. Stops at the first failure.
    pub phases: Vec<PhaseOutcome>,
    /// Requested phases that never ran because an earlier one failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Phase>,
    /// Where the run-metrics record was written, if one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            phases: Vec::new(),
            skipped: Vec::new(),
            metrics_path: None,
            duration_ms: 0,
        }
    }

    /// True when every phase that ran succeeded and none were skipped.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.skipped.is_empty() && self.phases.iter().all(|p| p.result.is_success())
    }

    /// The first failed phase and its reason.
    #[must_use]
    pub fn failure(&self) -> Option<(Phase, &str)> {
        self.phases.iter().find_map(|p| match &p.result {
            PhaseResult::Failed { reason } => Some((p.phase, reason.as_str())),
            PhaseResult::Succeeded => None,
        })
    }

    /// Every warning raised, prefixed with its phase.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.phases
            .iter()
            .flat_map(|p| p.warnings.iter().map(move |w| format!("{}: {w}", p.phase)))
            .collect()
    }
}
