//! Shared types for rtdeploy.
//!
//! Target profiles as they appear in the configuration file, the workflow
//! phases, and the run-metrics record written after a successful execute
//! phase.

pub mod metrics;
pub mod phase;
pub mod target;

pub use metrics::RunMetrics;
pub use phase::{Phase, PhaseOutcome, PhaseResult};
pub use target::{
    BuildUnit, DeployConfig, ExecutionSpec, FileTransferSpec, SessionEndpoint, TargetProfile,
    TransferEndpoint,
};
