//! Command implementations

pub mod metrics;
pub mod run;
pub mod targets;
