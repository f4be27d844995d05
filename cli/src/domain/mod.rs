//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod expect;
pub mod metrics;
pub mod run;
pub mod session;
pub mod transfer;

pub use error::{BuildError, ConfigError, SessionError, TransferError};
pub use expect::{ExpectBuffer, PatternMatch};
pub use run::RunReport;
pub use session::SessionState;
pub use transfer::{SizeCheck, UploadReport};
