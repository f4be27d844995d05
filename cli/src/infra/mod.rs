//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, the FTP and telnet clients, configuration loading, and logging.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod fs;
pub mod ftp;
pub mod logging;
pub mod metrics_store;
pub mod session;
pub mod telnet;
