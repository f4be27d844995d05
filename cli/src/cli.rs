//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;
use crate::infra::logging::LogLevel;

/// Build, upload and run benchmark scripts on remote test machines
#[derive(Parser)]
#[command(
    name = "rtdeploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file (JSON, or YAML by extension)
    #[arg(short, long, global = true, env = "RTDEPLOY_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Log phase progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log the remote session transcript to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build, transfer and execute against one target
    Run(commands::run::RunArgs),

    /// List configured targets
    Targets,

    /// Show values extracted from stored run metrics
    Metrics(commands::metrics::MetricsArgs),
}

impl Cli {
    /// Logging verbosity from `--verbose` / `--debug`.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else if self.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be used or the command
    /// cannot start. A run whose phases fail returns `ExitCode::FAILURE`.
    pub async fn run(self) -> Result<ExitCode> {
        let log_level = self.log_level();
        let Cli {
            config,
            json,
            quiet,
            no_color,
            command,
            ..
        } = self;
        let app = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            config,
            log_level,
        });
        match command {
            Command::Run(args) => commands::run::run(&app, &args).await,
            Command::Targets => commands::targets::run(&app),
            Command::Metrics(args) => commands::metrics::run(&app, &args),
        }
    }
}
