//! `rtdeploy run` — build, transfer and execute against one target.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgGroup, Args};
use rtdeploy_common::Phase;

use crate::app::AppContext;
use crate::application::services::build::DEFAULT_BUILD_TIMEOUT;
use crate::application::services::orchestrator::{RunOptions, RunPorts, run_phases};
use crate::domain::config::select_target;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::HostFs;
use crate::infra::ftp::FtpConnector;
use crate::infra::metrics_store::JsonMetricsStore;
use crate::infra::telnet::TelnetConnector;
use crate::output::TerminalReporter;

/// Arguments for the run command.
#[derive(Args)]
#[command(group(
    ArgGroup::new("selection")
        .args(["steps", "build_only", "upload_only", "execute_only", "all"])
        .multiple(false)
))]
pub struct RunArgs {
    /// Target to deploy (default: `default_target` from the config)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Phases to run, comma-separated (build,transfer,execute)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub steps: Vec<Phase>,

    /// Only build
    #[arg(long)]
    pub build_only: bool,

    /// Only transfer files
    #[arg(long)]
    pub upload_only: bool,

    /// Only execute the remote script
    #[arg(long)]
    pub execute_only: bool,

    /// Run every phase (the default)
    #[arg(long)]
    pub all: bool,

    /// Directory for run-metrics records
    #[arg(long, default_value = ".")]
    pub metrics_dir: PathBuf,
}

impl RunArgs {
    /// Phases selected on the command line, in canonical order.
    #[must_use]
    pub fn phases(&self) -> Vec<Phase> {
        if self.build_only {
            vec![Phase::Build]
        } else if self.upload_only {
            vec![Phase::Transfer]
        } else if self.execute_only {
            vec![Phase::Execute]
        } else if self.steps.is_empty() {
            Phase::ALL.to_vec()
        } else {
            Phase::normalize(&self.steps)
        }
    }
}

/// Entry point for `rtdeploy run`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the target does
/// not exist, or the target lacks what a requested phase needs.
pub async fn run(app: &AppContext, args: &RunArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let profile = select_target(&config, args.target.as_deref(), &app.config_path)?;
    let phases = args.phases();
    tracing::info!(target_name = %profile.name, ?phases, "starting run");

    let reporter = TerminalReporter::new(&app.output);
    let store = JsonMetricsStore::new(&args.metrics_dir);
    let ports = RunPorts {
        runner: &TokioCommandRunner,
        fs: &HostFs,
        transfer: &FtpConnector,
        shell: &TelnetConnector,
        metrics: &store,
    };
    let report = run_phases(
        &ports,
        &profile,
        RunOptions {
            reporter: &reporter,
            phases: &phases,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
        },
    )
    .await?;

    app.renderer().render_run_report(&report)?;
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
