//! Application service — remote execute phase.
//!
//! Connects the session driver, runs the script, optionally pulls the remote
//! metrics file, and hands back a `RunMetrics` record (partial on timeout).

use anyhow::Result;
use rtdeploy_common::{ExecutionSpec, RunMetrics, SessionEndpoint, TargetProfile};

use crate::application::ports::{
    MetricsStore, ProgressReporter, ShellConnector, TransferConnector,
};
use crate::application::services::session::RemoteShell;
use crate::application::services::transfer::download_file;
use crate::domain::config::{prompt_regex, working_directory};
use crate::domain::{ConfigError, SessionError};

/// What the execute phase produced.
#[derive(Debug)]
pub struct ExecuteOutcome {
    pub result: Result<()>,
    /// Present after a completed run, and after a timed-out one with
    /// `timed_out` set.
    pub metrics: Option<RunMetrics>,
    pub warnings: Vec<String>,
}

impl ExecuteOutcome {
    fn failed(err: impl Into<anyhow::Error>) -> Self {
        Self {
            result: Err(err.into()),
            metrics: None,
            warnings: Vec::new(),
        }
    }
}

struct ExecuteInputs<'a> {
    telnet: &'a SessionEndpoint,
    execution: &'a ExecutionSpec,
    directory: &'a str,
}

fn inputs(profile: &TargetProfile) -> Result<ExecuteInputs<'_>, ConfigError> {
    let missing = |what: &str| ConfigError::InvalidConfiguration {
        target: profile.name.clone(),
        reason: format!("execute requires {what}"),
    };
    Ok(ExecuteInputs {
        telnet: profile.telnet.as_ref().ok_or_else(|| missing("a telnet section"))?,
        execution: profile
            .execution
            .as_ref()
            .ok_or_else(|| missing("an execution section"))?,
        directory: working_directory(profile).ok_or_else(|| missing("a working directory"))?,
    })
}

/// Log in, run the configured script, and collect its output.
///
/// Never panics or returns early without an outcome: failures are reported
/// in `result`, and a script timeout still yields partial metrics.
pub async fn execute_remote(
    shell: &impl ShellConnector,
    transfer: &impl TransferConnector,
    store: &impl MetricsStore,
    reporter: &impl ProgressReporter,
    profile: &TargetProfile,
) -> ExecuteOutcome {
    let ExecuteInputs {
        telnet,
        execution,
        directory,
    } = match inputs(profile) {
        Ok(inputs) => inputs,
        Err(e) => return ExecuteOutcome::failed(e),
    };
    let prompt = match prompt_regex(profile, &telnet.prompt_pattern) {
        Ok(re) => re,
        Err(e) => return ExecuteOutcome::failed(e),
    };

    reporter.step(&format!("connecting to {} over telnet...", telnet.address()));
    let mut remote = match RemoteShell::connect(shell, telnet, prompt).await {
        Ok(remote) => remote,
        Err(e) => return ExecuteOutcome::failed(e),
    };

    let prepared = async {
        remote.login(telnet).await?;
        remote.change_dir(directory).await
    }
    .await;
    if let Err(e) = prepared {
        tracing::error!(target_name = %profile.name, state = %remote.state(), "session setup failed: {e}");
        log_received(&profile.name, &e);
        return ExecuteOutcome::failed(e);
    }
    reporter.success(&format!("logged in as {}", telnet.username));

    reporter.begin_wait(&format!(
        "running {} (timeout {}s)...",
        execution.script_name, execution.timeout_secs
    ));
    let run = remote
        .run_script(&execution.script_name, execution.timeout())
        .await;
    reporter.end_wait();

    let run = match run {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(target_name = %profile.name, state = %remote.state(), "script run failed: {e}");
            log_received(&profile.name, &e);
            let metrics = match &e {
                SessionError::ExecutionTimeout {
                    partial, elapsed, ..
                } => Some(RunMetrics::partial(&profile.name, *elapsed, partial.clone())),
                _ => None,
            };
            remote.abort();
            return ExecuteOutcome {
                result: Err(e.into()),
                metrics,
                warnings: Vec::new(),
            };
        }
    };
    reporter.success(&format!(
        "{} finished in {:.2}s",
        execution.script_name,
        run.elapsed.as_secs_f64()
    ));

    let mut warnings = Vec::new();
    let mut metrics = RunMetrics::new(&profile.name, run.elapsed, run.output);
    if let Some(remote_file) = &execution.metrics_file {
        match fetch_metrics_file(transfer, store, profile, remote_file, &metrics).await {
            Ok(path) => {
                reporter.success(&format!("metrics file saved to {}", path.display()));
                metrics.metrics_file = Some(path);
            }
            Err(e) => {
                let warning = format!("could not download {remote_file}: {e:#}");
                tracing::warn!("{warning}");
                reporter.warn(&warning);
                warnings.push(warning);
            }
        }
    }

    if let Some(warning) = remote.logout().await {
        tracing::warn!("{warning}");
        reporter.warn(&warning);
        warnings.push(warning);
    }

    ExecuteOutcome {
        result: Ok(()),
        metrics: Some(metrics),
        warnings,
    }
}

fn log_received(target_name: &str, err: &SessionError) {
    if let Some(partial) = err.partial_output().filter(|p| !p.trim().is_empty()) {
        tracing::warn!(target_name, "received before the failure:\n{}", partial.trim_end());
    }
}

async fn fetch_metrics_file(
    transfer: &impl TransferConnector,
    store: &impl MetricsStore,
    profile: &TargetProfile,
    remote_file: &str,
    metrics: &RunMetrics,
) -> Result<std::path::PathBuf> {
    let ftp = profile
        .ftp
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no ftp section to download with"))?;
    let local = store.reserve_artifact(&profile.name, metrics.timestamp).await?;
    download_file(transfer, ftp, remote_file, &local).await?;
    Ok(local)
}
