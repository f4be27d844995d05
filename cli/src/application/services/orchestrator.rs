//! Application service — phase orchestration.
//!
//! Runs the requested phases in canonical order, halts at the first
//! failure, and persists run metrics when the execute phase produced any.

use std::time::{Duration, Instant};

use anyhow::Result;
use rtdeploy_common::{Phase, PhaseOutcome, PhaseResult, TargetProfile};

use crate::application::ports::{
    CommandRunner, LocalFs, MetricsStore, ProgressReporter, ShellConnector, TransferConnector,
};
use crate::application::services::build::build_all;
use crate::application::services::execute::execute_remote;
use crate::application::services::transfer::upload_all;
use crate::domain::RunReport;
use crate::domain::config::validate_for_phases;

/// The ports a run talks to.
pub struct RunPorts<'a, B, L, T, S, M> {
    pub runner: &'a B,
    pub fs: &'a L,
    pub transfer: &'a T,
    pub shell: &'a S,
    pub metrics: &'a M,
}

pub struct RunOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    /// Requested phases, in any order, possibly repeated.
    pub phases: &'a [Phase],
    /// Upper bound on each build command.
    pub build_timeout: Duration,
}

/// Run the requested phases against one target.
///
/// # Errors
///
/// Returns `InvalidConfiguration` before anything runs if the profile lacks
/// something a requested phase needs. Phase failures are not errors: they
/// are recorded in the returned report.
pub async fn run_phases<B, L, T, S, M>(
    ports: &RunPorts<'_, B, L, T, S, M>,
    profile: &TargetProfile,
    opts: RunOptions<'_, impl ProgressReporter>,
) -> Result<RunReport>
where
    B: CommandRunner,
    L: LocalFs,
    T: TransferConnector,
    S: ShellConnector,
    M: MetricsStore,
{
    let phases = Phase::normalize(opts.phases);
    validate_for_phases(profile, &phases)?;

    let reporter = opts.reporter;
    let started = Instant::now();
    let mut report = RunReport::new(&profile.name);
    let mut metrics = None;

    for (i, &phase) in phases.iter().enumerate() {
        reporter.step(&format!("{} ({phase})", capitalize(phase.description())));
        tracing::info!(target_name = %profile.name, %phase, "phase started");
        let phase_started = Instant::now();

        let (result, warnings) = match phase {
            Phase::Build => (
                build_all(ports.runner, ports.fs, reporter, &profile.builds, opts.build_timeout).await,
                Vec::new(),
            ),
            Phase::Transfer => match profile.ftp.as_ref() {
                Some(ftp) => {
                    match upload_all(ports.transfer, ports.fs, reporter, ftp, &profile.files_to_upload)
                        .await
                    {
                        Ok(warnings) => (Ok(()), warnings),
                        Err(e) => (Err(e), Vec::new()),
                    }
                }
                None => (Err(anyhow::anyhow!("no ftp section")), Vec::new()),
            },
            Phase::Execute => {
                let outcome = execute_remote(
                    ports.shell,
                    ports.transfer,
                    ports.metrics,
                    reporter,
                    profile,
                )
                .await;
                metrics = outcome.metrics;
                (outcome.result, outcome.warnings)
            }
        };

        let result = match result {
            Ok(()) => {
                tracing::info!(target_name = %profile.name, %phase, "phase succeeded");
                PhaseResult::Succeeded
            }
            Err(e) => {
                tracing::error!(target_name = %profile.name, %phase, "phase failed: {e:#}");
                PhaseResult::Failed {
                    reason: format!("{e:#}"),
                }
            }
        };
        let failed = !result.is_success();
        report.phases.push(PhaseOutcome {
            phase,
            result,
            warnings,
            duration_ms: millis(phase_started.elapsed()),
        });
        if failed {
            report.skipped = phases[i + 1..].to_vec();
            break;
        }
    }

    if let Some(metrics) = metrics {
        match ports.metrics.persist(&metrics).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "run metrics saved");
                report.metrics_path = Some(path);
            }
            Err(e) => {
                tracing::error!("could not save run metrics: {e:#}");
                reporter.warn(&format!("could not save run metrics: {e:#}"));
            }
        }
    }

    report.duration_ms = millis(started.elapsed());
    Ok(report)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
