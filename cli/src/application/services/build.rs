//! Application service — local build phase.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::time::Duration;

use anyhow::{Context, Result};
use rtdeploy_common::BuildUnit;

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter};
use crate::domain::BuildError;

/// Upper bound on a single build command.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(3600);

/// Run every build unit in order, stopping at the first failure.
///
/// Each command runs with its source directory as the working directory.
/// The caller's working directory is restored after every unit and once
/// more when the phase ends, whatever the outcome.
///
/// # Errors
///
/// Returns the first `BuildError` raised, or an error if the command could
/// not be spawned or timed out.
pub async fn build_all(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    units: &[BuildUnit],
    timeout: Duration,
) -> Result<()> {
    // Entering "." changes nothing but restores the original directory on drop.
    let _restore = fs.enter_dir(std::path::Path::new("."))?;
    for (i, unit) in units.iter().enumerate() {
        reporter.step(&format!(
            "building {} ({}/{})...",
            unit.name,
            i + 1,
            units.len()
        ));
        build_unit(runner, fs, unit, timeout).await?;
        reporter.success(&format!("built {}", unit.name));
    }
    Ok(())
}

async fn build_unit(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    unit: &BuildUnit,
    timeout: Duration,
) -> Result<()> {
    let source = fs.absolute(&unit.source_directory)?;
    let output_dir = fs.absolute(&unit.output_directory)?;
    if !fs.is_dir(&source) {
        return Err(BuildError::SourceMissing {
            unit: unit.name.clone(),
            path: source,
        }
        .into());
    }
    fs.create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    tracing::info!(unit = %unit.name, dir = %source.display(), command = %unit.command, "running build");
    let output = {
        let _guard = fs.enter_dir(&source)?;
        runner
            .run_shell(&unit.command, timeout)
            .await
            .with_context(|| format!("build '{}'", unit.name))?
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        tracing::info!(unit = %unit.name, "build output:\n{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        tracing::warn!(unit = %unit.name, "build stderr:\n{}", stderr.trim_end());
    }
    if !output.status.success() {
        return Err(BuildError::CommandFailed {
            unit: unit.name.clone(),
            code: output
                .status
                .code()
                .map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string()),
            stderr: stderr.trim().to_string(),
        }
        .into());
    }

    for name in &unit.outputs {
        let path = output_dir.join(name);
        match fs.file_size(&path) {
            Some(size) if size > 0 => {
                tracing::info!(unit = %unit.name, file = %path.display(), size, "output verified");
            }
            _ => {
                return Err(BuildError::OutputFileMissing {
                    unit: unit.name.clone(),
                    path,
                }
                .into());
            }
        }
    }
    Ok(())
}
