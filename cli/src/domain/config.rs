//! Target selection and pre-flight validation.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::Path;

use regex::bytes::Regex;
use rtdeploy_common::target::FALLBACK_TARGET;
use rtdeploy_common::{DeployConfig, Phase, TargetProfile};
use serde::Serialize;

use crate::domain::error::ConfigError;

// ── Target selection ─────────────────────────────────────────────────────────

/// Pick the target a run applies to.
///
/// Order: the explicit name, then `default_target`, then the only target
/// when there is exactly one, then `target1` if defined.
///
/// # Errors
///
/// Returns an error if the file has no targets or the chosen name is not
/// one of them.
pub fn select_target(
    config: &DeployConfig,
    requested: Option<&str>,
    source: &Path,
) -> Result<TargetProfile, ConfigError> {
    if config.targets.is_empty() {
        return Err(ConfigError::NoTargets(source.to_path_buf()));
    }
    let names = config.target_names();
    let chosen = match (requested, config.default_target.as_deref()) {
        (Some(name), _) | (None, Some(name)) => name,
        (None, None) if names.len() == 1 => names[0],
        (None, None) => FALLBACK_TARGET,
    };
    config
        .target(chosen)
        .ok_or_else(|| ConfigError::UnknownTarget {
            requested: chosen.to_string(),
            available: names.join(", "),
        })
}

// ── Target listing ───────────────────────────────────────────────────────────

/// How many build names a listing shows per target.
const LISTED_BUILDS: usize = 3;

/// One line of the target listing.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    pub name: String,
    pub description: Option<String>,
    pub telnet_host: Option<String>,
    pub build_count: usize,
    /// The first few build names.
    pub builds: Vec<String>,
    pub is_default: bool,
}

/// Summaries of every configured target, in name order.
#[must_use]
pub fn summarize_targets(config: &DeployConfig) -> Vec<TargetSummary> {
    config
        .targets
        .iter()
        .map(|(name, profile)| TargetSummary {
            name: name.clone(),
            description: profile.description.clone(),
            telnet_host: profile.telnet.as_ref().map(|t| t.host.clone()),
            build_count: profile.builds.len(),
            builds: profile
                .builds
                .iter()
                .take(LISTED_BUILDS)
                .map(|b| b.name.clone())
                .collect(),
            is_default: config.default_target.as_deref() == Some(name.as_str()),
        })
        .collect()
}

// ── Pre-flight validation ────────────────────────────────────────────────────

/// Check that the profile has everything the requested phases need.
///
/// Sections belonging to phases that were not requested are never looked
/// at. All problems are reported together.
///
/// # Errors
///
/// Returns `InvalidConfiguration` listing every problem found.
pub fn validate_for_phases(profile: &TargetProfile, phases: &[Phase]) -> Result<(), ConfigError> {
    let mut problems = Vec::new();
    for phase in phases {
        match phase {
            Phase::Build => check_build(profile, &mut problems),
            Phase::Transfer => check_transfer(profile, &mut problems),
            Phase::Execute => check_execute(profile, &mut problems),
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfiguration {
            target: profile.name.clone(),
            reason: problems.join("; "),
        })
    }
}

/// Remote directory the script runs in: the session override, else the
/// FTP upload directory.
#[must_use]
pub fn working_directory(profile: &TargetProfile) -> Option<&str> {
    profile
        .telnet
        .as_ref()
        .and_then(|t| t.directory.as_deref())
        .filter(|dir| !dir.is_empty())
        .or_else(|| {
            profile
                .ftp
                .as_ref()
                .map(|f| f.target_directory.as_str())
                .filter(|dir| !dir.is_empty())
        })
}

/// Compile the configured prompt pattern.
///
/// # Errors
///
/// Returns `InvalidConfiguration` if the pattern is not a valid expression.
pub fn prompt_regex(profile: &TargetProfile, pattern: &str) -> Result<Regex, ConfigError> {
    compile_prompt(pattern).map_err(|reason| ConfigError::InvalidConfiguration {
        target: profile.name.clone(),
        reason,
    })
}

fn compile_prompt(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("prompt_pattern '{pattern}' does not compile: {e}"))
}

fn check_build(profile: &TargetProfile, problems: &mut Vec<String>) {
    if profile.builds.is_empty() {
        problems.push("build requested but no builds are configured".to_string());
    }
    for unit in &profile.builds {
        if unit.command.trim().is_empty() {
            problems.push(format!("build '{}' has no command", unit.name));
        }
    }
}

fn check_transfer(profile: &TargetProfile, problems: &mut Vec<String>) {
    match &profile.ftp {
        None => problems.push("transfer requested but no ftp section is configured".to_string()),
        Some(ftp) => {
            if ftp.host.is_empty() {
                problems.push("ftp.host is empty".to_string());
            }
            if ftp.username.is_empty() {
                problems.push("ftp.username is empty".to_string());
            }
            if ftp.target_directory.is_empty() {
                problems.push("ftp.target_directory is empty".to_string());
            } else if !ftp.target_directory.starts_with('/') {
                problems.push(format!(
                    "ftp.target_directory '{}' must be absolute",
                    ftp.target_directory
                ));
            }
        }
    }
    if profile.files_to_upload.is_empty() {
        problems.push("transfer requested but files_to_upload is empty".to_string());
    }
    for file in &profile.files_to_upload {
        if file.local.as_os_str().is_empty() {
            problems.push(format!("upload to '{}' has no local path", file.remote));
        }
        if file.remote.is_empty() {
            problems.push(format!("{} has no remote path", file.local.display()));
        }
    }
}

fn check_execute(profile: &TargetProfile, problems: &mut Vec<String>) {
    match &profile.telnet {
        None => problems.push("execute requested but no telnet section is configured".to_string()),
        Some(telnet) => {
            if telnet.host.is_empty() {
                problems.push("telnet.host is empty".to_string());
            }
            if telnet.username.is_empty() {
                problems.push("telnet.username is empty".to_string());
            }
            if let Err(reason) = compile_prompt(&telnet.prompt_pattern) {
                problems.push(reason);
            }
        }
    }
    match &profile.execution {
        None => {
            problems.push("execute requested but no execution section is configured".to_string());
        }
        Some(execution) => {
            if execution.script_name.trim().is_empty() {
                problems.push("execution.script_name is empty".to_string());
            }
            if execution.metrics_file.is_some() && profile.ftp.is_none() {
                problems.push("execution.metrics_file needs an ftp section to download it".to_string());
            }
        }
    }
    if working_directory(profile).is_none() {
        problems.push(
            "execute needs telnet.directory or ftp.target_directory as its working directory"
                .to_string(),
        );
    }
}
