//! `rtdeploy targets` — list configured targets.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::config::summarize_targets;

/// Entry point for `rtdeploy targets`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.load_config()?;
    let targets = summarize_targets(&config);
    app.renderer().render_targets(&targets)?;
    Ok(ExitCode::SUCCESS)
}
