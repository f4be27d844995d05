//! Loading the deployment configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use rtdeploy_common::DeployConfig;

/// Read a JSON or YAML configuration file, chosen by extension.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML; anything else as
/// JSON.
pub fn load_config(path: &Path) -> Result<DeployConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration file {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let config: DeployConfig = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?
    };
    Ok(config)
}
