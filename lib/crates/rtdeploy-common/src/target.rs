//! Target profiles as read from the deployment configuration file.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;
/// Default telnet port.
pub const DEFAULT_TELNET_PORT: u16 = 23;
/// Default connection timeout for both endpoints, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Default deadline for the remote script, in seconds.
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 60;
/// Default shell prompt pattern.
pub const DEFAULT_PROMPT_PATTERN: &str = "[$#>]";
/// Target selected when the file names no default and holds several targets.
pub const FALLBACK_TARGET: &str = "target1";

/// Top-level configuration file: a map of named targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Named target profiles, keyed by target name.
    #[serde(default)]
    pub targets: BTreeMap<String, TargetProfile>,
    /// Target used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
    /// Turns on debug logging, same as `--debug`.
    #[serde(default)]
    pub debug: bool,
}

impl DeployConfig {
    /// Look up a target by name, returning a profile whose `name` is filled in.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<TargetProfile> {
        self.targets.get(name).map(|profile| TargetProfile {
            name: name.to_string(),
            ..profile.clone()
        })
    }

    /// Names of all configured targets, in sorted order.
    #[must_use]
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }
}

/// Everything needed to deploy to and run on one remote target.
///
/// Every section is optional when loading. Which sections a run needs is
/// decided by the phases it requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Target name; the key under `targets` in the configuration file.
    #[serde(skip)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Build units, run in declaration order. `build` holding a single
    /// object is accepted as a list of one.
    #[serde(
        default,
        alias = "build",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub builds: Vec<BuildUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftp: Option<TransferEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telnet: Option<SessionEndpoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_to_upload: Vec<FileTransferSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionSpec>,
}

/// One local build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnit {
    #[serde(default = "default_build_name")]
    pub name: String,
    #[serde(default = "current_dir")]
    pub source_directory: PathBuf,
    #[serde(default = "current_dir")]
    pub output_directory: PathBuf,
    /// Shell command line, run from `source_directory`.
    #[serde(default)]
    pub command: String,
    /// Files expected in `output_directory` once the command succeeds.
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// FTP service on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEndpoint {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Absolute remote directory uploads land in.
    #[serde(default)]
    pub target_directory: String,
    #[serde(default = "default_connect_timeout", rename = "timeout")]
    pub timeout_secs: u64,
}

impl TransferEndpoint {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `host:port` form used for connecting and logging.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Telnet service on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEndpoint {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_telnet_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Regular expression matching the remote shell prompt.
    #[serde(default = "default_prompt_pattern")]
    pub prompt_pattern: String,
    #[serde(default = "default_connect_timeout", rename = "timeout")]
    pub timeout_secs: u64,
    /// Remote working directory; the FTP target directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl SessionEndpoint {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A local file and the remote path it is uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransferSpec {
    #[serde(default)]
    pub local: PathBuf,
    #[serde(default)]
    pub remote: String,
}

/// The remote script and what to collect after it finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSpec {
    /// Script name, run as `./<script_name>` in the working directory.
    #[serde(default)]
    pub script_name: String,
    #[serde(default = "default_execution_timeout", rename = "timeout")]
    pub timeout_secs: u64,
    /// Remote file downloaded after the script completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_file: Option<String>,
}

impl ExecutionSpec {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_build_name() -> String {
    "unnamed".to_string()
}

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_ftp_port() -> u16 {
    DEFAULT_FTP_PORT
}

fn default_telnet_port() -> u16 {
    DEFAULT_TELNET_PORT
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_execution_timeout() -> u64 {
    DEFAULT_EXECUTION_TIMEOUT_SECS
}

fn default_prompt_pattern() -> String {
    DEFAULT_PROMPT_PATTERN.to_string()
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<BuildUnit>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<BuildUnit>),
        One(BuildUnit),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(unit) => vec![unit],
        OneOrMany::Many(units) => units,
    })
}
