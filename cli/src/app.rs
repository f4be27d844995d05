//! Application context — unified state passed to every command handler.
//!
//! Constructed once in `Cli::run()` from the global flags.

use std::path::PathBuf;

use anyhow::Result;
use rtdeploy_common::DeployConfig;

use crate::infra::logging::{self, LogLevel};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Configuration file to read.
    pub config: PathBuf,
    /// Verbosity from `--verbose` / `--debug`.
    pub log_level: LogLevel,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    ///
    /// Always quiet in JSON mode so progress lines never mix with the document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration file to read.
    pub config_path: PathBuf,
    /// Verbosity requested on the command line.
    pub log_level: LogLevel,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let quiet = flags.output.quiet || flags.output.json;
        Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config_path: flags.config,
            log_level: flags.log_level,
        }
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Install logging at the command-line level.
    pub fn init_logging(&self) {
        logging::init(self.log_level);
    }

    /// Read the configuration file, then install logging.
    ///
    /// A `debug: true` in the file raises the level to debug.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_config(&self) -> Result<DeployConfig> {
        let config = crate::infra::config::load_config(&self.config_path)?;
        let level = if config.debug {
            self.log_level.max(LogLevel::Debug)
        } else {
            self.log_level
        };
        logging::init(level);
        tracing::debug!(path = %self.config_path.display(), targets = config.targets.len(), "configuration loaded");
        Ok(config)
    }
}
