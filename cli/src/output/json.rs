//! JSON output helpers.
//!
//! Provides the machine-readable renderer and the error-object formatter
//! used by all `--json` code paths when a command fails.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::RunReport;
use crate::domain::config::TargetSummary;
use crate::domain::metrics::MetricsSummary;

/// Renders domain types as pretty-printed JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_run_report(&self, report: &RunReport) -> Result<()> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            succeeded: bool,
            #[serde(flatten)]
            report: &'a RunReport,
        }
        print_json(&Envelope {
            succeeded: report.succeeded(),
            report,
        })
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_targets(&self, targets: &[TargetSummary]) -> Result<()> {
        print_json(&serde_json::json!({ "targets": targets }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_metrics(&self, summary: &MetricsSummary) -> Result<()> {
        print_json(summary)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_metrics_table(&self, summaries: &[MetricsSummary]) -> Result<()> {
        print_json(&serde_json::json!({ "records": summaries }))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
