//! `rtdeploy metrics` — show values extracted from stored run metrics.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::domain::metrics::MetricsSummary;
use crate::infra::metrics_store::JsonMetricsStore;

/// Arguments for the metrics command.
#[derive(Args)]
pub struct MetricsArgs {
    /// Record to show (default: the latest in --dir)
    pub file: Option<PathBuf>,

    /// Show one row per record instead of a single record
    #[arg(long, conflicts_with = "file")]
    pub all: bool,

    /// Directory holding `metrics_*.json` records
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

/// Entry point for `rtdeploy metrics`.
///
/// # Errors
///
/// Returns an error if no record exists or a record cannot be parsed.
pub fn run(app: &AppContext, args: &MetricsArgs) -> Result<ExitCode> {
    app.init_logging();
    let store = JsonMetricsStore::new(&args.dir);

    if args.all {
        let summaries = store
            .list()?
            .into_iter()
            .map(summarize)
            .collect::<Result<Vec<_>>>()?;
        app.renderer().render_metrics_table(&summaries)?;
        return Ok(ExitCode::SUCCESS);
    }

    let path = match &args.file {
        Some(path) => path.clone(),
        None => store.latest()?.ok_or_else(|| {
            anyhow::anyhow!("no metrics records in {}", store.dir().display())
        })?,
    };
    app.renderer().render_metrics(&summarize(path)?)?;
    Ok(ExitCode::SUCCESS)
}

fn summarize(path: PathBuf) -> Result<MetricsSummary> {
    let metrics = JsonMetricsStore::load(&path)?;
    Ok(MetricsSummary::new(path, &metrics))
}
