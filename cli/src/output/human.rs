//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;
use rtdeploy_common::PhaseResult;

use crate::domain::RunReport;
use crate::domain::config::TargetSummary;
use crate::domain::metrics::MetricsSummary;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the per-phase outcome of a run and a summary line.
    ///
    /// The failure line goes to stderr and is printed even when quiet.
    pub fn render_run_report(&self, report: &RunReport) {
        if !self.ctx.quiet {
            println!();
            self.ctx.header(&format!("Target {}", report.target));
        }
        for outcome in &report.phases {
            let took = format_duration_ms(outcome.duration_ms);
            match &outcome.result {
                PhaseResult::Succeeded => {
                    self.ctx.success(&format!("{} ({took})", outcome.phase));
                }
                PhaseResult::Failed { reason } => {
                    self.ctx
                        .error(&format!("{} failed after {took}: {reason}", outcome.phase));
                }
            }
        }
        for warning in report.warnings() {
            self.ctx.warn(&warning);
        }
        if self.ctx.quiet {
            return;
        }
        for phase in &report.skipped {
            println!(
                "  {} {phase} skipped",
                "-".style(self.ctx.styles.dim)
            );
        }
        if let Some(path) = &report.metrics_path {
            self.ctx.kv("Metrics:", &path.display().to_string());
        }
        let total = format_duration_ms(report.duration_ms);
        if report.succeeded() {
            self.ctx.success(&format!(
                "{} completed in {total}",
                report.target.style(self.ctx.styles.bold)
            ));
        } else {
            println!(
                "  {} {} failed after {total}",
                "✗".style(self.ctx.styles.error),
                report.target.style(self.ctx.styles.bold)
            );
        }
    }

    /// Render the configured targets, one block per target.
    pub fn render_targets(&self, targets: &[TargetSummary]) {
        if targets.is_empty() {
            self.ctx.info("No targets configured");
            return;
        }
        if self.ctx.quiet {
            return;
        }
        for target in targets {
            let marker = if target.is_default { " (default)" } else { "" };
            println!(
                "  {}{}",
                target.name.style(self.ctx.styles.bold),
                marker.style(self.ctx.styles.dim)
            );
            if let Some(description) = &target.description {
                println!("    {description}");
            }
            if let Some(host) = &target.telnet_host {
                self.ctx.kv("  host:  ", host);
            }
            self.ctx
                .kv("  builds:", &format_builds(target.build_count, &target.builds));
        }
    }

    /// Render the values extracted from one metrics record.
    pub fn render_metrics(&self, summary: &MetricsSummary) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.header(&summary.file.display().to_string());
        self.ctx.kv("target:           ", &summary.target);
        self.ctx.kv(
            "timestamp:        ",
            &summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        let mut time = format!("{:.3}s", summary.execution_time);
        if summary.timed_out {
            time.push_str(" (timed out)");
        }
        self.ctx.kv("execution time:   ", &time);
        let counters = &summary.counters;
        self.ctx.kv("messages sent:    ", &counters.messages_sent.to_string());
        self.ctx
            .kv("messages received:", &counters.messages_received.to_string());
        self.ctx
            .kv("server lines:     ", &optional(counters.server_lines));
        self.ctx
            .kv("client lines:     ", &optional(counters.client_lines));
    }

    /// Render one row per metrics record.
    pub fn render_metrics_table(&self, summaries: &[MetricsSummary]) {
        if summaries.is_empty() {
            self.ctx.info("No metrics records found");
            return;
        }
        if self.ctx.quiet {
            return;
        }
        println!(
            "  {}",
            format!(
                "{:<20} {:<16} {:>10} {:>10} {:>10} {:>8} {:>8}",
                "timestamp", "target", "time (s)", "sent", "received", "server", "client"
            )
            .style(self.ctx.styles.dim)
        );
        for s in summaries {
            println!(
                "  {:<20} {:<16} {:>10} {:>10} {:>10} {:>8} {:>8}",
                s.timestamp.format("%Y-%m-%d %H:%M:%S"),
                s.target,
                format!("{:.3}{}", s.execution_time, if s.timed_out { "*" } else { "" }),
                s.counters.messages_sent,
                s.counters.messages_received,
                optional(s.counters.server_lines),
                optional(s.counters.client_lines),
            );
        }
    }
}

/// `450ms` below one second, `1.25s` above.
#[must_use]
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        #[allow(clippy::cast_precision_loss)]
        let secs = ms as f64 / 1000.0;
        format!("{secs:.2}s")
    }
}

/// `3: a, b, c, ...` when more units exist than are listed.
#[must_use]
pub fn format_builds(count: usize, names: &[String]) -> String {
    if count == 0 {
        return "none".to_string();
    }
    let mut listed = names.join(", ");
    if count > names.len() {
        listed.push_str(", ...");
    }
    format!("{count}: {listed}")
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
