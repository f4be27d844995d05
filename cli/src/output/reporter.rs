//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::sync::Mutex;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` (suppressed when `ctx.quiet`)
/// - `success()` prints `"  ✓ {message}"` (suppressed when `ctx.quiet`)
/// - `warn()` prints `"  ! {message}"` (suppressed when `ctx.quiet`)
/// - `begin_wait()` starts a spinner when stdout is an interactive terminal,
///   otherwise it prints a step line
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Mutex<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: Mutex::new(None),
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Print above the spinner when one is running, so it is not overdrawn.
    fn print(&self, line: String) {
        let running = self
            .spinner
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned());
        match running {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            self.print(format!("  {} {message}", "→".style(self.ctx.styles.header)));
        }
    }

    fn success(&self, message: &str) {
        if !self.ctx.quiet {
            self.print(format!("  {} {message}", "✓".style(self.ctx.styles.success)));
        }
    }

    fn warn(&self, message: &str) {
        if !self.ctx.quiet {
            self.print(format!("  {} {message}", "!".style(self.ctx.styles.warning)));
        }
    }

    fn begin_wait(&self, message: &str) {
        if !self.ctx.show_progress() {
            self.step(message);
            return;
        }
        if let Some(old) = self.take_spinner() {
            progress::finish_clear(&old);
        }
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(progress::spinner(message));
        }
    }

    fn end_wait(&self) {
        if let Some(pb) = self.take_spinner() {
            progress::finish_clear(&pb);
        }
    }
}
