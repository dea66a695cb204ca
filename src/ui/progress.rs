//! Terminal rendering for the audit progress surface, via `indicatif`.
//!
//! The simulation itself lives in [`crate::progress`] and is pure; this
//! module owns the timer. Each in-flight audit gets its own
//! [`ProgressTicker`], an owned tokio task, aborted deterministically
//! when the audit settles, never tracked in a shared registry.

use crate::progress::AuditProgress;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Terminal UI for one audit run: a percentage bar plus milestone lines.
pub struct AuditUi {
    multi: MultiProgress,
    bar: ProgressBar,
    verbose: bool,
}

impl AuditUi {
    pub fn new(verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let bar_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let bar = multi.add(ProgressBar::new(100));
        bar.set_style(bar_style);
        bar.set_prefix("Audit");

        Self {
            multi,
            bar,
            verbose,
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` so
    /// milestones are never silently lost when the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Refresh the bar from the simulation's current state.
    pub fn update(&self, percent: f32, stage: &str) {
        self.bar.set_position(percent.round() as u64);
        self.bar.set_message(stage.to_string());
    }

    /// Print one newly fired milestone.
    pub fn milestone(&self, label: &str) {
        self.print_line(format!("  {label}"));
    }

    /// Finish the bar after a successful audit.
    pub fn audit_complete(&self) {
        self.bar.set_position(100);
        self.bar.finish_with_message("verdict consolidated");
        self.print_line(format!(
            "\n{} {}\n",
            style("✨").green(),
            style("Final verdict consolidated.").green().bold()
        ));
    }

    /// Finish the bar after a failed audit.
    pub fn audit_failed(&self, reason: &str) {
        self.bar.abandon_with_message("failed");
        self.print_line(format!(
            "\n{} {}\n",
            style("✗").red(),
            style(format!("Audit failed: {reason}")).red().bold()
        ));
    }

    /// Print a dim status line in verbose mode.
    pub fn log_step(&self, msg: &str) {
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(msg).dim()));
        }
    }
}

/// Owned, cancelable driver for one audit's simulated progress.
///
/// Ticks an [`AuditProgress`] on a fixed period, pushing percent updates
/// and newly fired milestones to the UI. Dropped or finished, the task is
/// aborted; nothing outlives the operation it narrates.
pub struct ProgressTicker {
    state: Arc<Mutex<AuditProgress>>,
    ui: Arc<AuditUi>,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Spawn the ticker task for a fresh audit.
    pub fn spawn(ui: Arc<AuditUi>, period: Duration) -> Self {
        let state = Arc::new(Mutex::new(AuditProgress::new()));
        let task_state = state.clone();
        let task_ui = ui.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut cursor = 0usize;
            loop {
                interval.tick().await;
                let (percent, stage, fresh) = {
                    let mut progress = match task_state.lock() {
                        Ok(progress) => progress,
                        Err(_) => break,
                    };
                    progress.tick();
                    let (events, next) = progress.events_since(cursor);
                    let fresh: Vec<String> = events.to_vec();
                    cursor = next;
                    (progress.percent(), progress.stage().to_string(), fresh)
                };
                for label in &fresh {
                    task_ui.milestone(label);
                }
                task_ui.update(percent, &stage);
            }
        });

        Self { state, ui, handle }
    }

    /// Stop the simulation with the real outcome. Cancels the ticker
    /// task, applies the terminal transition, and renders it.
    pub fn finish(self, success: bool) {
        self.handle.abort();
        if let Ok(mut progress) = self.state.lock() {
            progress.finish(success);
        }
        if success {
            self.ui.audit_complete();
        }
        // Failure rendering is left to the caller, which knows the reason.
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
