//! Progress display for batch runs
//!
//! [`ProgressObserver`] follows a [`ProgressTracker`] from a spawned task and
//! mirrors every published snapshot onto an `indicatif` bar.
//! [`interrupted`] keeps Ctrl-C from stopping the process while a batch is
//! still processing.

use crate::batch::{ProgressSnapshot, ProgressTracker};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Exit status for a process stopped by SIGINT
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Create a bar counting attempted items
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} {spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_prefix(message.to_string());
    pb
}

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner that draws only when `visible`
pub fn spinner_if(visible: bool, message: &str) -> ProgressBar {
    if visible {
        create_spinner(message)
    } else {
        ProgressBar::hidden()
    }
}

fn counts_message(snapshot: &ProgressSnapshot) -> String {
    if snapshot.failed == 0 {
        format!("{} ok", snapshot.success)
    } else {
        format!("{} ok, {} failed", snapshot.success, snapshot.failed)
    }
}

fn render(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_length(snapshot.total as u64);
    bar.set_position(snapshot.attempted() as u64);
    bar.set_message(counts_message(snapshot));
}

/// Terminal observer attached to one batch
pub struct ProgressObserver {
    bar: ProgressBar,
    follower: JoinHandle<()>,
}

impl ProgressObserver {
    /// Start following `tracker`; a hidden observer draws nothing
    pub fn spawn(tracker: &ProgressTracker, label: &str, visible: bool) -> Self {
        let bar = if visible {
            create_progress_bar(0, label)
        } else {
            ProgressBar::hidden()
        };

        let mut updates = tracker.subscribe();
        let task_bar = bar.clone();
        let follower = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                render(&task_bar, &snapshot);
            }
        });

        Self { bar, follower }
    }

    /// Draw the final snapshot and stop following
    ///
    /// Call only after the batch has resolved.
    pub async fn finish(self, snapshot: &ProgressSnapshot) {
        self.follower.abort();
        if let Err(err) = self.follower.await {
            if !err.is_cancelled() {
                debug!(error = %err, "Progress follower stopped unexpectedly");
            }
        }

        render(&self.bar, snapshot);
        self.bar.finish_with_message(counts_message(snapshot));
    }
}

/// Resolves at the first Ctrl-C received while `tracker` can be dismissed
///
/// Interrupts during a batch only print a warning. The caller decides how to
/// stop; `main` turns this into [`CliError::Cancelled`](crate::CliError).
pub async fn interrupted(tracker: &ProgressTracker) {
    loop {
        if let Err(err) = tokio::signal::ctrl_c().await {
            debug!(error = %err, "Cannot listen for Ctrl-C");
            return std::future::pending().await;
        }

        if tracker.snapshot().can_dismiss() {
            return;
        }
        eprintln!(
            "\n{} A batch is still running and cannot be stopped. Every remaining item will be attempted; press Ctrl-C again once it finishes.",
            "!".yellow().bold()
        );
    }
}
