//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Helpers shared
//! by the batch commands live here.

pub mod config;
pub mod delete;
pub mod import;
pub mod list;
pub mod template;

use crate::batch::{BatchExecutor, BatchKind, ProgressSnapshot, ProgressTracker};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::progress::ProgressObserver;
use clap::ValueEnum;
use inquire::{Confirm, InquireError};
use std::fmt::Display;
use std::future::Future;
use std::io::{self, IsTerminal};

/// Output format for batch commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Progress bar, tables, and a summary
    #[default]
    Text,
    /// Final progress snapshot as JSON on stdout
    Json,
}

/// Both ends of the terminal are interactive
pub(crate) fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Ask before a bulk operation
///
/// `--yes` skips the prompt. Without a terminal the prompt cannot be shown,
/// so the operation is refused instead of assumed.
pub(crate) fn confirm(question: &str, yes: bool, action: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !is_interactive() {
        return Err(CliError::ConfirmationRequired(action.to_string()));
    }

    match Confirm::new(question).with_default(false).prompt() {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            Err(CliError::Cancelled(action.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

/// Concurrency from the flag, falling back to configuration
pub(crate) fn executor_for(config: &Config, concurrency: Option<usize>) -> Result<BatchExecutor> {
    BatchExecutor::new(concurrency.unwrap_or(config.concurrency))
}

/// Run a batch on `tracker` with the terminal observer attached
///
/// `tracker` is the one `main` consults before honoring Ctrl-C. Resolves only
/// after every item has been attempted and the observer has drawn the final
/// state.
pub(crate) async fn run_with_progress<'a, T, F, Fut, E>(
    executor: &BatchExecutor,
    tracker: &ProgressTracker,
    items: &'a [T],
    kind: BatchKind,
    visible: bool,
    op: F,
) -> ProgressSnapshot
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
    E: Display,
{
    let observer = ProgressObserver::spawn(tracker, kind.verb(), visible);

    let snapshot = executor.run(items, kind, tracker, op).await;

    observer.finish(&snapshot).await;
    snapshot
}
