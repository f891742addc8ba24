//! `ivt delete` command implementation
//!
//! Deletes explicit identifiers, or every identifiable record in the listing
//! (optionally filtered). The listing is refreshed only after the batch has
//! resolved, so the remaining count reflects every attempted delete.

use super::list::filter_records;
use super::{confirm, executor_for, run_with_progress, OutputFormat};
use crate::api::{HttpRecordStore, RecordStore};
use crate::batch::{BatchKind, BatchReport, ProgressSnapshot, ProgressTracker};
use crate::config::Config;
use crate::display;
use crate::error::{CliError, Result};
use crate::progress::spinner_if;
use chrono::Utc;
use colored::Colorize;
use ivt_common::{RecordId, StoredRecord};
use serde::Serialize;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for `ivt delete`
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub ids: Vec<String>,
    pub matching: Option<String>,
    pub all: bool,
    pub yes: bool,
    pub concurrency: Option<usize>,
    pub report: Option<PathBuf>,
    pub format: OutputFormat,
}

/// JSON output: the final snapshot plus selection and refresh counts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteOutcome<'a> {
    #[serde(flatten)]
    snapshot: &'a ProgressSnapshot,
    /// Selected records without an identifier
    skipped: usize,
    /// Records left after the refresh; absent if the refresh failed
    remaining: Option<usize>,
}

/// Identifiers selected from a listing, and how many records had none
pub fn select_ids(records: &[StoredRecord]) -> (Vec<RecordId>, usize) {
    let ids: Vec<RecordId> = records.iter().filter_map(|r| r.id.clone()).collect();
    let skipped = records.len() - ids.len();
    (ids, skipped)
}

/// Parse identifiers given on the command line
pub fn parse_ids(raw: &[String]) -> Result<Vec<RecordId>> {
    raw.iter()
        .map(|value| {
            RecordId::parse(value)
                .ok_or_else(|| CliError::config(format!("invalid record id '{}'", value)))
        })
        .collect()
}

pub async fn run(
    config: &Config,
    options: DeleteOptions,
    tracker: &ProgressTracker,
) -> Result<()> {
    if options.ids.is_empty() && options.matching.is_none() && !options.all {
        return Err(CliError::config(
            "pass record ids, --matching TERM, or --all to choose what to delete",
        ));
    }

    let store = HttpRecordStore::from_config(config)?;
    let text = options.format == OutputFormat::Text;
    let interactive = text && io::stdout().is_terminal();

    let (ids, skipped) = if options.ids.is_empty() {
        let spinner = spinner_if(interactive, "Loading records...");
        let listing = store.list().await;
        spinner.finish_and_clear();

        let selected = filter_records(listing?, options.matching.as_deref());
        select_ids(&selected)
    } else {
        (parse_ids(&options.ids)?, 0)
    };

    if skipped > 0 {
        eprintln!(
            "{} {} selected record(s) have no identifier and will be skipped",
            "warning:".yellow().bold(),
            skipped
        );
    }

    if ids.is_empty() {
        if text {
            println!("{}", "Nothing to delete.".yellow());
        } else {
            let snapshot = ProgressSnapshot {
                kind: BatchKind::Delete,
                ..ProgressSnapshot::default()
            };
            print_json(&snapshot, skipped, None)?;
        }
        return Ok(());
    }

    let question = format!("Delete {} record(s) from {}?", ids.len(), config.api_url);
    if !confirm(&question, options.yes, "Delete")? {
        println!("Delete cancelled.");
        return Ok(());
    }

    let executor = executor_for(config, options.concurrency)?;
    let started_at = Utc::now();

    let snapshot = run_with_progress(&executor, tracker, &ids, BatchKind::Delete, interactive, |id| {
        store.delete(id)
    })
    .await;

    // The batch has resolved; only now is the listing current
    let spinner = spinner_if(interactive, "Refreshing records...");
    let remaining = match store.list().await {
        Ok(records) => Some(records.len()),
        Err(e) => {
            warn!(error = %e, "Listing refresh after delete failed");
            None
        },
    };
    spinner.finish_and_clear();
    info!(remaining = ?remaining, "Listing refreshed");

    if let Some(ref path) = options.report {
        let source = match (&options.matching, options.ids.is_empty()) {
            (_, false) => "command line".to_string(),
            (Some(term), true) => format!("listing matching '{}'", term),
            (None, true) => "listing".to_string(),
        };
        BatchReport::new(snapshot.clone(), store.api_url(), executor.concurrency(), started_at)
            .with_source(source)
            .write(path)?;
        if text {
            println!("{} Report written to: {}", "✓".green(), path.display().to_string().cyan());
        }
    }

    if text {
        display::print_summary(&snapshot);
        match remaining {
            Some(count) => println!("{} record(s) remain in the store", count),
            None => println!("{}", "Could not refresh the listing.".yellow()),
        }
    } else {
        print_json(&snapshot, skipped, remaining)?;
    }

    if snapshot.failed > 0 {
        return Err(CliError::BatchFailed {
            failed: snapshot.failed,
            total: snapshot.total,
        });
    }

    Ok(())
}

fn print_json(snapshot: &ProgressSnapshot, skipped: usize, remaining: Option<usize>) -> Result<()> {
    let outcome = DeleteOutcome {
        snapshot,
        skipped,
        remaining,
    };
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::endpoints::record_url;
    use ivt_common::IdentifierPolicy;
    use serde_json::json;

    #[test]
    fn test_select_ids_skips_unidentified() {
        let policy = IdentifierPolicy::default();
        let records: Vec<StoredRecord> = [
            json!({"id": 10, "descricao": "A"}),
            json!({"descricao": "no id"}),
            json!({"produto_id": "P-7"}),
        ]
        .iter()
        .filter_map(|v| StoredRecord::from_json(v, &policy))
        .collect();

        let (ids, skipped) = select_ids(&records);
        assert_eq!(ids, vec![RecordId::Number(10), RecordId::Text("P-7".into())]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_parse_ids() {
        let ids = parse_ids(&["42".to_string(), "abc-1".to_string()]).unwrap();
        assert_eq!(ids, vec![RecordId::Number(42), RecordId::Text("abc-1".into())]);
        assert!(parse_ids(&[" ".to_string()]).is_err());

        // The request path carries the id exactly as typed
        let ids = parse_ids(&["007".to_string(), "+5".to_string()]).unwrap();
        let urls: Vec<String> = ids.iter().map(|id| record_url("http://h/api", id)).collect();
        assert_eq!(urls, ["http://h/api/007", "http://h/api/%2B5"]);
    }

    #[test]
    fn test_json_outcome_shape() {
        let snapshot = ProgressSnapshot {
            total: 2,
            success: 2,
            kind: BatchKind::Delete,
            ..ProgressSnapshot::default()
        };
        let outcome = DeleteOutcome {
            snapshot: &snapshot,
            skipped: 1,
            remaining: Some(5),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["type"], "delete");
        assert_eq!(value["success"], 2);
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["remaining"], 5);
        assert_eq!(value["isProcessing"], false);
    }
}
