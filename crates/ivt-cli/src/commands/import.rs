//! `ivt import` command implementation
//!
//! Normalizes a CSV file and creates one store record per row.

use super::{confirm, executor_for, run_with_progress, OutputFormat};
use crate::api::{HttpRecordStore, RecordStore};
use crate::batch::{BatchKind, BatchReport, ProgressTracker};
use crate::config::Config;
use crate::display::{self, PREVIEW_ROWS};
use crate::error::{CliError, Result};
use chrono::Utc;
use colored::Colorize;
use ivt_common::normalize::normalize_file;
use ivt_common::NormalizedTable;
use serde_json::json;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for `ivt import`
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub file: PathBuf,
    pub concurrency: Option<usize>,
    pub yes: bool,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
    pub open: bool,
    pub format: OutputFormat,
}

/// Import every row of a CSV file
pub async fn run(
    config: &Config,
    options: ImportOptions,
    tracker: &ProgressTracker,
) -> Result<()> {
    if !options.file.is_file() {
        return Err(CliError::FileNotFound(options.file.display().to_string()));
    }

    let table = normalize_file(&options.file)?;
    let text = options.format == OutputFormat::Text;
    info!(
        file = %options.file.display(),
        records = table.len(),
        fields = table.headers.len(),
        "File normalized"
    );

    for warning in &table.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    if text {
        print_preview(&options, &table);
    }

    if options.dry_run {
        if text {
            println!("{}", "Dry run: nothing was sent to the record store.".yellow());
        } else {
            let preview = json!({
                "total": table.len(),
                "headers": table.headers,
                "records": table.records,
                "warnings": table.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        return Ok(());
    }

    let question = format!(
        "Import {} record(s) into {}?",
        table.len(),
        config.api_url
    );
    if !confirm(&question, options.yes, "Import")? {
        println!("Import cancelled.");
        return Ok(());
    }

    let store = HttpRecordStore::from_config(config)?;
    let executor = executor_for(config, options.concurrency)?;
    let visible = text && io::stdout().is_terminal();
    let started_at = Utc::now();

    let snapshot = run_with_progress(
        &executor,
        tracker,
        &table.records,
        BatchKind::Create,
        visible,
        |record| store.create(record),
    )
    .await;

    if let Some(ref path) = options.report {
        BatchReport::new(snapshot.clone(), store.api_url(), executor.concurrency(), started_at)
            .with_source(options.file.display().to_string())
            .write(path)?;
        if text {
            println!("{} Report written to: {}", "✓".green(), path.display().to_string().cyan());
        }
    }

    if text {
        display::print_summary(&snapshot);
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    if options.open {
        open_inventory(config, text);
    }

    if snapshot.failed > 0 {
        return Err(CliError::BatchFailed {
            failed: snapshot.failed,
            total: snapshot.total,
        });
    }

    Ok(())
}

fn print_preview(options: &ImportOptions, table: &NormalizedTable) {
    println!(
        "{} {} record(s), {} field(s) from {}",
        "Loaded".cyan().bold(),
        table.len(),
        table.headers.len(),
        options.file.display()
    );
    println!("{}", display::preview_table(table, PREVIEW_ROWS));
    if table.len() > PREVIEW_ROWS {
        println!("... and {} more row(s)", table.len() - PREVIEW_ROWS);
    }
    println!();
}

/// Open the configured inventory page; failures only warn
fn open_inventory(config: &Config, text: bool) {
    let Some(ref url) = config.inventory_url else {
        eprintln!(
            "{} --open needs inventory_url in the config file or IVT_INVENTORY_URL",
            "warning:".yellow().bold()
        );
        return;
    };

    match open::that(url) {
        Ok(()) => {
            if text {
                println!("Opened {}", url.cyan());
            }
        },
        Err(e) => warn!(url = %url, error = %e, "Could not open inventory page"),
    }
}
