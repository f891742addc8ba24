//! `ivt list` command implementation

use crate::api::{HttpRecordStore, RecordStore};
use crate::config::Config;
use crate::display;
use crate::error::Result;
use crate::progress::spinner_if;
use clap::ValueEnum;
use colored::Colorize;
use ivt_common::StoredRecord;
use std::io::{self, IsTerminal};

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Records whose rendered values contain `term`, case-insensitively
pub fn filter_records(records: Vec<StoredRecord>, term: Option<&str>) -> Vec<StoredRecord> {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        Some(term) => records
            .into_iter()
            .filter(|stored| stored.record.matches(term))
            .collect(),
        None => records,
    }
}

/// Fetch and print the store's records
pub async fn run(config: &Config, search: Option<String>, format: ListFormat) -> Result<()> {
    let store = HttpRecordStore::from_config(config)?;

    let spinner = spinner_if(
        format == ListFormat::Table && io::stdout().is_terminal(),
        "Loading records...",
    );
    let fetched = store.list().await;
    spinner.finish_and_clear();

    let total = fetched.as_ref().map(Vec::len).unwrap_or_default();
    let records = filter_records(fetched?, search.as_deref());

    match format {
        ListFormat::Json => println!("{}", display::listing_json(&records)?),
        ListFormat::Csv => {
            let columns = display::listing_columns(&records);
            print!("{}", display::listing_csv(&records, &columns)?);
        },
        ListFormat::Table => {
            if records.is_empty() {
                let message = if search.is_some() {
                    "No records match the search."
                } else {
                    "The inventory is empty."
                };
                println!("{}", message.yellow());
                return Ok(());
            }

            let columns = display::listing_columns(&records);
            println!("{}", display::listing_table(&records, &columns));

            let deletable = records.iter().filter(|r| r.is_deletable()).count();
            println!(
                "Showing {} of {} record(s), {} with an identifier",
                records.len(),
                total,
                deletable
            );
        },
    }

    Ok(())
}
