//! IVT CLI Library
//!
//! Command-line bulk loader for an inventory record store.
//!
//! # Overview
//!
//! - **Import**: Normalize a CSV file and create one record per row (`ivt import`)
//! - **Listing**: Show, search, and export stored records (`ivt list`)
//! - **Deletion**: Delete records by id or by search (`ivt delete`)
//! - **Template**: Write a sample import file (`ivt template`)
//! - **Configuration**: Inspect effective settings (`ivt config`)
//!
//! Imports and deletes run through a bounded-concurrency
//! [`batch::BatchExecutor`]; every store call is retried with exponential
//! backoff by the [`transport::ResilientTransport`].

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod batch;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod progress;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{ArgGroup, Parser, Subcommand};
use commands::list::ListFormat;
use commands::OutputFormat;
use std::path::PathBuf;

/// IVT - Inventory bulk loader
#[derive(Parser, Debug)]
#[command(name = "ivt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Record store collection URL
    #[arg(long, env = "IVT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Config file (defaults to <config dir>/ivt/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the full command reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import records from a CSV file
    Import {
        /// CSV file with a header row
        file: PathBuf,

        /// Concurrent requests (defaults to the configured value)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Normalize and preview only
        #[arg(long)]
        dry_run: bool,

        /// Write the final progress snapshot to this file as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Open the inventory page when done
        #[arg(long)]
        open: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List stored records
    List {
        /// Only records with a value containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Delete stored records
    #[command(group(
        ArgGroup::new("selection")
            .required(true)
            .args(["ids", "matching", "all"])
    ))]
    Delete {
        /// Record identifiers
        ids: Vec<String>,

        /// Delete every identifiable record containing this text
        #[arg(short, long, conflicts_with = "ids")]
        matching: Option<String>,

        /// Delete every identifiable record
        #[arg(long, conflicts_with_all = ["ids", "matching"])]
        all: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Concurrent requests (defaults to the configured value)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Write the final progress snapshot to this file as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write the CSV import template
    Template {
        /// Destination (defaults to ./modelo_inventario.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_delete_requires_a_selection() {
        assert!(Cli::try_parse_from(["ivt", "delete"]).is_err());
        assert!(Cli::try_parse_from(["ivt", "delete", "1", "--all"]).is_err());
        assert!(Cli::try_parse_from(["ivt", "delete", "1", "2"]).is_ok());
        assert!(Cli::try_parse_from(["ivt", "delete", "--matching", "caixa"]).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ivt",
            "import",
            "items.csv",
            "--api-url",
            "http://localhost:9000/api",
            "-c",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api"));
        assert!(matches!(
            cli.command,
            Some(Commands::Import {
                concurrency: Some(4),
                ..
            })
        ));
    }
}
