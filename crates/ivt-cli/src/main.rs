//! IVT CLI - Main entry point

use clap::Parser;
use ivt_cli::batch::ProgressTracker;
use ivt_cli::commands::{self, delete::DeleteOptions, import::ImportOptions};
use ivt_cli::progress::interrupted;
use ivt_cli::{Cli, CliError, Commands, Config, ConfigCommand};
use ivt_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    // Values from .env apply to both clap's env fallbacks and the config layer
    let dotenv = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    // Initialize logging based on verbose flag and environment
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("ivt")
        .build();

    // Environment variables take precedence over the flag
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {}", e);
            log_config
        },
    };

    // The CLI works without logging; the guard flushes file output on drop
    let log_guard = init_logging(&log_config).ok().flatten();

    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env");
    }

    // Ctrl-C is honored only while no batch is processing
    let tracker = ProgressTracker::new();
    let outcome = tokio::select! {
        result = execute_command(&cli, &tracker) => result,
        () = interrupted(&tracker) => Err(CliError::Cancelled("Command".to_string())),
    };

    let code = match outcome {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            e.exit_code()
        },
    };

    // process::exit skips destructors
    drop(log_guard);
    if code != 0 {
        process::exit(code);
    }
}

/// Resolve configuration layers; flags win over file and environment
fn load_config(cli: &Cli) -> ivt_cli::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref url) = cli.api_url {
        config.api_url = url.clone();
    }
    config.validate()?;
    debug!(api_url = %config.api_url, concurrency = config.concurrency, "Configuration loaded");
    Ok(config)
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, tracker: &ProgressTracker) -> ivt_cli::Result<()> {
    let Some(ref command) = cli.command else {
        return Err(CliError::config("a subcommand is required"));
    };

    match command {
        Commands::Import {
            file,
            concurrency,
            yes,
            dry_run,
            report,
            open,
            format,
        } => {
            let config = load_config(cli)?;
            let options = ImportOptions {
                file: file.clone(),
                concurrency: *concurrency,
                yes: *yes,
                dry_run: *dry_run,
                report: report.clone(),
                open: *open,
                format: *format,
            };
            commands::import::run(&config, options, tracker).await
        },

        Commands::List { search, format } => {
            let config = load_config(cli)?;
            commands::list::run(&config, search.clone(), *format).await
        },

        Commands::Delete {
            ids,
            matching,
            all,
            yes,
            concurrency,
            report,
            format,
        } => {
            let config = load_config(cli)?;
            let options = DeleteOptions {
                ids: ids.clone(),
                matching: matching.clone(),
                all: *all,
                yes: *yes,
                concurrency: *concurrency,
                report: report.clone(),
                format: *format,
            };
            commands::delete::run(&config, options, tracker).await
        },

        Commands::Template { output, force } => {
            commands::template::run(output.clone(), *force).await
        },

        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::config::show(&load_config(cli)?).await,
            ConfigCommand::Path => commands::config::path(cli.config.as_deref()).await,
        },
    }
}
