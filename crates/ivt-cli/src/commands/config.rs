//! `ivt config` command implementation
//!
//! Shows the effective configuration and where it is read from.

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use std::path::Path;

/// Show the effective configuration as TOML
pub async fn show(config: &Config) -> Result<()> {
    println!("{}", "# Effective IVT configuration".dimmed());
    print!("{}", toml::to_string_pretty(config)?);
    println!();
    println!("{}", "Environment Variables:".cyan());
    println!("  IVT_API_URL        - Record store collection URL");
    println!("  IVT_CONCURRENCY    - Concurrent workers per batch");
    println!("  IVT_MAX_RETRIES    - Retries on rate limiting or network failure");
    println!("  IVT_BACKOFF_MS     - First retry delay in milliseconds");
    println!("  IVT_TIMEOUT_SECS   - Per-request timeout");
    println!("  IVT_INVENTORY_URL  - Page opened by 'ivt import --open'");
    Ok(())
}

/// Print the config file path in use
pub async fn path(explicit: Option<&Path>) -> Result<()> {
    match explicit.map(Path::to_path_buf).or_else(Config::default_path) {
        Some(path) => {
            let note = if path.is_file() { "" } else { " (not created)" };
            println!("{}{}", path.display(), note.dimmed());
        },
        None => println!("{}", "No configuration directory on this platform".yellow()),
    }
    Ok(())
}
