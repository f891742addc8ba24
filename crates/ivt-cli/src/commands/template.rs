//! `ivt template` command implementation
//!
//! Writes the sample CSV users fill in before importing.

use crate::error::{CliError, Result};
use colored::Colorize;
use ivt_common::template::{write_template, TEMPLATE_FILE_NAME};
use std::path::PathBuf;
use tracing::debug;

pub async fn run(output: Option<PathBuf>, force: bool) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(TEMPLATE_FILE_NAME));

    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.display().to_string()));
    }

    write_template(&path)?;
    debug!(path = %path.display(), "Template written");

    println!("{} Template written to: {}", "✓".green(), path.display().to_string().cyan());
    println!("Fill it in, then run: {}", format!("ivt import {}", path.display()).cyan());
    Ok(())
}
