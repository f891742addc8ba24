//! Build automation tasks for IVT
//!
//! `cargo xtask cli-docs` regenerates the command reference from the clap
//! definitions in `ivt-cli`.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for IVT", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    CliDocs {
        /// Output file
        #[arg(short, long, default_value = "docs/cli-reference.md")]
        output: PathBuf,

        /// Fail instead of writing when the file is out of date
        #[arg(long)]
        check: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::CliDocs { output, check } => cli_docs(&output, check)?,
    }

    Ok(())
}

fn render() -> String {
    let commands = clap_markdown::help_markdown::<ivt_cli::Cli>();

    format!(
        r#"# IVT CLI Reference

Generated from the command definitions in `crates/ivt-cli`. Run
`cargo xtask cli-docs` after changing a command.

## Quick Start

```bash
# Write the import template and fill it in
ivt template

# Preview, then import with two concurrent requests
ivt import modelo_inventario.csv --dry-run
ivt import modelo_inventario.csv --concurrency 2 --report import-report.json

# Find and remove records
ivt list --search caixa
ivt delete --matching caixa
```

## Environment Variables

- `IVT_API_URL` - Record store collection URL
- `IVT_CONCURRENCY` - Concurrent requests per batch (default: `1`)
- `IVT_MAX_RETRIES` - Retries on HTTP 429 or network failure (default: `3`)
- `IVT_BACKOFF_MS` - First retry delay, doubled on each retry (default: `1000`)
- `IVT_TIMEOUT_SECS` - Per-request timeout (default: `30`)
- `IVT_INVENTORY_URL` - Page opened by `ivt import --open`
- `IVT_LOG_LEVEL`, `IVT_LOG_OUTPUT`, `IVT_LOG_FORMAT`, `IVT_LOG_DIR`, `IVT_LOG_FILTER` - Logging

## Commands

{}
"#,
        commands
    )
}

fn cli_docs(output: &Path, check: bool) -> anyhow::Result<()> {
    let content = render();

    if check {
        let current = fs::read_to_string(output).unwrap_or_default();
        if current != content {
            anyhow::bail!(
                "{} is out of date; run `cargo xtask cli-docs`",
                output.display()
            );
        }
        println!("✅ {} is up to date", output.display());
        return Ok(());
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, content)?;

    println!(
        "✅ Generated CLI reference at: {} ({})",
        output.display(),
        chrono::Utc::now().format("%Y-%m-%d")
    );

    Ok(())
}
