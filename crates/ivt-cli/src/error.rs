//! Error types for IVT CLI
//!
//! User-facing errors with clear, actionable messages. Per-item request
//! failures inside a batch never surface here; they are recorded by the
//! progress tracker and summarized as [`CliError::BatchFailed`].

use crate::transport::TransportError;
use ivt_common::IvtError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Required file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Refusing to overwrite an existing file
    #[error("File already exists: '{0}'. Use --force to overwrite it.")]
    AlreadyExists(String),

    /// Input decoding or shared-library failure
    #[error("{0}")]
    Common(#[from] IvtError),

    /// A single store call failed after retries
    #[error("Request to the record store failed: {0}")]
    Transport(#[from] TransportError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("Network request failed: {0}. Check your internet connection and API URL.")]
    Http(#[from] reqwest::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or config file.")]
    Config(String),

    /// Config file is not valid TOML
    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to render configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Failed to encode JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Interactive prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    /// The user backed out of an interactive prompt
    #[error("{0} cancelled")]
    Cancelled(String),

    /// Destructive or bulk operation needs confirmation but no terminal is attached
    #[error("Confirmation required for {0}. Re-run with --yes when not using an interactive terminal.")]
    ConfirmationRequired(String),

    /// The batch ran to completion but some items failed
    #[error("{failed} of {total} item(s) failed. See the error list above or the report file.")]
    BatchFailed { failed: usize, total: usize },
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::TomlParse(_) => 2,
            CliError::Cancelled(_) => crate::progress::INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }
}
