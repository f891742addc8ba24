//! Configuration management for IVT CLI
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. TOML file (`--config PATH`, or `<config dir>/ivt/config.toml` if present)
//! 3. environment variables (`IVT_*`, including values loaded from `.env`)
//! 4. command-line flags, applied by the caller

use crate::error::{CliError, Result};
use crate::transport::{RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES};
use ivt_common::record::{DEFAULT_IDENTIFIER_FIELDS, DEFAULT_IDENTIFIER_SUFFIX};
use ivt_common::IdentifierPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default record store collection URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/inventario";

/// Default number of concurrent workers; 1 keeps free-tier stores under their rate limit
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Config file name inside the `ivt` config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store collection URL
    pub api_url: String,

    /// Concurrent workers per batch
    pub concurrency: usize,

    /// Retries after the first attempt on rate limiting or network failure
    pub max_retries: u32,

    /// Delay before the first retry; doubles after each retry
    pub base_delay_ms: u64,

    pub request_timeout_secs: u64,

    /// Page opened by `ivt import --open` after a run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_url: Option<String>,

    /// Identifier field names, checked in order
    pub identifier_fields: Vec<String>,

    /// Case-insensitive suffix marking identifier fields
    pub identifier_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            inventory_url: None,
            identifier_fields: DEFAULT_IDENTIFIER_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            identifier_suffix: DEFAULT_IDENTIFIER_SUFFIX.to_string(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ivt").join(CONFIG_FILE_NAME))
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CliError::FileNotFound(path.display().to_string()),
            _ => CliError::Io(e),
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Load file and environment layers
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.merge_env()?;
        Ok(config)
    }

    /// Override fields with any `IVT_*` variables that are set
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("IVT_API_URL") {
            self.api_url = url;
        }

        if let Some(concurrency) = env_number("IVT_CONCURRENCY")? {
            self.concurrency = concurrency;
        }

        if let Some(retries) = env_number("IVT_MAX_RETRIES")? {
            self.max_retries = retries;
        }

        if let Some(delay) = env_number("IVT_BACKOFF_MS")? {
            self.base_delay_ms = delay;
        }

        if let Some(timeout) = env_number("IVT_TIMEOUT_SECS")? {
            self.request_timeout_secs = timeout;
        }

        if let Ok(url) = std::env::var("IVT_INVENTORY_URL") {
            self.inventory_url = Some(url).filter(|u| !u.trim().is_empty());
        }

        Ok(())
    }

    /// Reject settings the batch pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CliError::config("concurrency must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            return Err(CliError::config("request_timeout_secs must be at least 1"));
        }

        validate_url("api_url", &self.api_url)?;
        if let Some(ref url) = self.inventory_url {
            validate_url("inventory_url", url)?;
        }

        self.identifier_policy()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn identifier_policy(&self) -> Result<IdentifierPolicy> {
        let suffix = Some(self.identifier_suffix.clone()).filter(|s| !s.is_empty());
        Ok(IdentifierPolicy::new(self.identifier_fields.clone(), suffix)?)
    }
}

fn env_number<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CliError::config(format!("{} must be a non-negative integer, got '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

fn validate_url(field: &str, raw: &str) -> Result<()> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| CliError::config(format!("{} '{}' is not a valid URL: {}", field, raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(CliError::config(format!(
            "{} must use http or https, got '{}'",
            field, scheme
        ))),
    }
}
