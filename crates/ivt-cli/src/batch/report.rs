//! Batch run reports
//!
//! A report is the final snapshot plus run metadata, written as pretty JSON
//! by `--report PATH`.

use super::tracker::ProgressSnapshot;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    #[serde(flatten)]
    pub snapshot: ProgressSnapshot,

    /// Input file or selection the batch was built from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub api_url: String,
    pub concurrency: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(
        snapshot: ProgressSnapshot,
        api_url: impl Into<String>,
        concurrency: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot,
            source: None,
            api_url: api_url.into(),
            concurrency,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report, replacing any existing file
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = self.to_json()?;
        text.push('\n');
        std::fs::write(path, text)?;
        Ok(())
    }
}
