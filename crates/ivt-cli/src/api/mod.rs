//! Remote record store
//!
//! The store accepts one record per create call, one identifier per delete
//! call, and returns its full contents from a listing call. [`RecordStore`]
//! is the seam the batch commands talk to; [`HttpRecordStore`] is the HTTP
//! implementation.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::HttpRecordStore;

use crate::transport::TransportError;
use async_trait::async_trait;
use ivt_common::{Record, RecordId, StoredRecord};

/// Per-record operations against the remote store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create one record
    async fn create(&self, record: &Record) -> Result<(), TransportError>;

    /// Fetch every stored record
    async fn list(&self) -> Result<Vec<StoredRecord>, TransportError>;

    /// Delete one record by identifier
    async fn delete(&self, id: &RecordId) -> Result<(), TransportError>;
}
