//! IVT Common Library
//!
//! Shared record model, CSV intake, and error handling for the IVT inventory tools.
//!
//! # Overview
//!
//! - **Records**: Typed, ordered field mappings and identifier resolution
//! - **Normalization**: Decoding uploaded CSV text into typed records
//! - **Template**: The downloadable import template
//! - **Logging**: Tracing subscriber setup shared by the binaries
//!
//! # Example
//!
//! ```no_run
//! use ivt_common::normalize::normalize_file;
//!
//! fn preview(path: &str) -> ivt_common::Result<()> {
//!     let table = normalize_file(path)?;
//!     println!("{} records, columns: {:?}", table.records.len(), table.headers);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod normalize;
pub mod record;
pub mod template;

// Re-export commonly used types
pub use error::{IvtError, Result};
pub use normalize::NormalizedTable;
pub use record::{FieldValue, IdentifierPolicy, Record, RecordId, StoredRecord};
