//! Batch execution
//!
//! A batch is one run of create or delete operations over an ordered list of
//! items. [`BatchExecutor`] drives the items, [`ProgressTracker`] aggregates
//! their outcomes, and [`BatchReport`] persists the result.

pub mod executor;
pub mod report;
pub mod tracker;

pub use executor::BatchExecutor;
pub use report::BatchReport;
pub use tracker::{BatchKind, ProgressSnapshot, ProgressTracker, RowError};
