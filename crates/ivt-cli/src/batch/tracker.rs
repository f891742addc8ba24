//! Progress tracker
//!
//! The tracker is the only state workers share. It owns the current
//! [`ProgressSnapshot`] inside a `watch` channel: each mutation runs under the
//! channel's lock and publishes the new snapshot in the same step, so
//! observers never see a half-applied update.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;

/// Kind of operation a batch performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchKind {
    #[default]
    #[serde(rename = "upload")]
    Create,
    #[serde(rename = "delete")]
    Delete,
}

impl BatchKind {
    /// Verb for user-facing messages
    pub fn verb(self) -> &'static str {
        match self {
            BatchKind::Create => "Importing",
            BatchKind::Delete => "Deleting",
        }
    }
}

/// One failed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based position of the item in the input
    pub row: usize,
    pub message: String,
}

/// Point-in-time view of a batch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub is_processing: bool,
    /// Failures in completion order
    pub errors: Vec<RowError>,
    #[serde(rename = "type")]
    pub kind: BatchKind,
}

impl ProgressSnapshot {
    /// Items with a recorded outcome
    pub fn attempted(&self) -> usize {
        self.success + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.attempted() == self.total
    }

    /// Whether an observer may close its view
    pub fn can_dismiss(&self) -> bool {
        !self.is_processing
    }
}

/// Shared progress aggregate for one batch at a time
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    state: Arc<watch::Sender<ProgressSnapshot>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ProgressSnapshot::default());
        Self {
            state: Arc::new(sender),
        }
    }

    /// Reset counters for a new batch and mark it processing
    pub fn initialize(&self, total: usize, kind: BatchKind) {
        self.state.send_modify(|snapshot| {
            *snapshot = ProgressSnapshot {
                total,
                kind,
                is_processing: true,
                ..ProgressSnapshot::default()
            };
        });
    }

    /// Record the outcome of the item at `index` (0-based)
    pub fn record_outcome<E: Display>(&self, index: usize, outcome: &Result<(), E>) {
        self.state.send_modify(|snapshot| match outcome {
            Ok(()) => snapshot.success += 1,
            Err(err) => {
                snapshot.failed += 1;
                snapshot.errors.push(RowError {
                    row: index + 1,
                    message: err.to_string(),
                });
            },
        });
    }

    /// Clear the processing flag
    pub fn mark_done(&self) {
        self.state.send_modify(|snapshot| snapshot.is_processing = false);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every published update
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_resets() {
        let tracker = ProgressTracker::new();
        tracker.initialize(2, BatchKind::Create);
        tracker.record_outcome(0, &Err::<(), _>("boom"));
        tracker.mark_done();

        tracker.initialize(3, BatchKind::Delete);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.attempted(), 0);
        assert!(snapshot.errors.is_empty());
        assert!(snapshot.is_processing);
        assert!(!snapshot.can_dismiss());
        assert_eq!(snapshot.kind, BatchKind::Delete);
    }

    #[test]
    fn test_outcomes_accumulate() {
        let tracker = ProgressTracker::new();
        tracker.initialize(3, BatchKind::Create);
        tracker.record_outcome::<String>(0, &Ok(()));
        tracker.record_outcome(2, &Err("Status 400: bad"));
        tracker.record_outcome(1, &Err("Status 500: down"));

        let snapshot = tracker.snapshot();
        assert_eq!((snapshot.success, snapshot.failed), (1, 2));
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.errors[0].row, 3);
        assert_eq!(snapshot.errors[1].row, 2);

        tracker.mark_done();
        assert!(tracker.snapshot().can_dismiss());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let tracker = ProgressTracker::new();
        tracker.initialize(1, BatchKind::Create);
        tracker.record_outcome(0, &Err("Status 429: slow down"));

        let value = serde_json::to_value(tracker.snapshot()).unwrap();
        assert_eq!(
            value,
            json!({
                "total": 1,
                "success": 0,
                "failed": 1,
                "isProcessing": true,
                "errors": [{"row": 1, "message": "Status 429: slow down"}],
                "type": "upload"
            })
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let tracker = ProgressTracker::new();
        let mut rx = tracker.subscribe();

        tracker.initialize(1, BatchKind::Delete);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_processing);

        tracker.record_outcome::<String>(0, &Ok(()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().success, 1);
    }
}
