//! Bounded-concurrency batch executor
//!
//! Workers are futures polled together on the calling task, not spawned
//! tasks. They share one atomic cursor: each worker claims the next index,
//! awaits the operation for that item, records the outcome, and claims again
//! until the cursor runs past the end. A failed item never stops the batch.
//!
//! With one worker, items complete in input order. With more, completion
//! order is unspecified but every index is still claimed exactly once.

use super::tracker::{BatchKind, ProgressSnapshot, ProgressTracker};
use crate::error::{CliError, Result};
use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs one operation per item with at most `concurrency` in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    concurrency: usize,
}

impl BatchExecutor {
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(CliError::config("concurrency must be at least 1"));
        }
        Ok(Self { concurrency })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Attempt every item once and return the final snapshot
    ///
    /// The tracker is initialized for `items.len()` and marked done before
    /// this returns, so the returned future resolving means every outcome has
    /// been recorded.
    pub async fn run<'a, T, F, Fut, E>(
        &self,
        items: &'a [T],
        kind: BatchKind,
        tracker: &ProgressTracker,
        op: F,
    ) -> ProgressSnapshot
    where
        F: Fn(&'a T) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        tracker.initialize(items.len(), kind);

        let workers = self.concurrency.min(items.len());
        let cursor = AtomicUsize::new(0);
        let started = Instant::now();

        info!(
            kind = ?kind,
            total = items.len(),
            workers,
            "Batch started"
        );

        let pool = (0..workers).map(|worker| {
            let (cursor, op) = (&cursor, &op);
            async move {
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(item) = items.get(index) else {
                        break;
                    };

                    let outcome = op(item).await;
                    if let Err(ref err) = outcome {
                        warn!(worker, row = index + 1, error = %err, "Item failed");
                    }
                    tracker.record_outcome(index, &outcome);
                }
                debug!(worker, "Worker finished");
            }
        });
        join_all(pool).await;

        tracker.mark_done();
        let snapshot = tracker.snapshot();

        info!(
            kind = ?kind,
            total = snapshot.total,
            success = snapshot.success,
            failed = snapshot.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );

        snapshot
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Varying per-item latency so workers interleave
    fn latency(n: usize) -> Duration {
        Duration::from_millis(((n * 7) % 5) as u64 * 10)
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        assert!(matches!(BatchExecutor::new(0), Err(CliError::Config(_))));
        assert_eq!(BatchExecutor::new(4).unwrap().concurrency(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_preserves_order() {
        let items: Vec<usize> = (0..20).collect();
        let order = Mutex::new(Vec::new());
        let order = &order;
        let tracker = ProgressTracker::new();

        let snapshot = BatchExecutor::new(1)
            .unwrap()
            .run(&items, BatchKind::Create, &tracker, |n: &usize| async move {
                tokio::time::sleep(latency(*n)).await;
                order.lock().unwrap().push(*n);
                Ok::<(), String>(())
            })
            .await;

        assert_eq!(*order.lock().unwrap(), items);
        assert_eq!(snapshot.success, 20);
        assert!(!snapshot.is_processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_index_once_within_limit() {
        let items: Vec<usize> = (0..50).collect();
        let seen = Mutex::new(Vec::new());
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (seen, in_flight, peak) = (&seen, &in_flight, &peak);
        let tracker = ProgressTracker::new();

        let snapshot = BatchExecutor::new(4)
            .unwrap()
            .run(&items, BatchKind::Delete, &tracker, |n: &usize| async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(latency(*n)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                seen.lock().unwrap().push(*n);
                Ok::<(), String>(())
            })
            .await;

        let mut seen = seen.lock().unwrap().clone();
        assert_ne!(seen, items, "items should complete out of order");
        seen.sort_unstable();
        assert_eq!(seen, items);
        assert_eq!(peak.load(Ordering::SeqCst), 4);
        assert_eq!(snapshot.total, 50);
        assert!(snapshot.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic() {
        let items: Vec<usize> = (0..30).collect();
        let tracker = ProgressTracker::new();
        let observed = Mutex::new(Vec::new());
        let (observed, tracker_ref) = (&observed, &tracker);

        let snapshot = BatchExecutor::new(3)
            .unwrap()
            .run(&items, BatchKind::Create, &tracker, |n: &usize| async move {
                tokio::time::sleep(latency(*n)).await;
                let current = tracker_ref.snapshot();
                assert!(current.attempted() <= current.total);
                observed.lock().unwrap().push(current.attempted());
                if n % 4 == 0 {
                    Err(format!("item {} rejected", n))
                } else {
                    Ok(())
                }
            })
            .await;

        let observed = observed.lock().unwrap();
        assert!(observed.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(snapshot.success + snapshot.failed, 30);
        assert_eq!(snapshot.failed, 8);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let items = vec!["a", "b", "c", "d", "e"];
        let tracker = ProgressTracker::new();

        let snapshot = BatchExecutor::new(1)
            .unwrap()
            .run(&items, BatchKind::Create, &tracker, |item: &&str| {
                let item = *item;
                async move {
                    if item == "c" {
                        Err(TransportError::from_status(400, "codigo is required"))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!((snapshot.total, snapshot.success, snapshot.failed), (5, 4, 1));
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].row, 3);
        assert_eq!(snapshot.errors[0].message, "Status 400: codigo is required");
        assert_eq!(tracker.snapshot(), snapshot);
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let tracker = ProgressTracker::new();
        let items: Vec<u8> = Vec::new();

        let snapshot = BatchExecutor::new(8)
            .unwrap()
            .run(&items, BatchKind::Delete, &tracker, |_: &u8| async {
                Ok::<(), String>(())
            })
            .await;

        assert_eq!(snapshot.total, 0);
        assert!(snapshot.is_complete());
        assert!(!snapshot.is_processing);
    }
}
