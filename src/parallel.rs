//! Parallel batch orchestration.
//!
//! Every item runs in its own task on the tokio blocking pool, at most
//! `concurrency` at a time. Items share no mutable state, so they need no
//! coordination; results are gathered on the calling task in completion
//! order. A failing or panicking item is recorded and the batch carries on.

use crate::error::{ErrorKind, OvalError, Result};
use crate::services::progress::{BatchProgressTracker, ProgressReporter};
use crate::tracing_config::events;
use crate::types::WorkItem;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// A unit of batch work identified by its dataset index
pub trait BatchItem: Clone + Send + 'static {
    fn index(&self) -> usize;
}

impl BatchItem for WorkItem {
    fn index(&self) -> usize {
        self.index
    }
}

impl BatchItem for usize {
    fn index(&self) -> usize {
        *self
    }
}

/// One failed item with the reason it failed
#[derive(Debug, Clone)]
pub struct BatchFailure<T> {
    pub item: T,
    pub kind: ErrorKind,
    pub message: String,
}

/// Aggregate result of a batch run, in completion order
#[derive(Debug, Clone)]
pub struct BatchOutcome<T, R> {
    pub successes: Vec<(usize, R)>,
    pub failures: Vec<BatchFailure<T>>,
}

impl<T: BatchItem, R> BatchOutcome<T, R> {
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Indices of failed items, ascending
    #[must_use]
    pub fn failed_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.failures.iter().map(|f| f.item.index()).collect();
        indices.sort_unstable();
        indices
    }

    /// Indices of successful items, ascending
    #[must_use]
    pub fn succeeded_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.successes.iter().map(|(i, _)| *i).collect();
        indices.sort_unstable();
        indices
    }

    /// Failure count per error kind
    #[must_use]
    pub fn failures_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Pool size used when none is configured
#[must_use]
pub fn default_concurrency() -> usize {
    num_cpus::get().max(1)
}

/// Run `worker` over every item with at most `concurrency` items in flight.
///
/// Per-item errors and panics never abort the batch; they are returned in
/// [`BatchOutcome::failures`]. Nothing is retried.
///
/// Opens no span of its own; the CLI runs it inside `spans::batch`.
///
/// # Errors
/// * `InvalidConfig` when `concurrency` is `Some(0)`
pub async fn run_parallel<T, R, F>(
    items: Vec<T>,
    worker: Arc<F>,
    concurrency: Option<usize>,
    reporter: &dyn ProgressReporter,
) -> Result<BatchOutcome<T, R>>
where
    T: BatchItem,
    R: Send + 'static,
    F: Fn(&T) -> Result<R> + Send + Sync + 'static,
{
    let limit = match concurrency {
        Some(0) => {
            return Err(OvalError::config_value_error(
                "concurrency",
                0,
                "at least 1 worker",
            ))
        },
        Some(n) => n,
        None => default_concurrency(),
    };

    let total = items.len();
    info!(total, concurrency = limit, "Dispatching batch");
    reporter.start(total);
    let mut tracker = BatchProgressTracker::new(total);

    let mut outcome = BatchOutcome {
        successes: Vec::with_capacity(total),
        failures: Vec::new(),
    };

    let mut results = std::pin::pin!(stream::iter(items.into_iter().map(|item| {
        let worker = Arc::clone(&worker);
        let task_item = item.clone();
        async move {
            let joined = tokio::task::spawn_blocking(move || worker(&task_item)).await;
            (item, joined)
        }
    }))
    .buffer_unordered(limit));

    while let Some((item, joined)) = results.next().await {
        let index = item.index();
        let failure = match joined {
            Ok(Ok(result)) => {
                outcome.successes.push((index, result));
                None
            },
            Ok(Err(e)) => Some((e.kind(), e.to_string())),
            Err(join_error) => Some((ErrorKind::Other, join_failure_message(join_error))),
        };

        let succeeded = failure.is_none();
        if let Some((kind, message)) = failure {
            events::item_failed(index, &kind, &message);
            outcome.failures.push(BatchFailure {
                item,
                kind,
                message,
            });
        }
        reporter.item_finished(&tracker.record(Some(index), succeeded));
    }

    let elapsed_ms = tracker.elapsed_ms();
    reporter.finish(outcome.successes.len(), outcome.failures.len(), elapsed_ms);
    events::performance_metric("batch", elapsed_ms, total);
    info!(
        succeeded = outcome.successes.len(),
        failed = outcome.failures.len(),
        elapsed_ms,
        "Batch finished"
    );
    Ok(outcome)
}

fn join_failure_message(error: tokio::task::JoinError) -> String {
    if !error.is_panic() {
        return format!("worker task did not complete: {error}");
    }
    let payload = error.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("worker panicked: {detail}")
}
