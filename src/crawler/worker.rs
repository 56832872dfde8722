//! Phase two: the static-partition worker pool
//!
//! Worker `k` of `n` owns exactly the backlog indices `k, k+n, k+2n, ...`.
//! The assignment is computed, never stored, and is fixed before any work
//! starts, so workers never coordinate: each one has its own fetcher
//! session, reads the shared frozen backlog, and writes records whose ids no
//! other worker produces.
//!
//! Per item the worker applies this policy:
//!
//! | Outcome of `process_one` | Action |
//! |--------------------------|--------|
//! | `Found` | save the record |
//! | `Absent` (placeholder page) | skip silently |
//! | `Failed`, missing field | retry once; report as unprocessed if it fails again |
//! | `Failed`, anything else | report as unprocessed, no retry |
//!
//! No failure leaves the item it happened on.

use crate::crawler::backlog::FrozenBacklog;
use crate::crawler::traits::{
    ExtractError, FetchError, ItemExtractor, PageFetcher, SessionFactory,
};
use crate::output::{
    DispatchReport, RecordSink, SinkError, SinkResult, Unprocessed, WorkerReport,
};
use crate::record::ItemRecord;
use crate::url::derive_item_id;
use crate::UrlError;
use std::iter::StepBy;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Backlog indices owned by `worker` out of `workers`
///
/// `workers` must be at least 1.
///
/// # Examples
///
/// ```
/// use marketplace_harvester::crawler::partition;
///
/// let owned: Vec<usize> = partition(1, 3, 8).collect();
/// assert_eq!(owned, vec![1, 4, 7]);
/// ```
pub fn partition(worker: usize, workers: usize, len: usize) -> StepBy<Range<usize>> {
    (worker..len).step_by(workers)
}

/// Why an item could not be processed
#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error(transparent)]
    Extract(ExtractError),

    #[error(transparent)]
    Fetch(FetchError),

    #[error(transparent)]
    Url(UrlError),
}

impl ItemFailure {
    /// Only a missing element is worth a second attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Extract(ExtractError::MissingField { .. }))
    }

    /// Short failure class for reports
    pub fn class(&self) -> &'static str {
        match self {
            Self::Extract(ExtractError::MissingField { .. }) => "missing-field",
            Self::Extract(ExtractError::Malformed { .. }) => "malformed-field",
            Self::Fetch(_) => "fetch",
            Self::Url(_) => "invalid-url",
        }
    }
}

/// Result of processing one item URL
#[derive(Debug)]
pub enum ItemOutcome {
    /// Fields extracted; the record is ready to save
    Found(ItemRecord),

    /// The marketplace served its "item not available" page
    Absent,

    Failed(ItemFailure),
}

/// Fetches one item page and turns it into a record
///
/// # Arguments
///
/// * `fetcher` - The calling worker's session
/// * `extractor` - Item field extractor
/// * `url` - Normalized item URL
pub async fn process_one(
    fetcher: &dyn PageFetcher,
    extractor: &dyn ItemExtractor,
    url: &str,
) -> ItemOutcome {
    let page = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => return ItemOutcome::Failed(ItemFailure::Fetch(e)),
    };

    let fields = match extractor.extract_item(&page) {
        Ok(Some(fields)) => fields,
        Ok(None) => return ItemOutcome::Absent,
        Err(e) => return ItemOutcome::Failed(ItemFailure::Extract(e)),
    };

    match derive_item_id(url) {
        Ok(item_id) => ItemOutcome::Found(ItemRecord::new(item_id, url.to_string(), fields)),
        Err(e) => ItemOutcome::Failed(ItemFailure::Url(e)),
    }
}

/// Everything a worker needs, shared read-only across the pool
struct WorkerContext {
    workers: usize,
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<dyn ItemExtractor>,
    sink: Arc<dyn RecordSink>,
    retry_delay: Duration,
    cancel: CancellationToken,
}

/// Fixed-size pool of item workers
pub struct WorkerPool {
    ctx: Arc<WorkerContext>,
}

impl WorkerPool {
    /// Creates a pool of `workers` workers (at least one)
    ///
    /// `retry_delay` is the pause before the single retry of an item whose
    /// fields were missing.
    pub fn new(
        workers: usize,
        sessions: Arc<dyn SessionFactory>,
        extractor: Arc<dyn ItemExtractor>,
        sink: Arc<dyn RecordSink>,
        retry_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ctx: Arc::new(WorkerContext {
                workers: workers.max(1),
                sessions,
                extractor,
                sink,
                retry_delay,
                cancel,
            }),
        }
    }

    pub fn workers(&self) -> usize {
        self.ctx.workers
    }

    /// Runs every worker over its partition and waits for all of them
    ///
    /// Spawns exactly `workers` tasks, even when some partitions are empty.
    /// Returns once the last task has finished.
    pub async fn dispatch(&self, backlog: FrozenBacklog) -> DispatchReport {
        let workers = self.ctx.workers;
        tracing::info!(
            "Dispatching {} item URLs across {} workers",
            backlog.len(),
            workers
        );

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let ctx = self.ctx.clone();
                let backlog = backlog.clone();
                let span = tracing::info_span!("worker", worker);
                tokio::spawn(run_worker(ctx, worker, backlog).instrument(span))
            })
            .collect();

        let mut report = DispatchReport {
            workers,
            ..DispatchReport::default()
        };

        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(worker_report) => report.absorb(worker_report),
                Err(e) => {
                    tracing::error!("Worker {} terminated abnormally: {}", worker, e);
                    report.crashed_workers += 1;
                }
            }
        }

        report
    }
}

async fn run_worker(
    ctx: Arc<WorkerContext>,
    worker: usize,
    backlog: FrozenBacklog,
) -> WorkerReport {
    let mut report = WorkerReport {
        worker,
        ..WorkerReport::default()
    };

    let fetcher = match ctx.sessions.open().await {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("Could not open fetcher session: {}", e);
            for index in partition(worker, ctx.workers, backlog.len()) {
                report.unprocessed.push(Unprocessed {
                    url: backlog[index].clone(),
                    index,
                    class: "session",
                    reason: e.to_string(),
                });
            }
            return report;
        }
    };

    let mut owned = partition(worker, ctx.workers, backlog.len());
    while let Some(index) = owned.next() {
        if ctx.cancel.is_cancelled() {
            report.skipped = 1 + owned.by_ref().count();
            tracing::info!("Cancelled, leaving {} items unvisited", report.skipped);
            break;
        }

        let url = &backlog[index];
        let mut retried = false;
        let mut outcome = process_one(fetcher.as_ref(), ctx.extractor.as_ref(), url).await;

        if let ItemOutcome::Failed(failure) = &outcome {
            if failure.is_retryable() {
                tracing::debug!("{} on {}, retrying once", failure, url);
                if !ctx.retry_delay.is_zero() {
                    tokio::time::sleep(ctx.retry_delay).await;
                }
                retried = true;
                outcome = process_one(fetcher.as_ref(), ctx.extractor.as_ref(), url).await;
            }
        }

        match outcome {
            ItemOutcome::Found(record) => match save_record(ctx.sink.clone(), record).await {
                Ok(()) => {
                    report.saved += 1;
                    if retried {
                        report.recovered += 1;
                        tracing::info!("Second try worked for {}", url);
                    }
                }
                Err(e) => {
                    tracing::warn!("Item {} was not saved: {}", url, e);
                    report.unprocessed.push(Unprocessed {
                        url: url.clone(),
                        index,
                        class: "sink",
                        reason: e.to_string(),
                    });
                }
            },
            ItemOutcome::Absent => {
                tracing::debug!("Item not available: {}", url);
                report.absent += 1;
            }
            ItemOutcome::Failed(failure) => {
                tracing::warn!("Item {} was not scraped ({}): {}", url, failure.class(), failure);
                report.unprocessed.push(Unprocessed {
                    url: url.clone(),
                    index,
                    class: failure.class(),
                    reason: failure.to_string(),
                });
            }
        }
    }

    fetcher.close().await;
    tracing::debug!(
        "Worker finished: {} saved, {} absent, {} unprocessed",
        report.saved,
        report.absent,
        report.unprocessed.len()
    );
    report
}

/// Hands a record to the sink on the blocking thread pool
///
/// Sink writes are synchronous file or database I/O. A panicking sink is
/// reported as a failed save of that one record.
async fn save_record(sink: Arc<dyn RecordSink>, record: ItemRecord) -> SinkResult<()> {
    tokio::task::spawn_blocking(move || -> SinkResult<()> {
        sink.save(&record)?;
        tracing::trace!("Saved {} {:?}", record.item_id, record.field_map());
        Ok(())
    })
    .await
    .map_err(|e| SinkError::Unavailable(format!("save task failed: {}", e)))?
}
