//! Harvest reports
//!
//! Workers each produce a [`WorkerReport`]; the pool merges them into a
//! [`DispatchReport`] and the coordinator wraps that into a [`CrawlReport`]
//! together with the phase-one numbers.

use chrono::{DateTime, Utc};

/// An item URL that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unprocessed {
    /// The item URL
    pub url: String,

    /// Backlog index of the URL
    pub index: usize,

    /// Failure class (e.g. "missing-field", "fetch")
    pub class: &'static str,

    /// Error message
    pub reason: String,
}

/// Outcome counts for one worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,

    /// Records handed to the sink
    pub saved: usize,

    /// Items that resolved to the placeholder page
    pub absent: usize,

    /// Items saved only after the retry
    pub recovered: usize,

    /// Owned indices left untouched because of cancellation
    pub skipped: usize,

    pub unprocessed: Vec<Unprocessed>,
}

/// Merged outcome of phase two
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub workers: usize,
    pub saved: usize,
    pub absent: usize,
    pub recovered: usize,
    pub skipped: usize,

    /// Worker tasks that panicked; their partial counts are lost
    pub crashed_workers: usize,

    /// Unprocessed URLs, ordered by backlog index
    pub unprocessed: Vec<Unprocessed>,
}

impl DispatchReport {
    pub fn absorb(&mut self, report: WorkerReport) {
        self.saved += report.saved;
        self.absent += report.absent;
        self.recovered += report.recovered;
        self.skipped += report.skipped;
        self.unprocessed.extend(report.unprocessed);
        self.unprocessed.sort_by_key(|u| u.index);
    }
}

/// Summary of a complete harvest
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Feed pages fetched in phase one
    pub pages_fetched: u32,

    /// Item URLs collected in phase one
    pub discovered: usize,

    /// Repeated URLs dropped before partitioning
    pub duplicates_dropped: usize,

    /// Whether cancellation was requested during the run
    pub cancelled: bool,

    pub dispatch: DispatchReport,
}

impl CrawlReport {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// URLs handed to the worker pool
    pub fn dispatched(&self) -> usize {
        self.discovered - self.duplicates_dropped
    }
}

/// Prints a report to stdout, including a plain list of unprocessed URLs
pub fn print_report(report: &CrawlReport) {
    println!("=== Harvest Report ===\n");

    println!("Phase one:");
    println!("  Feed pages fetched: {}", report.pages_fetched);
    println!("  Item URLs discovered: {}", report.discovered);
    println!("  Duplicates dropped: {}", report.duplicates_dropped);
    println!();

    let dispatch = &report.dispatch;
    println!("Phase two ({} workers):", dispatch.workers);
    println!("  Saved: {}", dispatch.saved);
    println!("  Saved after retry: {}", dispatch.recovered);
    println!("  Not available: {}", dispatch.absent);
    println!("  Unprocessed: {}", dispatch.unprocessed.len());
    if dispatch.skipped > 0 {
        println!("  Skipped (cancelled): {}", dispatch.skipped);
    }
    if dispatch.crashed_workers > 0 {
        println!("  Crashed workers: {}", dispatch.crashed_workers);
    }
    println!();

    if !dispatch.unprocessed.is_empty() {
        println!("Unprocessed URLs:");
        for item in &dispatch.unprocessed {
            println!("  {} [{}] {}", item.url, item.class, item.reason);
        }
        println!();
    }

    if report.cancelled {
        println!("Run was cancelled before completion.");
    }
    println!("Elapsed: {}s", report.duration_seconds());
}
