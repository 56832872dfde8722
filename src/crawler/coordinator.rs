//! Crawler coordinator - two-phase harvest orchestration
//!
//! Phase one runs the paginator on its own fetcher session and produces the
//! item backlog. The session is closed and the backlog frozen before phase
//! two starts; no worker exists until pagination has returned. Phase two
//! hands the frozen backlog to the worker pool and waits for every worker.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::HttpSessionFactory;
use crate::crawler::paginator::FeedPaginator;
use crate::crawler::parser::SelectorExtractor;
use crate::crawler::traits::{FeedExtractor, ItemExtractor, SessionFactory};
use crate::crawler::worker::WorkerPool;
use crate::marketplace::profile_for;
use crate::output::{open_sink, CrawlReport, RecordSink};
use crate::url::FeedUrlTemplate;
use crate::HarvestError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run parameters taken from the `[crawler]` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    pub feed: FeedUrlTemplate,
    pub search_term: String,
    pub start_page: u32,
    pub last_page: u32,
    pub workers: usize,
    pub dedupe: bool,
    pub retry_delay: Duration,
}

impl HarvestSettings {
    pub fn new(feed: FeedUrlTemplate, crawler: &CrawlerConfig) -> Self {
        Self {
            feed,
            search_term: crawler.search_term.clone(),
            start_page: crawler.start_page,
            last_page: crawler.last_page,
            workers: crawler.workers,
            dedupe: crawler.dedupe,
            retry_delay: Duration::from_millis(crawler.retry_delay_ms),
        }
    }
}

/// Main harvest coordinator structure
pub struct Coordinator {
    settings: HarvestSettings,
    sessions: Arc<dyn SessionFactory>,
    feed: Arc<dyn FeedExtractor>,
    items: Arc<dyn ItemExtractor>,
    sink: Arc<dyn RecordSink>,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        settings: HarvestSettings,
        sessions: Arc<dyn SessionFactory>,
        feed: Arc<dyn FeedExtractor>,
        items: Arc<dyn ItemExtractor>,
        sink: Arc<dyn RecordSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            sessions,
            feed,
            items,
            sink,
            cancel,
        }
    }

    /// Wires up a coordinator from a validated configuration
    ///
    /// Resolves the marketplace profile, compiles its selectors, and opens
    /// the configured record sink.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Unknown marketplace, bad selector, or sink failure
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let profile = profile_for(&config.crawler.marketplace, &config.marketplaces)?;
        let extractor = Arc::new(SelectorExtractor::new(&profile)?);
        let sink = open_sink(&config.output, &profile.name)?;
        tracing::info!("Writing records to {}", sink.describe());

        let sessions = Arc::new(HttpSessionFactory::new(
            config.user_agent.clone(),
            config.fetch.clone(),
        ));

        Ok(Self::new(
            HarvestSettings::new(profile.feed_template(), &config.crawler),
            sessions,
            extractor.clone(),
            extractor,
            sink,
            cancel,
        ))
    }

    /// Runs both phases
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Pagination succeeded; per-item failures are in the report
    /// * `Err(HarvestError)` - Pagination failed and no item was processed
    pub async fn run(&self) -> Result<CrawlReport, HarvestError> {
        let started_at = Utc::now();
        let settings = &self.settings;

        tracing::info!(
            "Searching '{}', feed pages {}..={}",
            settings.search_term,
            settings.start_page,
            settings.last_page
        );

        let paginator = FeedPaginator::new(
            settings.feed.clone(),
            settings.search_term.clone(),
            self.feed.clone(),
            self.cancel.clone(),
        );

        let fetcher = self.sessions.open().await?;
        let paginated = paginator
            .run(fetcher.as_ref(), settings.start_page, settings.last_page)
            .await;
        fetcher.close().await;
        let backlog = paginated?;

        let pages_fetched = backlog.pages_fetched();
        let discovered = backlog.len();
        let frozen = backlog.freeze(settings.dedupe);
        let duplicates_dropped = discovered - frozen.len();

        tracing::info!(
            "Pagination done: {} pages, {} item URLs ({} duplicates dropped)",
            pages_fetched,
            discovered,
            duplicates_dropped
        );

        let pool = WorkerPool::new(
            settings.workers,
            self.sessions.clone(),
            self.items.clone(),
            self.sink.clone(),
            settings.retry_delay,
            self.cancel.clone(),
        );

        let dispatch = if self.cancel.is_cancelled() {
            tracing::info!("Cancelled before dispatch, no items processed");
            Default::default()
        } else {
            pool.dispatch(frozen).await
        };

        let report = CrawlReport {
            started_at,
            finished_at: Utc::now(),
            pages_fetched,
            discovered,
            duplicates_dropped,
            cancelled: self.cancel.is_cancelled(),
            dispatch,
        };

        tracing::info!(
            "Harvest finished: {} saved, {} not available, {} unprocessed in {}s",
            report.dispatch.saved,
            report.dispatch.absent,
            report.dispatch.unprocessed.len(),
            report.duration_seconds()
        );

        Ok(report)
    }
}

/// Runs a complete harvest for a configuration
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `cancel` - Token that stops pagination and drains the workers when raised
pub async fn run_harvest(
    config: &Config,
    cancel: CancellationToken,
) -> Result<CrawlReport, HarvestError> {
    Coordinator::from_config(config, cancel)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::traits::{
        ExtractError, FeedListing, FetchError, Page, PageFetcher,
    };
    use crate::output::MemorySink;
    use crate::record::ItemFields;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records session lifecycle and fetch events in order
    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
    }

    impl Journal {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct JournalFetcher {
        session: usize,
        journal: Arc<Journal>,
    }

    #[async_trait]
    impl PageFetcher for JournalFetcher {
        async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
            self.journal.push(format!("fetch {} {}", self.session, url));
            if url.contains("broken") {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                });
            }
            Ok(Page::new(url, url))
        }

        async fn close(&self) {
            self.journal.push(format!("close {}", self.session));
        }
    }

    struct JournalSessions {
        opened: Mutex<usize>,
        journal: Arc<Journal>,
    }

    #[async_trait]
    impl SessionFactory for JournalSessions {
        async fn open(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
            let session = {
                let mut opened = self.opened.lock().unwrap();
                *opened += 1;
                *opened
            };
            self.journal.push(format!("open {}", session));
            Ok(Box::new(JournalFetcher {
                session,
                journal: self.journal.clone(),
            }))
        }
    }

    /// Feed pages 1 and 2 list two items each (one shared); page 3 is empty
    struct FakeExtractor;

    impl FeedExtractor for FakeExtractor {
        fn extract_feed(&self, page: &Page) -> Result<FeedListing, ExtractError> {
            let urls = if page.url.ends_with("p=1") {
                vec!["https://shop.example/itm/1?x", "https://shop.example/itm/2"]
            } else if page.url.ends_with("p=2") {
                vec!["https://shop.example/itm/2?y", "https://shop.example/itm/3"]
            } else {
                vec![]
            };
            Ok(FeedListing {
                result_count: urls.len() as u64,
                item_urls: urls.into_iter().map(str::to_string).collect(),
            })
        }
    }

    impl ItemExtractor for FakeExtractor {
        fn extract_item(&self, page: &Page) -> Result<Option<ItemFields>, ExtractError> {
            Ok(Some(ItemFields {
                title: page.url.clone(),
                description: String::new(),
                price: "1".to_string(),
                image_ref: "img".to_string(),
            }))
        }
    }

    fn settings(feed: &str, dedupe: bool) -> HarvestSettings {
        HarvestSettings {
            feed: FeedUrlTemplate::new(feed),
            search_term: "watch".to_string(),
            start_page: 1,
            last_page: 10,
            workers: 2,
            dedupe,
            retry_delay: Duration::ZERO,
        }
    }

    fn coordinator(
        settings: HarvestSettings,
        journal: Arc<Journal>,
        sink: Arc<MemorySink>,
        cancel: CancellationToken,
    ) -> Coordinator {
        Coordinator::new(
            settings,
            Arc::new(JournalSessions {
                opened: Mutex::new(0),
                journal,
            }),
            Arc::new(FakeExtractor),
            Arc::new(FakeExtractor),
            sink,
            cancel,
        )
    }

    #[tokio::test]
    async fn test_pagination_finishes_before_any_item_fetch() {
        let journal = Arc::new(Journal::default());
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(
            settings("https://shop.example/s?q={query}&p={page}", true),
            journal.clone(),
            sink.clone(),
            CancellationToken::new(),
        );

        let report = coordinator.run().await.unwrap();
        let events = journal.events();

        let close_feed = events.iter().position(|e| e == "close 1").unwrap();
        let first_item = events
            .iter()
            .position(|e| e.contains("/itm/"))
            .unwrap();
        assert!(close_feed < first_item);
        assert!(events[..close_feed].iter().all(|e| !e.starts_with("open 2")));

        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.discovered, 4);
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(report.dispatched(), 3);
        assert_eq!(report.dispatch.saved, 3);
        assert_eq!(sink.records().len(), 3);
    }

    #[tokio::test]
    async fn test_without_dedupe_duplicates_are_dispatched() {
        let journal = Arc::new(Journal::default());
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(
            settings("https://shop.example/s?q={query}&p={page}", false),
            journal,
            sink.clone(),
            CancellationToken::new(),
        );

        let report = coordinator.run().await.unwrap();

        assert_eq!(report.duplicates_dropped, 0);
        assert_eq!(report.dispatch.saved, 4);
        assert_eq!(sink.save_counts().get("2"), Some(&2));
    }

    #[tokio::test]
    async fn test_pagination_failure_aborts_before_dispatch() {
        let journal = Arc::new(Journal::default());
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(
            settings("https://broken.example/s?q={query}&p={page}", true),
            journal.clone(),
            sink.clone(),
            CancellationToken::new(),
        );

        let result = coordinator.run().await;

        assert!(matches!(result, Err(HarvestError::Fetch(FetchError::Timeout { .. }))));
        let events = journal.events();
        assert_eq!(events.last().map(String::as_str), Some("close 1"));
        assert!(events.iter().all(|e| !e.starts_with("open 2")));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_dispatches_nothing() {
        let journal = Arc::new(Journal::default());
        let sink = Arc::new(MemorySink::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let coordinator = coordinator(
            settings("https://shop.example/s?q={query}&p={page}", true),
            journal,
            sink.clone(),
            cancel,
        );

        let report = coordinator.run().await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.pages_fetched, 0);
        assert_eq!(report.dispatch.workers, 0);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_settings_from_crawler_config() {
        let crawler = CrawlerConfig {
            marketplace: "Ebay".to_string(),
            search_term: "Rolex".to_string(),
            start_page: 2,
            last_page: 7,
            workers: 4,
            dedupe: false,
            retry_delay_ms: 250,
        };
        let settings = HarvestSettings::new(FeedUrlTemplate::new("x{query}{page}"), &crawler);
        assert_eq!(settings.start_page, 2);
        assert_eq!(settings.last_page, 7);
        assert_eq!(settings.workers, 4);
        assert!(!settings.dedupe);
        assert_eq!(settings.retry_delay, Duration::from_millis(250));
    }
}
