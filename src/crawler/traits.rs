//! Capability traits at the edge of the crawl core
//!
//! The paginator and the worker pool only talk to pages through these
//! traits. The HTTP fetcher and the selector extractor are the production
//! implementations; tests plug in scripted ones.

use async_trait::async_trait;
use thiserror::Error;

/// A fetched page, ready for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL that was requested
    pub url: String,

    /// HTTP status code (200 for fetchers without a status notion)
    pub status: u16,

    /// Page body (HTML)
    pub body: String,
}

impl Page {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
        }
    }
}

/// Transport-level failures while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to open fetcher session: {0}")]
    Session(String),
}

/// Failures while pulling fields out of a fetched page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A required element is not on the page
    #[error("required field '{field}' not found")]
    MissingField { field: &'static str },

    /// The element exists but its content is unusable
    #[error("field '{field}' is malformed: '{value}'")]
    Malformed { field: &'static str, value: String },
}

/// What a feed page yields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedListing {
    /// Total result count reported by the page; zero ends pagination
    pub result_count: u64,

    /// Absolute item URLs in page order (not yet normalized)
    pub item_urls: Vec<String>,
}

/// One fetcher session: navigates to URLs and returns their pages
///
/// A session is owned by exactly one worker (or by the paginator) and is
/// never shared.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;

    /// Releases the session
    async fn close(&self) {}
}

/// Opens independent fetcher sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageFetcher>, FetchError>;
}

/// Reads result count and item links from a feed page
pub trait FeedExtractor: Send + Sync {
    fn extract_feed(&self, page: &Page) -> Result<FeedListing, ExtractError>;
}

/// Reads item fields from an item page
pub trait ItemExtractor: Send + Sync {
    /// Returns `Ok(None)` when the page is the marketplace's placeholder for
    /// an unavailable item.
    fn extract_item(&self, page: &Page) -> Result<Option<crate::record::ItemFields>, ExtractError>;
}
