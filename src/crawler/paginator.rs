//! Phase one: feed pagination
//!
//! Walks the marketplace's search feed from the start page to the last page
//! (inclusive), stopping early at the first page that reports zero results.
//! Every failure here is fatal to the run: a feed that cannot be fetched or
//! read points at configuration or connectivity, not at a single bad item.

use crate::crawler::backlog::UrlBacklog;
use crate::crawler::traits::{FeedExtractor, PageFetcher};
use crate::url::{normalize_item_url, FeedUrlTemplate};
use crate::HarvestError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Drives sequential feed-page retrieval
pub struct FeedPaginator {
    template: FeedUrlTemplate,
    search_term: String,
    extractor: Arc<dyn FeedExtractor>,
    cancel: CancellationToken,
}

impl FeedPaginator {
    pub fn new(
        template: FeedUrlTemplate,
        search_term: impl Into<String>,
        extractor: Arc<dyn FeedExtractor>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            template,
            search_term: search_term.into(),
            extractor,
            cancel,
        }
    }

    /// Collects item URLs from feed pages `start_page..=last_page`
    ///
    /// # Termination
    ///
    /// - A page reporting zero results ends pagination (that page counts as fetched)
    /// - The page counter passing `last_page` ends pagination
    /// - A raised cancellation token ends pagination before the next fetch
    ///
    /// # Returns
    ///
    /// * `Ok(UrlBacklog)` - Normalized item URLs in feed order
    /// * `Err(HarvestError)` - The first fetch or extraction failure, unretried
    pub async fn run(
        &self,
        fetcher: &dyn PageFetcher,
        start_page: u32,
        last_page: u32,
    ) -> Result<UrlBacklog, HarvestError> {
        let mut backlog = UrlBacklog::new();
        let mut page_number = start_page;

        while page_number <= last_page {
            if self.cancel.is_cancelled() {
                tracing::info!("Pagination cancelled before page {}", page_number);
                break;
            }

            let url = self.template.build(&self.search_term, page_number);
            tracing::debug!("Fetching feed page {}: {}", page_number, url);

            let page = fetcher.fetch(&url).await?;
            let listing = self
                .extractor
                .extract_feed(&page)
                .map_err(|source| HarvestError::Extract {
                    url: url.clone(),
                    source,
                })?;
            backlog.record_page();

            if listing.result_count == 0 {
                tracing::info!("Feed page {} reports no results, pagination complete", page_number);
                return Ok(backlog);
            }

            let found = listing.item_urls.len();
            for item_url in listing.item_urls {
                backlog.push(normalize_item_url(&item_url));
            }
            tracing::debug!(
                "Feed page {}: {} items ({} results reported)",
                page_number,
                found,
                listing.result_count
            );

            if page_number == last_page {
                tracing::info!("Reached last page {}, pagination complete", last_page);
                break;
            }
            page_number += 1;
        }

        Ok(backlog)
    }
}
