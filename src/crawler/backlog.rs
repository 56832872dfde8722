//! Item URL backlog
//!
//! [`UrlBacklog`] is filled by the paginator during phase one. At the phase
//! barrier it is frozen into a [`FrozenBacklog`], an immutable shared slice
//! that every worker reads without synchronization.

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

/// Append-only, ordered list of item URLs discovered during pagination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBacklog {
    urls: Vec<String>,
    pages_fetched: u32,
}

impl UrlBacklog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: String) {
        self.urls.push(url);
    }

    pub(crate) fn record_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Number of feed pages fetched while building this backlog
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Freezes the backlog for phase two
    ///
    /// With `dedupe`, later repeats of a URL are dropped and first
    /// occurrences keep their relative order.
    pub fn freeze(self, dedupe: bool) -> FrozenBacklog {
        let urls = if dedupe {
            let mut seen = HashSet::with_capacity(self.urls.len());
            self.urls
                .into_iter()
                .filter(|url| seen.insert(url.clone()))
                .collect::<Vec<_>>()
        } else {
            self.urls
        };

        FrozenBacklog {
            urls: Arc::from(urls),
        }
    }
}

/// Immutable snapshot of the backlog, cheap to clone into each worker
#[derive(Debug, Clone)]
pub struct FrozenBacklog {
    urls: Arc<[String]>,
}

impl From<Vec<String>> for FrozenBacklog {
    fn from(urls: Vec<String>) -> Self {
        Self {
            urls: Arc::from(urls),
        }
    }
}

impl Deref for FrozenBacklog {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.urls
    }
}
