use url::form_urlencoded;

/// Placeholder replaced by the url-encoded search term
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Placeholder replaced by the feed page number
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// A marketplace search URL with `{query}` and `{page}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrlTemplate {
    pattern: String,
}

impl FeedUrlTemplate {
    /// Wraps a template pattern. Validation happens at config load.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Returns true if the pattern carries both placeholders
    pub fn is_complete(&self) -> bool {
        self.pattern.contains(QUERY_PLACEHOLDER) && self.pattern.contains(PAGE_PLACEHOLDER)
    }

    /// Builds the feed URL for a search term and page number
    ///
    /// # Examples
    ///
    /// ```
    /// use marketplace_harvester::url::FeedUrlTemplate;
    ///
    /// let template = FeedUrlTemplate::new("https://www.ebay.com/sch/i.html?_nkw={query}&_pgn={page}");
    /// assert_eq!(
    ///     template.build("rolex submariner", 3),
    ///     "https://www.ebay.com/sch/i.html?_nkw=rolex+submariner&_pgn=3"
    /// );
    /// ```
    pub fn build(&self, search_term: &str, page: u32) -> String {
        let query: String = form_urlencoded::byte_serialize(search_term.as_bytes()).collect();
        self.pattern
            .replace(QUERY_PLACEHOLDER, &query)
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// Feed URLs for the first `limit` pages of `start_page..=last_page`
    ///
    /// Also returns the total page count of the range, which may exceed
    /// what fits in memory as URLs.
    pub fn preview(
        &self,
        search_term: &str,
        start_page: u32,
        last_page: u32,
        limit: usize,
    ) -> (Vec<String>, u64) {
        let total = if last_page < start_page {
            0
        } else {
            u64::from(last_page) - u64::from(start_page) + 1
        };
        let urls = (start_page..=last_page)
            .take(limit)
            .map(|page| self.build(search_term, page))
            .collect();
        (urls, total)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}
