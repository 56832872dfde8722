//! Selector-driven extraction for feed and item pages
//!
//! [`SelectorExtractor`] compiles a [`MarketplaceProfile`]'s CSS selectors
//! once and implements both [`FeedExtractor`] and [`ItemExtractor`]:
//! - Feed pages: result count and item links (resolved to absolute URLs)
//! - Item pages: placeholder detection, title, price, image, description

use crate::crawler::traits::{ExtractError, FeedExtractor, FeedListing, ItemExtractor, Page};
use crate::marketplace::MarketplaceProfile;
use crate::record::ItemFields;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extractor built from one marketplace profile
#[derive(Debug)]
pub struct SelectorExtractor {
    not_found_title: String,
    title: Selector,
    result_count: Selector,
    item_link: Selector,
    anchor: Selector,
    description: Selector,
    price: Selector,
    image: Selector,
    img: Selector,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}

impl SelectorExtractor {
    /// Compiles the selectors of a profile
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorExtractor)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector does not parse
    pub fn new(profile: &MarketplaceProfile) -> Result<Self, ConfigError> {
        Ok(Self {
            not_found_title: profile.not_found_title.clone(),
            title: compile("title", "title")?,
            result_count: compile("result-count", &profile.result_count)?,
            item_link: compile("item-link", &profile.item_link)?,
            anchor: compile("item-link", "a[href]")?,
            description: compile("description", &profile.description)?,
            price: compile("price", &profile.price)?,
            image: compile("image", &profile.image)?,
            img: compile("image", "img[src]")?,
        })
    }

    fn first<'a>(
        &self,
        document: &'a Html,
        selector: &Selector,
        field: &'static str,
    ) -> Result<ElementRef<'a>, ExtractError> {
        document
            .select(selector)
            .next()
            .ok_or(ExtractError::MissingField { field })
    }
}

impl FeedExtractor for SelectorExtractor {
    fn extract_feed(&self, page: &Page) -> Result<FeedListing, ExtractError> {
        let document = Html::parse_document(&page.body);

        let count_text = element_text(self.first(&document, &self.result_count, "result count")?);
        let result_count =
            parse_result_count(&count_text).ok_or_else(|| ExtractError::Malformed {
                field: "result count",
                value: count_text.clone(),
            })?;

        if result_count == 0 {
            return Ok(FeedListing::default());
        }

        let base_url = Url::parse(&page.url).ok();
        let mut item_urls = Vec::new();

        for container in document.select(&self.item_link) {
            let href = container
                .select(&self.anchor)
                .next()
                .and_then(|anchor| anchor.value().attr("href"));

            match href.and_then(|href| resolve_link(href, base_url.as_ref())) {
                Some(url) => item_urls.push(url),
                None => tracing::trace!("Item container without usable link on {}", page.url),
            }
        }

        Ok(FeedListing {
            result_count,
            item_urls,
        })
    }
}

impl ItemExtractor for SelectorExtractor {
    fn extract_item(&self, page: &Page) -> Result<Option<ItemFields>, ExtractError> {
        let document = Html::parse_document(&page.body);

        let title = extract_title(&document, &self.title).unwrap_or_default();
        if title == self.not_found_title {
            return Ok(None);
        }

        let price = element_text(self.first(&document, &self.price, "price")?);

        let image_ref = self
            .first(&document, &self.image, "image")?
            .select(&self.img)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.trim().to_string())
            .ok_or(ExtractError::MissingField { field: "image" })?;

        let description = element_text(self.first(&document, &self.description, "description")?);

        Ok(Some(ItemFields {
            title,
            description,
            price,
            image_ref,
        }))
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html, title_selector: &Selector) -> Option<String> {
    document
        .select(title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Visible text of an element with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the result count from text such as "1,234 results for Rolex"
///
/// The first whitespace-separated token containing a digit is taken and its
/// non-digit characters dropped.
pub fn parse_result_count(text: &str) -> Option<u64> {
    let token = text
        .split_whitespace()
        .find(|token| token.chars().any(|c| c.is_ascii_digit()))?;

    token
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only links, special schemes, and
/// anything that does not resolve to HTTP or HTTPS.
fn resolve_link(href: &str, base_url: Option<&Url>) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("data:")
    {
        return None;
    }

    let absolute = match base_url {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}
