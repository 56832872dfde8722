//! Marketplace selector tables
//!
//! A [`MarketplaceProfile`] holds everything that is specific to one
//! marketplace: its search URL template, the CSS selectors used on feed and
//! item pages, and the title of its "item not found" placeholder page.
//! Profiles are chosen once at startup by name; custom profiles from the
//! configuration file take precedence over the built-in ones.

use crate::url::FeedUrlTemplate;
use crate::ConfigError;
use serde::Deserialize;

/// Selector table for one marketplace
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MarketplaceProfile {
    /// Display name, also used as the record key prefix (e.g. "Ebay")
    pub name: String,

    /// Search URL with `{query}` and `{page}` placeholders
    pub feed_url: String,

    /// Element whose text holds the number of search results
    pub result_count: String,

    /// Item container on feed pages; the first `a[href]` inside is the item link
    pub item_link: String,

    /// Description element on item pages
    pub description: String,

    /// Price element on item pages
    pub price: String,

    /// Image container on item pages; the first `img[src]` inside is used
    pub image: String,

    /// Document title of the placeholder page served for unavailable items
    pub not_found_title: String,
}

impl MarketplaceProfile {
    /// The built-in eBay profile
    pub fn ebay() -> Self {
        Self {
            name: "Ebay".to_string(),
            feed_url: "https://www.ebay.com/sch/i.html?_nkw={query}&_pgn={page}".to_string(),
            result_count: ".srp-controls__count-heading".to_string(),
            item_link: ".s-item__image".to_string(),
            description: ".ux-layout-section__item--table-view".to_string(),
            price: ".x-price-primary".to_string(),
            image: ".ux-image-filmstrip-carousel-item".to_string(),
            not_found_title: "Error Page | eBay".to_string(),
        }
    }

    pub fn feed_template(&self) -> FeedUrlTemplate {
        FeedUrlTemplate::new(self.feed_url.clone())
    }
}

/// Names of the built-in profiles
pub fn builtin_names() -> &'static [&'static str] {
    &["Ebay"]
}

fn builtin(name: &str) -> Option<MarketplaceProfile> {
    match name.to_ascii_lowercase().as_str() {
        "ebay" => Some(MarketplaceProfile::ebay()),
        _ => None,
    }
}

/// Selects a marketplace profile by name (case-insensitive)
///
/// Custom profiles are searched first, then the built-in table.
///
/// # Returns
///
/// * `Ok(MarketplaceProfile)` - The matching profile
/// * `Err(ConfigError::UnknownMarketplace)` - No profile carries that name
///
/// # Examples
///
/// ```
/// use marketplace_harvester::marketplace::profile_for;
///
/// let profile = profile_for("ebay", &[]).unwrap();
/// assert_eq!(profile.name, "Ebay");
/// assert!(profile_for("nowhere", &[]).is_err());
/// ```
pub fn profile_for(
    name: &str,
    custom: &[MarketplaceProfile],
) -> Result<MarketplaceProfile, ConfigError> {
    custom
        .iter()
        .find(|profile| profile.name.eq_ignore_ascii_case(name))
        .cloned()
        .or_else(|| builtin(name))
        .ok_or_else(|| ConfigError::UnknownMarketplace(name.to_string()))
}
