//! Marketplace Harvester: a two-phase concurrent marketplace crawler
//!
//! Phase one walks the search-result feed of a marketplace page by page and
//! collects item URLs. Phase two splits that list statically across a fixed
//! pool of workers, each of which fetches its items, extracts title,
//! description, price and image reference, and persists one record per item.

pub mod config;
pub mod crawler;
pub mod marketplace;
pub mod output;
pub mod record;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction failed for {url}: {source}")]
    Extract {
        url: String,
        source: crawler::ExtractError,
    },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Output error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown marketplace: {0}")]
    UnknownMarketplace(String),

    #[error("Invalid CSS selector for {field}: '{selector}'")]
    InvalidSelector { field: &'static str, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("No item id in URL path: {0}")]
    MissingItemId(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, Coordinator};
pub use marketplace::MarketplaceProfile;
pub use output::CrawlReport;
pub use record::{ItemFields, ItemRecord};
pub use url::{derive_item_id, normalize_item_url};
