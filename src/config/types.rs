use crate::marketplace::MarketplaceProfile;
use serde::Deserialize;

/// Main configuration structure for Marketplace Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    /// Custom marketplace selector tables
    #[serde(default, rename = "marketplace")]
    pub marketplaces: Vec<MarketplaceProfile>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Name of the marketplace profile to use
    pub marketplace: String,

    /// Search term substituted into the feed URL
    #[serde(rename = "search-term")]
    pub search_term: String,

    /// First feed page to fetch
    #[serde(rename = "start-page")]
    pub start_page: u32,

    /// Last feed page to fetch (inclusive)
    #[serde(rename = "last-page")]
    pub last_page: u32,

    /// Number of concurrent item workers
    pub workers: usize,

    /// Drop duplicate item URLs before partitioning
    #[serde(default = "default_dedupe")]
    pub dedupe: bool,

    /// Delay before retrying an item whose fields were missing (milliseconds)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Record storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON file per item
    Json,
    /// One row per item in a SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Directory receiving JSON record files
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Path to the SQLite database file (sqlite format only)
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,
}

fn default_dedupe() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_format() -> OutputFormat {
    OutputFormat::Json
}

fn default_directory() -> String {
    ".".to_string()
}
