//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building HTTP clients with a proper user agent string and timeouts
//! - GET requests returning the page body for any HTTP status
//! - Classifying transport failures (timeout, connect, other)
//!
//! Every [`HttpSessionFactory::open`] call builds a fresh client, so each
//! worker gets its own connection pool and cookie-free session.

use crate::config::{FetchConfig, UserAgentConfig};
use crate::crawler::traits::{FetchError, Page, PageFetcher, SessionFactory};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Formats the user agent string: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetch` - Timeout configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use marketplace_harvester::config::{FetchConfig, UserAgentConfig};
/// use marketplace_harvester::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "MarketplaceHarvester".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(user_agent))
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A fetcher session backed by its own reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a URL and returns its body
    ///
    /// Any HTTP status yields a page, the way a browser renders error pages:
    /// placeholder pages are recognized by the extractor, not by status code.
    /// Only transport failures are errors.
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            tracing::debug!("HTTP {} for {}", status, url);
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(Page {
            url: url.to_string(),
            status,
            body,
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Opens one [`HttpFetcher`] per call
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    user_agent: UserAgentConfig,
    fetch: FetchConfig,
}

impl HttpSessionFactory {
    pub fn new(user_agent: UserAgentConfig, fetch: FetchConfig) -> Self {
        Self { user_agent, fetch }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
        let client = build_http_client(&self.user_agent, &self.fetch)
            .map_err(|e| FetchError::Session(e.to_string()))?;
        Ok(Box::new(HttpFetcher::new(client)))
    }
}
