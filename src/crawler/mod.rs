//! Crawler module: the two-phase harvest engine
//!
//! This module contains the core crawling logic, including:
//! - Capability traits for fetcher sessions and extractors
//! - HTTP fetching and selector-driven HTML extraction
//! - Feed pagination into an item backlog (phase one)
//! - The static-partition worker pool (phase two)
//! - Overall harvest coordination

mod backlog;
mod coordinator;
mod fetcher;
mod paginator;
mod parser;
mod traits;
mod worker;

pub use backlog::{FrozenBacklog, UrlBacklog};
pub use coordinator::{run_harvest, Coordinator, HarvestSettings};
pub use fetcher::{build_http_client, user_agent_string, HttpFetcher, HttpSessionFactory};
pub use paginator::FeedPaginator;
pub use parser::{parse_result_count, SelectorExtractor};
pub use traits::{
    ExtractError, FeedExtractor, FeedListing, FetchError, ItemExtractor, Page, PageFetcher,
    SessionFactory,
};
pub use worker::{partition, process_one, ItemFailure, ItemOutcome, WorkerPool};
