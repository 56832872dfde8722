//! Output module: record persistence and harvest reporting
//!
//! This module handles:
//! - The [`RecordSink`] trait and its JSON, SQLite and in-memory backends
//! - Selecting a backend from the output configuration
//! - Harvest reports and their console rendering

mod json_sink;
mod memory_sink;
pub mod report;
mod sqlite_sink;
mod traits;

pub use json_sink::JsonFileSink;
pub use memory_sink::MemorySink;
pub use report::{print_report, CrawlReport, DispatchReport, Unprocessed, WorkerReport};
pub use sqlite_sink::SqliteSink;
pub use traits::{RecordSink, SinkError, SinkResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;
use std::sync::Arc;

/// Opens the sink selected by the output configuration
///
/// # Arguments
///
/// * `config` - The output configuration
/// * `marketplace` - Marketplace name used as the record key prefix
///
/// # Returns
///
/// * `Ok(Arc<dyn RecordSink>)` - The opened sink
/// * `Err(SinkError)` - The directory or database could not be opened
pub fn open_sink(config: &OutputConfig, marketplace: &str) -> SinkResult<Arc<dyn RecordSink>> {
    match config.format {
        OutputFormat::Json => Ok(Arc::new(JsonFileSink::new(
            &config.directory,
            marketplace,
        )?)),
        OutputFormat::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                SinkError::Unavailable("database_path is not configured".to_string())
            })?;
            Ok(Arc::new(SqliteSink::new(Path::new(path), marketplace)?))
        }
    }
}
