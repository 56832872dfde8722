//! Record sink trait and error types
//!
//! A sink persists one [`ItemRecord`] per item, keyed by its item id.
//! Workers call [`RecordSink::save`] concurrently; since every worker owns
//! a disjoint set of item ids, implementations only need to tolerate
//! concurrent writes to different keys.

use crate::record::ItemRecord;
use thiserror::Error;

/// Errors that can occur while persisting a record
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for record persistence backends
///
/// Implementations must be thread-safe: one sink instance is shared by all
/// workers of a harvest. `save` may block on file or database I/O; the
/// worker pool calls it on tokio's blocking thread pool, never on an async
/// worker thread.
pub trait RecordSink: Send + Sync {
    /// Persists a record
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted item; its `item_id` is the storage key
    fn save(&self, record: &ItemRecord) -> SinkResult<()>;

    /// Human-readable location of the stored records, for logs and reports
    fn describe(&self) -> String;
}
