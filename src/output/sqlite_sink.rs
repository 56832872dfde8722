//! SQLite record sink
//!
//! Stores one row per `(marketplace, item_id)`. A repeated id replaces the
//! earlier row, so re-running a harvest refreshes records in place.

use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::record::{ItemFields, ItemRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// SQL schema for the item table
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    marketplace TEXT NOT NULL,
    item_id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    price TEXT NOT NULL,
    image_path TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    PRIMARY KEY (marketplace, item_id)
);
"#;

/// SQLite-backed sink
///
/// rusqlite connections are not `Sync`, so the connection sits behind a
/// mutex. The lock guards the handle, not the key space.
pub struct SqliteSink {
    conn: Mutex<Connection>,
    marketplace: String,
    location: Option<PathBuf>,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path, marketplace: impl Into<String>) -> SinkResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Mutex::new(conn),
            marketplace: marketplace.into(),
            location: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(marketplace: impl Into<String>) -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            marketplace: marketplace.into(),
            location: None,
        })
    }

    fn lock(&self) -> SinkResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SinkError::Unavailable("sqlite connection poisoned".to_string()))
    }

    /// Loads the fields stored for an item id
    pub fn load(&self, item_id: &str) -> SinkResult<Option<ItemFields>> {
        let conn = self.lock()?;
        let fields = conn
            .query_row(
                "SELECT title, description, price, image_path FROM items
                 WHERE marketplace = ?1 AND item_id = ?2",
                params![self.marketplace, item_id],
                |row| {
                    Ok(ItemFields {
                        title: row.get(0)?,
                        description: row.get(1)?,
                        price: row.get(2)?,
                        image_ref: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(fields)
    }

    /// Counts stored items for this marketplace
    pub fn count(&self) -> SinkResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE marketplace = ?1",
            params![self.marketplace],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl RecordSink for SqliteSink {
    fn save(&self, record: &ItemRecord) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO items
                (marketplace, item_id, url, title, description, price, image_path, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.marketplace,
                record.item_id,
                record.url,
                record.fields.title,
                record.fields.description,
                record.fields.price,
                record.fields.image_ref,
                now
            ],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.location {
            Some(path) => format!("SQLite database {}", path.display()),
            None => "in-memory SQLite database".to_string(),
        }
    }
}
