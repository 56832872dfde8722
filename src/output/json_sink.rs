//! One JSON file per item
//!
//! Files are named `<marketplace>_<item id>.json` and hold a pretty-printed
//! object with the keys `title`, `description`, `price` and `image path`.

use crate::output::traits::{RecordSink, SinkResult};
use crate::record::ItemRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::Builder;

/// Writes each record to its own JSON file inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    directory: PathBuf,
    marketplace: String,
}

impl JsonFileSink {
    /// Creates the sink, creating `directory` if needed
    pub fn new(directory: impl Into<PathBuf>, marketplace: impl Into<String>) -> SinkResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            marketplace: marketplace.into(),
        })
    }

    /// File name for an item id
    pub fn file_name(&self, item_id: &str) -> String {
        format!("{}_{}.json", self.marketplace, item_id)
    }

    /// Full path of the file holding an item
    pub fn path_for(&self, item_id: &str) -> PathBuf {
        self.directory.join(self.file_name(item_id))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl RecordSink for JsonFileSink {
    fn save(&self, record: &ItemRecord) -> SinkResult<()> {
        let target = self.path_for(&record.item_id);
        let json = serde_json::to_string_pretty(&record.fields)?;

        // Every save stages into its own file beside the target, then renames it over.
        let mut staging = Builder::new()
            .prefix(&format!(".{}.", self.file_name(&record.item_id)))
            .suffix(".tmp")
            .tempfile_in(&self.directory)?;
        staging.write_all(json.as_bytes())?;
        staging.as_file().sync_all()?;
        staging.persist(&target).map_err(|e| e.error)?;

        tracing::trace!("Saved {} to {}", record.item_id, target.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("JSON files in {}", self.directory.display())
    }
}
