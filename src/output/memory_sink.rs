//! In-memory record sink
//!
//! Keeps every saved record in order of arrival. Used when embedding the
//! harvester in another program and by the test suites, which inspect it for
//! duplicate saves.

use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::record::ItemRecord;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ItemRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All saved records, in save order
    pub fn records(&self) -> Vec<ItemRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of saves per item id
    pub fn save_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for record in self.records() {
            *counts.entry(record.item_id).or_insert(0) += 1;
        }
        counts
    }
}

impl RecordSink for MemorySink {
    fn save(&self, record: &ItemRecord) -> SinkResult<()> {
        self.records
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory sink".to_string()
    }
}
