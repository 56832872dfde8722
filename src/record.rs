//! Item records produced by phase two
//!
//! A record is created once per successfully processed item URL and handed
//! to a [`RecordSink`](crate::output::RecordSink) unchanged.

use serde::{Deserialize, Serialize};

/// Fields extracted from an item page
///
/// Serializes to the persisted JSON layout: `title`, `description`, `price`,
/// `image path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFields {
    pub title: String,
    pub description: String,
    pub price: String,
    #[serde(rename = "image path")]
    pub image_ref: String,
}

/// One extracted item, keyed by the id derived from its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Identifier derived from `url`
    pub item_id: String,

    /// Normalized item URL the record was extracted from
    pub url: String,

    pub fields: ItemFields,
}

impl ItemRecord {
    pub fn new(item_id: String, url: String, fields: ItemFields) -> Self {
        Self {
            item_id,
            url,
            fields,
        }
    }

    /// Returns the fields as ordered (name, value) pairs using the persisted key names
    pub fn field_map(&self) -> [(&'static str, &str); 4] {
        [
            ("title", self.fields.title.as_str()),
            ("description", self.fields.description.as_str()),
            ("price", self.fields.price.as_str()),
            ("image path", self.fields.image_ref.as_str()),
        ]
    }
}
