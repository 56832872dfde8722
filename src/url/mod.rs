//! URL handling for marketplace feeds and item pages
//!
//! This module provides item URL normalization, item id derivation and
//! feed URL construction from a marketplace's template.

mod normalize;
mod template;

// Re-export main functions
pub use normalize::{derive_item_id, normalize_item_url};
pub use template::FeedUrlTemplate;
