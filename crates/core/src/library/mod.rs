//! Library index - the catalog of accepted image assets.
//!
//! Each asset is an image file under the library root plus a metadata row.
//! Aggregates (totals, per-category and per-topic counts) are always computed
//! from the live rows so external deletions are reflected immediately.

mod naming;
mod sqlite;
mod types;

pub use naming::{slugify, truncate_slug};
pub use sqlite::SqliteLibrary;
pub use types::*;

use std::collections::HashMap;

/// Trait for library index storage.
pub trait LibraryIndex: Send + Sync {
    /// Write the asset's bytes under a unique path and record its metadata.
    fn add(&self, asset: NewAsset) -> Result<Asset, LibraryError>;

    /// Get an asset by ID.
    fn get(&self, id: &str) -> Result<Asset, LibraryError>;

    /// Remove an asset's record and file, returning what was removed.
    fn remove(&self, id: &str) -> Result<Asset, LibraryError>;

    /// List assets, newest first.
    fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>, LibraryError>;

    /// Number of assets per topic.
    fn count_by_topic(&self) -> Result<HashMap<String, u64>, LibraryError>;

    /// Number of assets for one topic.
    fn count_for_topic(&self, topic: &str) -> Result<u64, LibraryError>;

    /// Aggregate statistics.
    fn stats(&self) -> Result<LibraryStats, LibraryError>;
}
