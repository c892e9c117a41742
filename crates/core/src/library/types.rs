//! Library types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    Generated,
    Stock,
}

impl AssetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSource::Generated => "generated",
            AssetSource::Stock => "stock",
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetSource {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generated" => Ok(AssetSource::Generated),
            "stock" => Ok(AssetSource::Stock),
            other => Err(LibraryError::Database(format!(
                "unknown asset source '{}'",
                other
            ))),
        }
    }
}

/// An asset to be added to the library.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub source: AssetSource,
    pub topic: String,
    pub category: String,
    /// Image type for generated assets, `stock` for catalog downloads.
    pub image_type: String,
    pub style: Option<String>,
    pub provider: Option<String>,
    /// Originating catalog ID (stock only).
    pub external_id: Option<String>,
    pub prompt: Option<String>,
    /// Original catalog title (stock only).
    pub title: Option<String>,
    /// Catalog page URL (stock only).
    pub source_url: Option<String>,
    pub tags: Vec<String>,
    /// Directory relative to the library root.
    pub relative_dir: PathBuf,
    /// Preferred filename; a counter is appended on collision.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub source: AssetSource,
    pub topic: String,
    pub category: String,
    pub image_type: String,
    pub style: Option<String>,
    pub provider: Option<String>,
    pub external_id: Option<String>,
    pub prompt: Option<String>,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub tags: Vec<String>,
    /// Path relative to the library root, `/` separated. Unique.
    pub path: String,
    pub filename: String,
    /// SHA-256 of the file contents, hex encoded.
    pub content_hash: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<AssetSource>,
    /// Maximum results (default: 100).
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Library statistics, recomputed on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total: u64,
    pub total_size_bytes: u64,
    pub topics: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
}

/// Errors from the library index.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset path: {0}")]
    InvalidPath(String),
}
