//! Stock catalog data types.

use serde::{Deserialize, Serialize};

/// A photo resource listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockResource {
    /// Catalog identity, normalised to a string.
    pub id: String,
    pub title: String,
    /// Public page for the resource.
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: u32,
    pub resources: Vec<StockResource>,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
