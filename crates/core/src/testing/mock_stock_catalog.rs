//! Mock stock catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures;
use crate::stock::{SearchPage, StockCatalog, StockCatalogError, StockResource};

const DOWNLOAD_PREFIX: &str = "mock://download/";

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedStockSearch {
    pub query: String,
    pub limit: u32,
    pub page: u32,
}

/// Mock implementation of the StockCatalog trait.
///
/// Pages that were never set come back empty. Errors configured for a page
/// or a resource fire once and are then cleared, so a rerun sees the
/// recovered catalog. Download URLs have the form `mock://download/{id}`.
#[derive(Debug, Default)]
pub struct MockStockCatalog {
    pages: Arc<RwLock<HashMap<u32, Vec<StockResource>>>>,
    page_errors: Arc<RwLock<HashMap<u32, StockCatalogError>>>,
    resolve_errors: Arc<RwLock<HashMap<String, StockCatalogError>>>,
    fetch_errors: Arc<RwLock<HashMap<String, StockCatalogError>>>,
    searches: Arc<RwLock<Vec<RecordedStockSearch>>>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockStockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resources returned for a page.
    pub async fn set_page(&self, page: u32, resources: Vec<StockResource>) {
        self.pages.write().await.insert(page, resources);
    }

    /// Fail the next search of a page.
    pub async fn fail_page(&self, page: u32, error: StockCatalogError) {
        self.page_errors.write().await.insert(page, error);
    }

    /// Fail the next download URL resolution for a resource.
    pub async fn fail_resolve(&self, resource_id: &str, error: StockCatalogError) {
        self.resolve_errors
            .write()
            .await
            .insert(resource_id.to_string(), error);
    }

    /// Fail the next fetch for a resource.
    pub async fn fail_fetch(&self, resource_id: &str, error: StockCatalogError) {
        self.fetch_errors
            .write()
            .await
            .insert(resource_id.to_string(), error);
    }

    pub async fn recorded_searches(&self) -> Vec<RecordedStockSearch> {
        self.searches.read().await.clone()
    }

    /// Resource IDs whose payload was fetched, in order.
    pub async fn fetched_ids(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl StockCatalog for MockStockCatalog {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        page: u32,
    ) -> Result<SearchPage, StockCatalogError> {
        self.searches.write().await.push(RecordedStockSearch {
            query: query.to_string(),
            limit,
            page,
        });

        if let Some(error) = self.page_errors.write().await.remove(&page) {
            return Err(error);
        }

        let resources = self
            .pages
            .read()
            .await
            .get(&page)
            .map(|r| r.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default();
        Ok(SearchPage { page, resources })
    }

    async fn resolve_download_url(&self, resource_id: &str) -> Result<String, StockCatalogError> {
        if let Some(error) = self.resolve_errors.write().await.remove(resource_id) {
            return Err(error);
        }
        Ok(format!("{}{}", DOWNLOAD_PREFIX, resource_id))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StockCatalogError> {
        let resource_id = url
            .strip_prefix(DOWNLOAD_PREFIX)
            .ok_or_else(|| StockCatalogError::NotFound(url.to_string()))?;

        if let Some(error) = self.fetch_errors.write().await.remove(resource_id) {
            return Err(error);
        }
        self.fetched.write().await.push(resource_id.to_string());
        // Distinct payload per resource so content hashes differ.
        let mut bytes = fixtures::image_bytes();
        bytes.extend_from_slice(resource_id.as_bytes());
        Ok(bytes)
    }
}
