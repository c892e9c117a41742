//! Freepik stock catalog client.
//!
//! Freepik requires an API key passed in the `x-freepik-api-key` header.
//! Download URLs are signed and short-lived, so they are resolved per item.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{status_error, validate_payload, SearchPage, StockCatalog, StockCatalogError, StockResource};

/// Freepik API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreepikConfig {
    pub api_key: String,
    /// Base URL (default: https://api.freepik.com/v1).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout for API calls in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Timeout for payload downloads in seconds (default: 60).
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.freepik.com/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_download_timeout() -> u64 {
    60
}

/// Freepik API client.
pub struct FreepikClient {
    client: Client,
    base_url: String,
    api_key: String,
    download_timeout: Duration,
}

impl FreepikClient {
    pub fn new(config: FreepikConfig) -> Result<Self, StockCatalogError> {
        if config.api_key.is_empty() {
            return Err(StockCatalogError::NotConfigured(
                "Freepik API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResourcesResponse {
    #[serde(default)]
    data: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    tags: Vec<Value>,
}

impl From<RawResource> for StockResource {
    fn from(raw: RawResource) -> Self {
        let id = match raw.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        // Tags come back either as plain strings or as {"name": ...} objects.
        let tags = raw
            .tags
            .into_iter()
            .filter_map(|t| match t {
                Value::String(s) => Some(s),
                Value::Object(map) => map.get("name").and_then(|n| n.as_str()).map(String::from),
                _ => None,
            })
            .collect();

        Self {
            id,
            title: raw.title,
            url: raw.url,
            tags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    data: DownloadData,
}

#[derive(Debug, Deserialize)]
struct DownloadData {
    signed_url: Option<String>,
    url: Option<String>,
}

fn parse_search(body: &str, page: u32) -> Result<SearchPage, StockCatalogError> {
    let response: ResourcesResponse = serde_json::from_str(body).map_err(|e| {
        StockCatalogError::ParseError(format!("Failed to parse search response: {}", e))
    })?;

    Ok(SearchPage {
        page,
        resources: response.data.into_iter().map(Into::into).collect(),
    })
}

fn parse_download_url(body: &str, resource_id: &str) -> Result<String, StockCatalogError> {
    let response: DownloadResponse = serde_json::from_str(body).map_err(|e| {
        StockCatalogError::ParseError(format!("Failed to parse download response: {}", e))
    })?;

    response
        .data
        .signed_url
        .or(response.data.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            StockCatalogError::ParseError(format!("No download URL for resource {}", resource_id))
        })
}

#[async_trait]
impl StockCatalog for FreepikClient {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        page: u32,
    ) -> Result<SearchPage, StockCatalogError> {
        let url = format!("{}/resources", self.base_url);

        debug!("Freepik search: term='{}', limit={}, page={}", query, limit, page);

        let response = self
            .client
            .get(&url)
            .header("x-freepik-api-key", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("term", query.to_string()),
                ("limit", limit.to_string()),
                ("page", page.to_string()),
                ("filters[content_type][photo]", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &format!("search page {}", page), body));
        }

        let body = response.text().await?;
        parse_search(&body, page)
    }

    async fn resolve_download_url(&self, resource_id: &str) -> Result<String, StockCatalogError> {
        let url = format!("{}/resources/{}/download", self.base_url, resource_id);

        debug!("Freepik resolve download: id={}", resource_id);

        let response = self
            .client
            .get(&url)
            .header("x-freepik-api-key", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("image_size", "large")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(
                status.as_u16(),
                &format!("download {}", resource_id),
                body,
            ));
        }

        let body = response.text().await?;
        parse_download_url(&body, resource_id)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StockCatalogError> {
        if url.is_empty() {
            return Err(StockCatalogError::InvalidPayload(
                "empty download URL".to_string(),
            ));
        }

        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), "payload", body));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?.to_vec();

        validate_payload(content_type.as_deref(), &bytes)?;
        Ok(bytes)
    }
}
