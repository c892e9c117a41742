//! Stock photo catalog integration.
//!
//! Search, download-URL resolution, and payload fetching against a
//! third-party catalog, with HTTP outcomes mapped to [`StockCatalogError`].

mod freepik;
mod types;

pub use freepik::{FreepikClient, FreepikConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Payloads at or below this size must declare an image or archive type.
pub const MIN_PAYLOAD_BYTES: usize = 1000;

/// Errors that can occur when talking to the stock catalog.
#[derive(Debug, Error)]
pub enum StockCatalogError {
    /// API key rejected (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded (429).
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimited,

    /// Licence does not allow the download (403).
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Downloaded body is not an image.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Any other non-success status.
    #[error("Remote error: {status} - {message}")]
    RemoteError { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl StockCatalogError {
    /// Errors that make every further request pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StockCatalogError::Unauthorized(_) | StockCatalogError::NotConfigured(_)
        )
    }
}

/// Map a non-success status to an error. `context` names what was requested.
pub fn status_error(status: u16, context: &str, body: String) -> StockCatalogError {
    match status {
        401 => StockCatalogError::Unauthorized(format!("invalid API key ({})", context)),
        429 => StockCatalogError::RateLimited,
        403 => StockCatalogError::AccessDenied(context.to_string()),
        404 => StockCatalogError::NotFound(context.to_string()),
        _ => StockCatalogError::RemoteError {
            status,
            message: body.chars().take(200).collect(),
        },
    }
}

/// Accept a payload if it declares an image/archive content type or is
/// larger than [`MIN_PAYLOAD_BYTES`].
pub fn validate_payload(
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<(), StockCatalogError> {
    let declared = content_type
        .map(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("image") || ct.contains("zip")
        })
        .unwrap_or(false);

    if declared || bytes.len() > MIN_PAYLOAD_BYTES {
        Ok(())
    } else {
        Err(StockCatalogError::InvalidPayload(format!(
            "content type {:?}, {} bytes",
            content_type.unwrap_or("none"),
            bytes.len()
        )))
    }
}

/// Trait for stock catalog clients.
#[async_trait]
pub trait StockCatalog: Send + Sync {
    /// Search one page of photo resources.
    async fn search(
        &self,
        query: &str,
        limit: u32,
        page: u32,
    ) -> Result<SearchPage, StockCatalogError>;

    /// Resolve the signed download URL for a resource.
    async fn resolve_download_url(&self, resource_id: &str) -> Result<String, StockCatalogError>;

    /// Fetch and validate the payload at a download URL.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StockCatalogError>;
}
