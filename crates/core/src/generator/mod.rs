//! Image generation: provider clients, bounded retry, and parallel fan-out.
//!
//! A [`ParallelDispatcher`] spreads a batch of requests over the configured
//! providers, each request running through a [`RetryingInvoker`] on its own
//! task.

mod config;
mod dispatcher;
mod gemini;
mod openai;
mod retry;
mod types;

pub use config::RetryConfig;
pub use dispatcher::ParallelDispatcher;
pub use gemini::{GeminiClient, GeminiConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use retry::RetryingInvoker;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Classified failure of a single provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Provider asked us to slow down. Retried with exponential backoff.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Account budget is spent. Never retried; stops the running loop.
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Network trouble or a provider-side 5xx.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The response arrived but carried no usable image.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Credentials rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No provider available for the request.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl GenerationError {
    /// Whether this error must unwind the running loop instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenerationError::QuotaExhausted(_)
                | GenerationError::Unauthorized(_)
                | GenerationError::NotConfigured(_)
        )
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            GenerationError::RateLimited(_) => "rate_limited",
            GenerationError::QuotaExhausted(_) => "quota_exhausted",
            GenerationError::Transient(_) => "transient",
            GenerationError::Malformed(_) => "malformed",
            GenerationError::Unauthorized(_) => "unauthorized",
            GenerationError::NotConfigured(_) => "not_configured",
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GenerationError::Malformed(e.to_string())
        } else {
            GenerationError::Transient(e.to_string())
        }
    }
}

/// Body markers that mean the account has no budget left, whatever the status.
const QUOTA_MARKERS: &[&str] = &[
    "FREE_CLOUD_BUDGET_EXCEEDED",
    "insufficient_quota",
    "billing_hard_limit",
];

/// Map a non-success HTTP response from a provider to a [`GenerationError`].
pub fn classify_response(status: u16, body: &str) -> GenerationError {
    let message = truncate_body(body);

    if status == 402 || QUOTA_MARKERS.iter().any(|m| body.contains(m)) {
        return GenerationError::QuotaExhausted(message);
    }

    match status {
        429 => GenerationError::RateLimited(message),
        401 | 403 => GenerationError::Unauthorized(message),
        408 | 500..=599 => GenerationError::Transient(format!("HTTP {}: {}", status, message)),
        _ => GenerationError::Malformed(format!("HTTP {}: {}", status, message)),
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}

/// A single external image generation provider.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Which provider family this is.
    fn kind(&self) -> ProviderKind;

    /// Generate one image for the prompt. Makes exactly one network call
    /// (plus a payload download for providers that answer with a URL).
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;
}
