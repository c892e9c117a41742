//! Mock image provider for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::fixtures;
use crate::generator::{GenerationError, ImageProvider, ProviderKind};

/// A recorded provider call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    /// The prompt that was sent.
    pub prompt: String,
    /// When the call started (tokio clock, so paused-time tests work).
    pub at: tokio::time::Instant,
}

/// Mock implementation of the ImageProvider trait.
///
/// Each call consumes the next queued error if any, otherwise fails with the
/// default error if one is set, otherwise returns the default bytes.
///
/// # Example
///
/// ```rust,ignore
/// use mirage_core::testing::MockImageProvider;
///
/// let provider = MockImageProvider::new(ProviderKind::Gemini);
/// provider.push_error(GenerationError::RateLimited("429".into())).await;
///
/// // First call fails, second succeeds.
/// assert!(provider.generate("p").await.is_err());
/// assert!(provider.generate("p").await.is_ok());
/// assert_eq!(provider.call_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockImageProvider {
    kind: ProviderKind,
    /// Errors returned by the next calls, in order.
    queued_errors: Arc<RwLock<VecDeque<GenerationError>>>,
    /// Error returned once the queue is drained.
    default_error: Arc<RwLock<Option<GenerationError>>>,
    /// Payload returned on success.
    bytes: Arc<RwLock<Vec<u8>>>,
    /// Simulated latency per call.
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<Vec<RecordedGeneration>>>,
}

impl MockImageProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            queued_errors: Arc::new(RwLock::new(VecDeque::new())),
            default_error: Arc::new(RwLock::new(None)),
            bytes: Arc::new(RwLock::new(fixtures::image_bytes())),
            delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue an error for the next unanswered call.
    pub async fn push_error(&self, error: GenerationError) {
        self.queued_errors.write().await.push_back(error);
    }

    /// Fail every call (after queued errors) with this error.
    pub async fn set_default_error(&self, error: GenerationError) {
        *self.default_error.write().await = Some(error);
    }

    /// Stop failing by default.
    pub async fn clear_default_error(&self) {
        *self.default_error.write().await = None;
    }

    /// Set the payload returned on success.
    pub async fn set_default_bytes(&self, bytes: Vec<u8>) {
        *self.bytes.write().await = bytes;
    }

    /// Simulate provider latency.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn calls(&self) -> Vec<RecordedGeneration> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        self.calls.write().await.push(RecordedGeneration {
            prompt: prompt.to_string(),
            at: tokio::time::Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.queued_errors.write().await.pop_front() {
            return Err(error);
        }
        if let Some(error) = self.default_error.read().await.clone() {
            return Err(error);
        }
        Ok(self.bytes.read().await.clone())
    }
}
