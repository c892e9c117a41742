//! Bounded retry around a single provider call.

use std::time::Instant;

use tracing::{debug, warn};

use super::{GenerationError, ImageProvider, RetryConfig};
use crate::metrics;

/// Runs provider calls under a [`RetryConfig`].
///
/// - `RateLimited` sleeps `base * 2^attempt` and retries.
/// - `Transient` and `Malformed` sleep the fixed delay and retry.
/// - Fatal errors return immediately without sleeping.
/// - No sleep follows the final attempt; its error is returned as-is.
#[derive(Debug, Clone)]
pub struct RetryingInvoker {
    config: RetryConfig,
}

impl RetryingInvoker {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn invoke(
        &self,
        provider: &dyn ImageProvider,
        prompt: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        let kind = provider.kind();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let started = Instant::now();
            let result = provider.generate(prompt).await;
            metrics::GENERATION_DURATION
                .with_label_values(&[kind.as_str()])
                .observe(started.elapsed().as_secs_f64());

            let error = match result {
                Ok(bytes) if !bytes.is_empty() => {
                    metrics::GENERATION_ATTEMPTS
                        .with_label_values(&[kind.as_str(), "success"])
                        .inc();
                    debug!(provider = %kind, attempt, size = bytes.len(), "Generation succeeded");
                    return Ok(bytes);
                }
                Ok(_) => GenerationError::Malformed("empty image payload".to_string()),
                Err(e) => e,
            };

            metrics::GENERATION_ATTEMPTS
                .with_label_values(&[kind.as_str(), error.label()])
                .inc();

            if error.is_fatal() {
                warn!(provider = %kind, attempt, error = %error, "Fatal generation error");
                return Err(error);
            }

            attempt += 1;
            if attempt >= max_attempts {
                warn!(
                    provider = %kind,
                    attempts = attempt,
                    error = %error,
                    "Generation failed after all attempts"
                );
                return Err(error);
            }

            let delay = match error {
                GenerationError::RateLimited(_) => self.config.backoff_delay(attempt - 1),
                _ => self.config.transient_delay(),
            };
            debug!(
                provider = %kind,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying generation"
            );
            metrics::GENERATION_RETRIES
                .with_label_values(&[kind.as_str()])
                .inc();
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ProviderKind;
    use crate::testing::MockImageProvider;
    use std::time::Duration;

    fn invoker() -> RetryingInvoker {
        RetryingInvoker::new(RetryConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let provider = MockImageProvider::new(ProviderKind::Gemini);
        let start = tokio::time::Instant::now();

        let bytes = invoker().invoke(&provider, "a prompt").await.unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(provider.call_count().await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_backs_off_exponentially() {
        let provider = MockImageProvider::new(ProviderKind::Gemini);
        provider
            .set_default_error(GenerationError::RateLimited("429".into()))
            .await;
        let start = tokio::time::Instant::now();

        let err = invoker().invoke(&provider, "a prompt").await.unwrap_err();

        assert!(matches!(err, GenerationError::RateLimited(_)));
        assert!(!err.is_fatal());

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1].at - calls[0].at;
        let second_gap = calls[2].at - calls[1].at;
        assert_eq!(first_gap, Duration::from_secs(5));
        assert_eq!(second_gap, Duration::from_secs(10));
        assert!(second_gap > first_gap);
        // No sleep after the last attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exhausted_is_immediate() {
        let provider = MockImageProvider::new(ProviderKind::OpenAi);
        provider
            .push_error(GenerationError::QuotaExhausted("budget".into()))
            .await;
        let start = tokio::time::Instant::now();

        let err = invoker().invoke(&provider, "a prompt").await.unwrap_err();

        assert!(matches!(err, GenerationError::QuotaExhausted(_)));
        assert!(err.is_fatal());
        assert_eq!(provider.call_count().await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_then_success() {
        let provider = MockImageProvider::new(ProviderKind::Gemini);
        provider
            .push_error(GenerationError::Transient("reset".into()))
            .await;
        let start = tokio::time::Instant::now();

        let result = invoker().invoke(&provider, "a prompt").await;

        assert!(result.is_ok());
        assert_eq!(provider.call_count().await, 2);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_payload_counts_as_malformed() {
        let provider = MockImageProvider::new(ProviderKind::Gemini);
        provider.set_default_bytes(Vec::new()).await;

        let err = invoker().invoke(&provider, "a prompt").await.unwrap_err();

        assert!(matches!(err, GenerationError::Malformed(_)));
        assert_eq!(provider.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_sleeps() {
        let provider = MockImageProvider::new(ProviderKind::Gemini);
        provider
            .set_default_error(GenerationError::RateLimited("429".into()))
            .await;
        let invoker = RetryingInvoker::new(RetryConfig {
            max_attempts: 1,
            ..Default::default()
        });
        let start = tokio::time::Instant::now();

        assert!(invoker.invoke(&provider, "p").await.is_err());
        assert_eq!(provider.call_count().await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
