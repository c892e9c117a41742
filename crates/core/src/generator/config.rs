//! Retry configuration for provider calls.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy applied to every provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for rate-limit backoff (milliseconds).
    /// Attempt `n` (zero based) sleeps `base * 2^n`.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Fixed delay after transient or malformed failures (milliseconds).
    #[serde(default = "default_transient_delay")]
    pub transient_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    5000 // 5 seconds
}

fn default_transient_delay() -> u64 {
    2000 // 2 seconds
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            transient_delay_ms: default_transient_delay(),
        }
    }
}

impl RetryConfig {
    /// Backoff after a rate-limited attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Delay after a transient or malformed attempt.
    pub fn transient_delay(&self) -> Duration {
        Duration::from_millis(self.transient_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 5000);
        assert_eq!(config.transient_delay_ms, 2000);
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_delay(0), Duration::from_secs(5));
        assert_eq!(config.backoff_delay(1), Duration::from_secs(10));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(20));
    }

    #[test]
    fn test_backoff_saturates() {
        let config = RetryConfig {
            base_delay_ms: u64::MAX / 2,
            ..Default::default()
        };
        assert_eq!(config.backoff_delay(40), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RetryConfig = toml::from_str("max_attempts = 5").unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay_ms, 5000);
    }
}
