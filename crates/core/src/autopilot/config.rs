//! Autopilot configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the autopilot scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutopilotConfig {
    /// Images wanted per topic.
    #[serde(default = "default_target")]
    pub target_per_topic: u64,

    /// Images requested per round (2-4). Also sizes the worker pool.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Pause after every round (milliseconds).
    #[serde(default = "default_round_delay")]
    pub round_delay_ms: u64,

    /// Topics taken from the backlog per run.
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,

    /// Place name woven into prompts, tags and filenames.
    #[serde(default = "default_destination")]
    pub destination: String,
}

fn default_target() -> u64 {
    100
}

fn default_parallelism() -> usize {
    4
}

fn default_round_delay() -> u64 {
    3000 // 3 seconds
}

fn default_max_topics() -> usize {
    50
}

fn default_destination() -> String {
    "Dubai".to_string()
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            target_per_topic: default_target(),
            parallelism: default_parallelism(),
            round_delay_ms: default_round_delay(),
            max_topics: default_max_topics(),
            destination: default_destination(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutopilotConfig::default();
        assert_eq!(config.target_per_topic, 100);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.round_delay_ms, 3000);
        assert_eq!(config.max_topics, 50);
        assert_eq!(config.destination, "Dubai");
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            target_per_topic = 20
            parallelism = 2
        "#;
        let config: AutopilotConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.target_per_topic, 20);
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.round_delay_ms, 3000);
    }
}
