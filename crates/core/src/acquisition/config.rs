//! Acquisition configuration.

use serde::{Deserialize, Serialize};

/// Configuration for bulk stock acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Catalog search term.
    #[serde(default = "default_search_term")]
    pub search_term: String,

    /// Pages processed per run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Results requested per page (1-100).
    #[serde(default = "default_per_page_limit")]
    pub per_page_limit: u32,

    /// Pause after each successful download (milliseconds).
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,

    /// Pause between pages (milliseconds).
    #[serde(default)]
    pub page_delay_ms: u64,

    /// Place name added to asset tags.
    #[serde(default = "default_destination")]
    pub destination: String,
}

fn default_search_term() -> String {
    "Dubai".to_string()
}

fn default_max_pages() -> u32 {
    10
}

fn default_per_page_limit() -> u32 {
    50
}

fn default_item_delay() -> u64 {
    2000
}

fn default_destination() -> String {
    "Dubai".to_string()
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            search_term: default_search_term(),
            max_pages: default_max_pages(),
            per_page_limit: default_per_page_limit(),
            item_delay_ms: default_item_delay(),
            page_delay_ms: 0,
            destination: default_destination(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.search_term, "Dubai");
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.per_page_limit, 50);
        assert_eq!(config.item_delay_ms, 2000);
        assert_eq!(config.page_delay_ms, 0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AcquisitionConfig = toml::from_str(r#"search_term = "Dubai Marina""#).unwrap();
        assert_eq!(config.search_term, "Dubai Marina");
        assert_eq!(config.max_pages, 10);
    }
}
