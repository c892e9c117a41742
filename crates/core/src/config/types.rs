use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::acquisition::AcquisitionConfig;
use crate::autopilot::AutopilotConfig;
use crate::generator::{GeminiConfig, OpenAiConfig, RetryConfig};
use crate::stock::FreepikConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Stock catalog credentials. Bulk acquisition is unavailable without it.
    #[serde(default)]
    pub stock: Option<FreepikConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub autopilot: AutopilotConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration (library index and checkpoint documents).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("mirage.db")
}

/// Where image files are written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default = "default_library_root")]
    pub root: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
        }
    }
}

fn default_library_root() -> PathBuf {
    PathBuf::from("data/library")
}

/// Generation provider credentials. Either may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub library: LibraryConfig,
    pub providers: SanitizedProvidersConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<SanitizedStockConfig>,
    pub retry: RetryConfig,
    pub autopilot: AutopilotConfig,
    pub acquisition: AcquisitionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<SanitizedProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<SanitizedProviderConfig>,
}

/// Provider config with the API key hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub model: String,
    pub api_key_configured: bool,
}

/// Stock catalog config with the API key hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStockConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            library: config.library.clone(),
            providers: SanitizedProvidersConfig {
                gemini: config.providers.gemini.as_ref().map(|g| SanitizedProviderConfig {
                    model: g.model.clone(),
                    api_key_configured: !g.api_key.is_empty(),
                }),
                openai: config.providers.openai.as_ref().map(|o| SanitizedProviderConfig {
                    model: o.model.clone(),
                    api_key_configured: !o.api_key.is_empty(),
                }),
            },
            stock: config.stock.as_ref().map(|s| SanitizedStockConfig {
                base_url: s.base_url.clone(),
                api_key_configured: !s.api_key.is_empty(),
                timeout_secs: s.timeout_secs,
            }),
            retry: config.retry.clone(),
            autopilot: config.autopilot.clone(),
            acquisition: config.acquisition.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "mirage.db");
        assert_eq!(config.library.root.to_str().unwrap(), "data/library");
        assert!(config.providers.gemini.is_none());
        assert!(config.providers.openai.is_none());
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_deserialize_providers() {
        let toml = r#"
[providers.gemini]
api_key = "g-key"

[providers.openai]
api_key = "o-key"
model = "gpt-image-1-mini"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let gemini = config.providers.gemini.unwrap();
        assert_eq!(gemini.api_key, "g-key");
        assert_eq!(gemini.model, "gemini-2.5-flash-image");
        let openai = config.providers.openai.unwrap();
        assert_eq!(openai.model, "gpt-image-1-mini");
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let toml = r#"
[providers.gemini]
api_key = "secret-gemini"

[stock]
api_key = "secret-stock"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-gemini"));
        assert!(!json.contains("secret-stock"));

        assert!(sanitized.providers.gemini.unwrap().api_key_configured);
        assert!(sanitized.providers.openai.is_none());
        assert!(sanitized.stock.unwrap().api_key_configured);
    }
}
