use super::{types::Config, ConfigError};

/// Validate configuration beyond what serde enforces.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let parallelism = config.autopilot.parallelism;
    if !(2..=4).contains(&parallelism) {
        return Err(ConfigError::ValidationError(format!(
            "autopilot.parallelism must be between 2 and 4, got {}",
            parallelism
        )));
    }

    if config.autopilot.target_per_topic == 0 {
        return Err(ConfigError::ValidationError(
            "autopilot.target_per_topic must be at least 1".to_string(),
        ));
    }

    if config.autopilot.max_topics == 0 {
        return Err(ConfigError::ValidationError(
            "autopilot.max_topics must be at least 1".to_string(),
        ));
    }

    let empty_key = |key: Option<&str>| key.is_some_and(|k| k.trim().is_empty());
    if empty_key(config.providers.gemini.as_ref().map(|g| g.api_key.as_str()))
        || empty_key(config.providers.openai.as_ref().map(|o| o.api_key.as_str()))
        || empty_key(config.stock.as_ref().map(|s| s.api_key.as_str()))
    {
        return Err(ConfigError::ValidationError(
            "configured providers need a non-empty api_key".to_string(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    let per_page = config.acquisition.per_page_limit;
    if per_page == 0 || per_page > 100 {
        return Err(ConfigError::ValidationError(format!(
            "acquisition.per_page_limit must be between 1 and 100, got {}",
            per_page
        )));
    }

    if config.acquisition.search_term.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "acquisition.search_term cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_parallelism_bounds() {
        let mut config = Config::default();
        config.autopilot.parallelism = 1;
        assert!(validate_config(&config).is_err());
        config.autopilot.parallelism = 5;
        assert!(validate_config(&config).is_err());
        config.autopilot.parallelism = 2;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_target_fails() {
        let mut config = Config::default();
        config.autopilot.target_per_topic = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_per_page_limit() {
        let mut config = Config::default();
        config.acquisition.per_page_limit = 0;
        assert!(validate_config(&config).is_err());
        config.acquisition.per_page_limit = 101;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_blank_search_term() {
        let mut config = Config::default();
        config.acquisition.search_term = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_provider_key_fails() {
        let mut config = Config::default();
        config.providers.gemini = Some(
            serde_json::from_value(serde_json::json!({ "api_key": "  " })).unwrap(),
        );
        assert!(validate_config(&config).is_err());

        config.providers.gemini =
            Some(serde_json::from_value(serde_json::json!({ "api_key": "k" })).unwrap());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_max_topics_zero_fails() {
        let mut config = Config::default();
        config.autopilot.max_topics = 0;
        assert!(validate_config(&config).is_err());
    }
}
