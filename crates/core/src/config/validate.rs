use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Required sections exist (enforced by serde)
/// - Server port is not 0
/// - API credentials are present
/// - Size limits and ingest rate are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.resolver.api_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "resolver.api_token must be set".to_string(),
        ));
    }

    if config.openai.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "openai.api_key must be set".to_string(),
        ));
    }

    if config.download.max_bytes == 0 || config.openai.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "size limits must be greater than 0".to_string(),
        ));
    }

    if config.rate_limit.ingest_requests_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "rate_limit.ingest_requests_per_minute cannot be 0".to_string(),
        ));
    }

    Ok(())
}
