//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use reqwest::Url;

use crate::cache::RemoteLocation;
use crate::config::error::ConfigError;
use crate::config::settings::{
    CacheConfig, FileSettings, LoggerSettings, ProviderConfig, RemoteAuth, ServerConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// The level may be a full `EnvFilter` directive; only its first segment
    /// must be a plain level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.level.split(',').next().unwrap_or_default().trim();
        if !VALID_LOG_LEVELS.contains(&base.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache configuration
    ///
    /// # Validation Rules
    /// - `dir` must not be empty
    /// - A `gs://` location must name a bucket
    /// - The remote endpoint must be an absolute URL
    /// - `auth = "token"` requires a non-empty `access_token`
    ///
    /// Remote settings are only checked when `dir` is a remote location.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dir.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.dir",
                "Cache location must be a directory path or a gs://bucket/prefix URI.",
            ));
        }

        if !RemoteLocation::is_remote(&self.dir) {
            return Ok(());
        }

        RemoteLocation::parse(&self.dir).map_err(|e| ConfigError::ValidationError {
            field: "cache.dir".to_string(),
            message: e.to_string(),
        })?;

        Url::parse(&self.remote.endpoint).map_err(|e| ConfigError::ValidationError {
            field: "cache.remote.endpoint".to_string(),
            message: format!("Invalid endpoint '{}': {}", self.remote.endpoint, e),
        })?;

        if self.remote.auth == RemoteAuth::Token && self.remote.access_token.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.remote.access_token",
                "An access token is required when cache.remote.auth is \"token\".",
            ));
        }

        if self.remote.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "cache.remote.timeout_seconds",
                "Remote timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("provider.quote_base_url", &self.quote_base_url),
            ("provider.crumb_url", &self.crumb_url),
            ("provider.cookie_url", &self.cookie_url),
        ] {
            Url::parse(value).map_err(|e| ConfigError::ValidationError {
                field: field.to_string(),
                message: format!("Invalid URL '{}': {}", value, e),
            })?;
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "provider.timeout_seconds",
                "Provider timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.cache.validate()?;
        self.provider.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::RemoteCacheConfig;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {other:?}"),
        }
    }

    // ========================================================================
    // ServerConfig validation tests
    // ========================================================================

    #[test]
    fn test_server_config_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_server_config_invalid_port_zero() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "server.port");
    }

    #[test]
    fn test_server_config_invalid_request_timeout() {
        let config = ServerConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "server.request_timeout"
        );
    }

    // ========================================================================
    // LoggerSettings validation tests
    // ========================================================================

    #[test]
    fn test_logger_settings_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");
    }

    #[test]
    fn test_logger_settings_directive_level() {
        let settings = LoggerSettings {
            level: "info,ticker_info::cache=debug".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_logger_settings_file_without_path() {
        let settings = LoggerSettings {
            file: FileSettings {
                enabled: true,
                path: "  ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "logger.file.path"
        );
    }

    // ========================================================================
    // CacheConfig validation tests
    // ========================================================================

    #[test]
    fn test_cache_config_local_dir_valid() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_cache_config_empty_dir() {
        let config = CacheConfig {
            dir: String::new(),
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "cache.dir");
    }

    #[test]
    fn test_cache_config_bucket_required() {
        let config = CacheConfig {
            dir: "gs://".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "cache.dir");
    }

    #[test]
    fn test_cache_config_remote_valid() {
        let config = CacheConfig {
            dir: "gs://tickers/cache".to_string(),
            ttl_seconds: 3_600,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_token_auth_needs_token() {
        let config = CacheConfig {
            dir: "gs://tickers".to_string(),
            remote: RemoteCacheConfig {
                auth: RemoteAuth::Token,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.remote.access_token"
        );
    }

    #[test]
    fn test_cache_config_remote_settings_ignored_for_local_dir() {
        let config = CacheConfig {
            dir: "/var/cache/tickers".to_string(),
            remote: RemoteCacheConfig {
                endpoint: "not a url".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_bad_endpoint() {
        let config = CacheConfig {
            dir: "gs://tickers".to_string(),
            remote: RemoteCacheConfig {
                endpoint: "not a url".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.remote.endpoint"
        );
    }

    // ========================================================================
    // ProviderConfig / Settings validation tests
    // ========================================================================

    #[test]
    fn test_provider_config_bad_url() {
        let config = ProviderConfig {
            crumb_url: "::".to_string(),
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "provider.crumb_url"
        );
    }

    #[test]
    fn test_settings_default_is_valid() {
        assert!(Settings::default().validate().is_ok());
    }
}
