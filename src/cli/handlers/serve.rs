//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::cache::RemoteLocation;
use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the server, or only validate the configuration when `dry_run` is set.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Cache, provider or bind failures during startup
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }

        Server::new(self.config.clone()).run().await?;
        Ok(())
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Cache: {}", self.describe_cache());
        println!("✓ Provider: {}", self.config.provider.quote_base_url);
        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    fn describe_cache(&self) -> String {
        let cache = &self.config.cache;
        if !cache.is_active() {
            return "disabled".to_string();
        }
        let backend = if RemoteLocation::is_remote(&cache.dir) {
            "remote"
        } else {
            "local"
        };
        format!("{} store at {} (ttl {}s)", backend, cache.dir, cache.ttl_seconds)
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_handler_new() {
        let config = Settings::default();
        let handler = ServeCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run() {
        let handler = ServeCommandHandler::new(Settings::default());
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run_invalid_config() {
        let mut config = Settings::default();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config);

        let err = handler.execute(true).await.unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_describe_cache() {
        let mut config = Settings::default();
        assert_eq!(ServeCommandHandler::new(config.clone()).describe_cache(), "disabled");

        config.cache.ttl_seconds = 60;
        config.cache.dir = "gs://bucket/tickers".to_string();
        assert_eq!(
            ServeCommandHandler::new(config).describe_cache(),
            "remote store at gs://bucket/tickers (ttl 60s)"
        );
    }
}
