//! Configuration merger for CLI arguments and config files
//!
//! CLI flags sit on top of the layered configuration: files, `TICKER_INFO_*`
//! variables and the plain deployment variables are resolved by
//! [`ConfigLoader`] first, then the flags below are applied and the result is
//! validated again.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};
use std::path::Path;

/// Applies CLI overrides to file-based configuration
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration honoring `--config` and `--env`.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let environment = cli.env.map(Environment::from);
        Self::load(cli.config.as_deref(), environment)
    }

    fn load(config_path: Option<&Path>, environment: Option<Environment>) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;

        if let Some(path) = config_path {
            Self::validate_config_file_access(path)?;
            loader = loader.with_config_file(path);
        }

        if let Some(env) = environment {
            loader = loader.with_environment(env);
        }

        Ok(Self::new(loader.load()?))
    }

    fn validate_config_file_access(path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::file_not_found(path.display().to_string()));
        }

        std::fs::File::open(path).map(|_| ()).map_err(|e| ConfigError::ValidationError {
            field: "config_file".to_string(),
            message: format!("Cannot read configuration file '{}': {}", path.display(), e),
        })
    }

    /// Merge CLI arguments with the base configuration
    ///
    /// Command flags beat global flags, which beat every configuration source.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }
                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.clone().into();
                }
            }
            Commands::Fetch { no_cache, .. } => {
                if *no_cache {
                    config.cache.disabled = true;
                }
            }
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
