//! Configuration loader for ticker-info
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "TICKER_INFO_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "TICKER_INFO_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "TICKER_INFO";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Plain deployment variables
pub const CACHE_DIR_VAR: &str = "CACHE_DIR";
pub const CACHE_TTL_VAR: &str = "CACHE_TTL";
pub const CACHE_DISABLED_VAR: &str = "CACHE_DISABLED";
pub const PORT_VAR: &str = "PORT";

type Builder = ConfigBuilder<DefaultState>;

/// Configuration loader that handles layered configuration loading
///
/// Sources, lowest to highest priority:
/// 1. `default.toml` (optional, compiled-in defaults otherwise)
/// 2. `{environment}.toml` (optional)
/// 3. `local.toml` (optional)
/// 4. `TICKER_INFO_*` environment variables
/// 5. `CACHE_DIR`, `CACHE_TTL`, `CACHE_DISABLED` and `PORT`
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// If set, skips layered loading
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a new configuration loader from `TICKER_INFO_CONFIG_DIR`,
    /// `TICKER_INFO_CONFIG_FILE` and `TICKER_INFO_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if both `TICKER_INFO_CONFIG_DIR` and
    /// `TICKER_INFO_CONFIG_FILE` are set, as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && std::env::var(CONFIG_DIR_ENV).is_ok() {
            return Err(ConfigError::mutual_exclusivity(
                "TICKER_INFO_CONFIG_DIR and TICKER_INFO_CONFIG_FILE cannot both be set. \
                 Use TICKER_INFO_CONFIG_DIR for layered configuration or \
                 TICKER_INFO_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir,
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Load a single file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load and validate configuration from all sources.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config(|name| std::env::var(name).ok())?;

        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            Self::add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)
        };

        // TICKER_INFO_SERVER__PORT -> server.port
        let builder = Self::add_env_source(builder);
        let builder = Self::add_deployment_overrides(builder, lookup)?;

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(&self, builder: Builder) -> Builder {
        let layers = [
            self.config_dir.join("default.toml"),
            self.config_dir.join(self.environment.file_name()),
            self.config_dir.join("local.toml"),
        ];

        layers.iter().fold(builder, |builder, path| {
            builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false))
        })
    }

    fn add_file_source(
        builder: Builder,
        path: &Path,
        required: bool,
    ) -> Result<Builder, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(&path.to_string_lossy(), FileFormat::Toml).required(required),
        ))
    }

    fn add_env_source(builder: Builder) -> Builder {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }

    /// Apply the unprefixed deployment variables on top of everything else.
    fn add_deployment_overrides(
        builder: Builder,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Builder, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cache_dir = non_empty(CACHE_DIR_VAR);

        let ttl = non_empty(CACHE_TTL_VAR)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    ConfigError::EnvVarError(format!(
                        "{} must be a non-negative number of seconds, got '{}'",
                        CACHE_TTL_VAR, raw
                    ))
                })
            })
            .transpose()?;

        let disabled = non_empty(CACHE_DISABLED_VAR)
            .map(|raw| parse_flag(CACHE_DISABLED_VAR, &raw))
            .transpose()?;

        let port = non_empty(PORT_VAR)
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|_| {
                    ConfigError::EnvVarError(format!("{} must be a valid port, got '{}'", PORT_VAR, raw))
                })
            })
            .transpose()?;

        Ok(builder
            .set_override_option("cache.dir", cache_dir)?
            .set_override_option(
                "cache.ttl_seconds",
                ttl.map(|t| i64::try_from(t).unwrap_or(i64::MAX)),
            )?
            .set_override_option("cache.disabled", disabled)?
            .set_override_option("server.port", port.map(i64::from))?)
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVarError(format!(
            "{} must be a boolean (true/false), got '{}'",
            name, raw
        ))),
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}
