//! Configuration management for ticker-info
//!
//! Layered loading with support for:
//! - TOML configuration files
//! - `TICKER_INFO_*` environment variable overrides
//! - The plain deployment variables `CACHE_DIR`, `CACHE_TTL`, `CACHE_DISABLED`
//!   and `PORT`
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base configuration (optional)
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local overrides (not committed to version control)
//! 4. `TICKER_INFO_*` environment variables
//! 5. Deployment variables
//!
//! CLI flags are merged on top by `cli::config_merger`.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{CacheConfig, ProviderConfig, ServerConfig, Settings};
