//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Ticker information service with a TTL cache in front of the quote provider
#[derive(Parser, Debug)]
#[command(name = "ticker-info")]
#[command(about = "Ticker information service with a TTL response cache")]
#[command(long_about = "
ticker-info serves company, dividend and price information for stock tickers.
Provider responses are cached in a local directory or a gs:// bucket for a
configurable time-to-live.

EXAMPLES:
    # Start the server with default configuration
    ticker-info serve

    # Start server on custom host and port
    ticker-info serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    ticker-info --config /path/to/config.toml serve

    # Check configuration without starting server
    ticker-info serve --dry-run

    # Resolve one ticker through the configured cache
    ticker-info fetch AAPL

    # Bypass the cache
    ticker-info fetch MSFT --no-cache
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load a single TOML file instead of the layered config directory.
    /// The file must exist and be readable.
    ///
    /// Example: --config /etc/ticker-info/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `config/{env}.toml` layer is loaded.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   ticker-info serve                           # Start with defaults
    ///   ticker-info serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   ticker-info serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections
        /// from any interface.
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// Default: 8080, or the PORT environment variable
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Takes precedence over configuration files and --verbose/--quiet.
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve a single ticker and print it as JSON
    ///
    /// Examples:
    ///   ticker-info fetch AAPL
    ///   ticker-info fetch BRK-B --no-cache
    Fetch {
        /// Ticker symbol, case-insensitive
        #[arg(value_name = "TICKER")]
        ticker: String,

        /// Skip the cache and always ask the provider
        #[arg(long)]
        no_cache: bool,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Fetch { ticker, .. }) = &self.command
            && ticker.trim().is_empty()
        {
            return Err("Ticker symbol cannot be empty".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["ticker-info", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["ticker-info", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["ticker-info"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli =
            Cli::try_parse_from(["ticker-info", "serve", "--host", "0.0.0.0", "--port", "8080"])
                .unwrap();
        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                log_level,
                dry_run,
            }) => {
                assert_eq!(host, Some("0.0.0.0".to_string()));
                assert_eq!(port, Some(8080));
                assert!(log_level.is_none());
                assert!(!dry_run);
            }
            other => panic!("Expected Serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_command() {
        let cli = Cli::try_parse_from(["ticker-info", "fetch", "aapl", "--no-cache"]).unwrap();
        match cli.command {
            Some(Commands::Fetch { ticker, no_cache }) => {
                assert_eq!(ticker, "aapl");
                assert!(no_cache);
            }
            other => panic!("Expected Fetch command, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_requires_ticker() {
        assert!(Cli::try_parse_from(["ticker-info", "fetch"]).is_err());
    }

    #[test]
    fn test_blank_ticker_fails_validation() {
        let cli = Cli::try_parse_from(["ticker-info", "fetch", "  "]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_env_aliases() {
        let cli = Cli::try_parse_from(["ticker-info", "--env", "stage"]).unwrap();
        let env: crate::config::Environment = cli.env.unwrap().into();
        assert_eq!(env, crate::config::Environment::Staging);
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["ticker-info", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
