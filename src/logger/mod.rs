//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output on stderr with color control
//! - File output in Full, Compact or JSON format

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::LogFileWriter;

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    build_subscriber(&config)?
        .try_init()
        .map_err(|e| LoggerError::subscriber(e.to_string()))
}

/// Assemble the subscriber described by `config` without installing it.
fn build_subscriber(config: &LoggerConfig) -> Result<BoxedSubscriber, LoggerError> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.console.enabled, config.file.enabled) {
        (true, true) => build_both(config, filter),
        (true, false) => Ok(build_console_only(&config.console, filter)),
        (false, true) => build_file_only(&config.file, filter),
        (false, false) => Err(LoggerError::config(
            "At least one output (console or file) must be enabled",
        )),
    }
}

fn use_ansi(config: &ConsoleConfig) -> bool {
    config.colored && std::io::stderr().is_terminal()
}

fn build_console_only(config: &ConsoleConfig, filter: EnvFilter) -> BoxedSubscriber {
    Box::new(
        tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(use_ansi(config))
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        ),
    )
}

fn build_file_only(config: &FileConfig, filter: EnvFilter) -> Result<BoxedSubscriber, LoggerError> {
    let writer = LogFileWriter::new(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let subscriber: BoxedSubscriber = match config.format {
        LogFormat::Full => Box::new(
            registry.with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer)),
        ),
        LogFormat::Compact => Box::new(
            registry.with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .compact()
                    .with_writer(writer),
            ),
        ),
        LogFormat::Json => {
            Box::new(registry.with(fmt::layer().with_ansi(false).json().with_writer(writer)))
        }
    };

    Ok(subscriber)
}

fn build_both(config: &LoggerConfig, filter: EnvFilter) -> Result<BoxedSubscriber, LoggerError> {
    let writer = LogFileWriter::new(&config.file)?;
    let ansi = use_ansi(&config.console);
    let registry = tracing_subscriber::registry().with(filter);

    // File layer goes first so console ANSI settings do not leak into span
    // fields written to the file (tokio-rs/tracing#1817). The console layer
    // is built per arm because its subscriber type differs by file format.
    let subscriber: BoxedSubscriber = match config.file.format {
        LogFormat::Full => {
            let file_layer = fmt::layer().with_ansi(false).with_target(true).with_writer(writer);
            let console_layer = fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr);

            Box::new(registry.with(file_layer).with(console_layer))
        }
        LogFormat::Compact => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .compact()
                .with_writer(writer);
            let console_layer = fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr);

            Box::new(registry.with(file_layer).with(console_layer))
        }
        LogFormat::Json => {
            let file_layer = fmt::layer().with_ansi(false).json().with_writer(writer);
            let console_layer = fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr);

            Box::new(registry.with(file_layer).with(console_layer))
        }
    };

    Ok(subscriber)
}
