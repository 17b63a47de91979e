//! clap value parsers for `--port`, `--host` and `--config`

use std::net::IpAddr;
use std::path::PathBuf;

pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("port 0 is not allowed; use 1-65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("'{}' is not a port number (1-65535)", value)),
    }
}

/// Accepts IP literals and DNS-style hostnames.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();

    if host.is_empty() {
        return Err("host cannot be empty".to_string());
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }
    // Dotted digits that failed to parse as an address are a typo, not a hostname.
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("'{}' is not a valid IPv4 address", host));
    }
    if host.len() > 253 {
        return Err("hostname is longer than 253 characters".to_string());
    }
    if !host
        .split('.')
        .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
    {
        return Err(format!("'{}' is not a valid hostname", host));
    }

    Ok(host.to_string())
}

/// The file must exist and be readable; its contents are checked by the loader.
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);

    if !path.is_file() {
        return Err(format!("configuration file not found: '{}'", value));
    }
    std::fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("cannot read configuration file '{}': {}", value, e))
}
