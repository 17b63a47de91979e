use std::time::Duration;

use super::user_agent::random_user_agent;
use crate::config::ProviderConfig;

/// Builds the HTTP client shared by market data providers.
///
/// # Features
/// - **Cookie store**: the quote API hands out a session cookie that must
///   accompany the crumb on every request
/// - **Compression**: gzip, deflate, brotli and zstd
/// - **User-Agent**: `provider.user_agent` when set, otherwise a random
///   desktop browser
pub fn build_http_client(config: &ProviderConfig) -> Result<reqwest::Client, reqwest::Error> {
    let user_agent = if config.user_agent.trim().is_empty() {
        random_user_agent().to_string()
    } else {
        config.user_agent.clone()
    };

    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .cookie_store(true)
        .user_agent(user_agent)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_defaults() {
        assert!(build_http_client(&ProviderConfig::default()).is_ok());
    }

    #[test]
    fn test_client_builds_with_fixed_agent() {
        let config = ProviderConfig {
            user_agent: "ticker-info-tests/1.0".to_string(),
            ..Default::default()
        };
        assert!(build_http_client(&config).is_ok());
    }
}
