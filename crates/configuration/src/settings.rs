use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// The root configuration structure for the application.
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration pointing at a local proxy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the authenticated proxy lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL of the proxy, e.g. `https://dash.example.com`. Paths such as
    /// `/proxy/active-schedules` are appended to it.
    pub base_url: String,
    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Provider path segment in `/proxy/providers/{provider}/products/...`.
    pub provider: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(10),
            provider: "coinbase".to_string(),
        }
    }
}

impl ProxyConfig {
    /// The base URL parsed and validated.
    pub fn url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl {
            value: self.base_url.clone(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::ValidationError(format!(
                "proxy.base_url '{}' cannot be used as a base URL",
                self.base_url
            )));
        }
        Ok(url)
    }
}

/// Bounded retry for transient transport failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.proxy.url()?;

        if self.proxy.provider.trim().is_empty() || self.proxy.provider.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "proxy.provider '{}' must be a single path segment",
                self.proxy.provider
            )));
        }
        if self.proxy.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "proxy.request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "retry.multiplier must be >= 1.0, got {}",
                self.retry.multiplier
            )));
        }
        if self.retry.max_backoff < self.retry.initial_backoff {
            return Err(ConfigError::ValidationError(
                "retry.max_backoff must not be shorter than retry.initial_backoff".to_string(),
            ));
        }
        Ok(())
    }
}
