//! Environment-driven configuration
//!
//! Values are read once at startup and handed to the components that need
//! them. Nothing here is consulted again while requests are being served.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_TRADINGVIEW_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8008;

/// Deployment environment name (`production`, `sandbox`, ...)
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

/// Connection settings for the TradingView API server the relay forwards to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    api_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl RelayConfig {
    /// Build a config for `api_url` with default timeouts.
    ///
    /// The URL must be absolute `http` or `https`. A trailing slash is
    /// dropped so endpoint paths can be appended to whatever base path the
    /// server is mounted on.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(api_url).map_err(|e| ConfigError::InvalidUrl {
            value: api_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                value: api_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("TRADINGVIEW_API_URL")
            .unwrap_or_else(|_| DEFAULT_TRADINGVIEW_API_URL.to_string());

        let timeout =
            read_seconds("TRADINGVIEW_API_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS)?;
        let connect_timeout = read_seconds(
            "TRADINGVIEW_API_CONNECT_TIMEOUT_SECONDS",
            DEFAULT_CONNECT_TIMEOUT_SECONDS,
        )?;

        Ok(Self::new(&api_url)?
            .with_timeout(Duration::from_secs(timeout))
            .with_connect_timeout(Duration::from_secs(connect_timeout)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Base URL without a trailing slash
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Absolute URL of an API server endpoint, e.g. `endpoint_url("status")`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint.trim_start_matches('/'))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TRADINGVIEW_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        }
    }
}

/// Bind address of the host HTTP server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "PORT".to_string(),
                value: raw.clone(),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Whole seconds from `name`, or `default` when unset. Zero is rejected.
fn read_seconds(name: &str, default: u64) -> Result<u64, ConfigError> {
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(_) => return Ok(default),
    };

    let seconds: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name: name.to_string(),
        value: raw.clone(),
    })?;
    if seconds == 0 {
        return Err(ConfigError::ZeroDuration(name.to_string()));
    }
    Ok(seconds)
}
