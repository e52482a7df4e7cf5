//! Environment-driven server configuration.
//!
//! Everything is read once at startup; a missing required variable
//! fails the boot instead of surfacing later as a broken frame.

use std::net::IpAddr;
use std::time::Duration;

use url::Url;

/// Error raised while loading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Base URL of the image generation service.
    pub api_url: String,
    /// Base URL of the user-facing app.
    pub dapp_url: String,
    /// Public base URL of this service.
    pub frames_url: String,
    /// Hub validation endpoint for the default frame protocol.
    pub hub_api_url: Url,
    pub hub_api_key: Option<String>,
    /// Xmtp validation endpoint.
    pub xmtp_validation_url: Url,
    /// Backend exposing identity, jar, price, and notification APIs.
    pub backend_api_url: Url,
    /// Timeout applied to every outbound collaborator call.
    pub http_timeout: Duration,
    /// Whether command amounts accept `k`/`m` suffixes.
    pub custom_amount_suffixes: bool,
    /// Comma-separated CORS allowlist, or `*`.
    pub cors_allowed_origins: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn required_url(name: &'static str) -> Result<Url, ConfigError> {
    required(name)?
        .parse()
        .map_err(|e: url::ParseError| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "HOST",
                reason: e.to_string(),
            })?;
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?;
        let http_timeout_ms = std::env::var("HTTP_TIMEOUT_MS")
            .unwrap_or_else(|_| "2500".to_string())
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "HTTP_TIMEOUT_MS",
                reason: e.to_string(),
            })?;
        let custom_amount_suffixes = std::env::var("CUSTOM_AMOUNT_SUFFIXES")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            api_url: trimmed(required("API_URL")?),
            dapp_url: trimmed(required("DAPP_URL")?),
            frames_url: trimmed(required("FRAMES_URL")?),
            hub_api_url: required_url("HUB_API_URL")?,
            hub_api_key: std::env::var("HUB_API_KEY").ok().filter(|k| !k.is_empty()),
            xmtp_validation_url: required_url("XMTP_VALIDATION_URL")?,
            backend_api_url: required_url("BACKEND_API_URL")?,
            http_timeout: Duration::from_millis(http_timeout_ms),
            custom_amount_suffixes,
            cors_allowed_origins: std::env::var("FRAMEPAY_CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }
}

fn trimmed(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
