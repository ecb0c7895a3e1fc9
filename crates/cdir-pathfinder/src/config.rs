//! Pathfinder client configuration.
//!
//! Pathfinder runs two services: a query service that answers NAPTR-style
//! record lookups and a provisioning service that manages routing
//! profiles. Both base URLs are required; there is no sensible public
//! default.

use url::Url;

/// Default transport timeout for pathfinder calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Configuration for connecting to the pathfinder services.
#[derive(Debug, Clone)]
pub struct PathfinderConfig {
    /// Base URL of the record query service.
    pub query_url: Url,
    /// Base URL of the provisioning service.
    pub provisioning_url: Url,
    /// Per-request transport timeout in milliseconds.
    pub timeout_ms: u64,
}

impl PathfinderConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PATHFINDER_QUERY_URL` (required)
    /// - `PATHFINDER_PROVISIONING_URL` (required)
    /// - `PATHFINDER_QUERY_TIMEOUT_MS` (default: 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            query_url: required_url("PATHFINDER_QUERY_URL")?,
            provisioning_url: required_url("PATHFINDER_PROVISIONING_URL")?,
            timeout_ms: match std::env::var("PATHFINDER_QUERY_TIMEOUT_MS") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("PATHFINDER_QUERY_TIMEOUT_MS".into(), raw))?,
                Err(_) => DEFAULT_TIMEOUT_MS,
            },
        })
    }

    /// Create a configuration pointing at local mock servers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local_mock(query_port: u16, provisioning_port: u16) -> Result<Self, ConfigError> {
        let make_url = |port: u16| -> Result<Url, ConfigError> {
            Url::parse(&format!("http://127.0.0.1:{port}"))
                .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))
        };
        Ok(Self {
            query_url: make_url(query_port)?,
            provisioning_url: make_url(provisioning_port)?,
            timeout_ms: 1000,
        })
    }
}

fn required_url(var: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).map_err(|_| ConfigError::MissingVar(var.to_string()))?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1}")]
    InvalidNumber(String, String),
}
