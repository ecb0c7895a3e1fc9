//! Directory configuration.
//!
//! Each directory reads its settings from the environment through its own
//! `from_env`, so an unconfigured directory fails at registry build time
//! with the name of the missing variable.

use std::time::Duration;

use url::Url;

/// Placeholder in the replacement template, substituted with
/// `<scheme_identifier>.<dfsp_scheme_identifier>`.
pub const IDENTIFIER_PLACEHOLDER: &str = "#{identifier}";

/// Settings of the pathfinder-backed telephone directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelephoneDirectoryConfig {
    /// Service tag of the records this directory owns.
    pub service: String,
    pub partner_id: String,
    /// `regexp.pattern` of created records.
    pub regex_pattern: String,
    /// `regexp.replace` template; contains [`IDENTIFIER_PLACEHOLDER`].
    pub regex_replace: String,
    pub cache_ttl: Duration,
    /// Scheme code of this deployment.
    pub scheme_identifier: String,
}

impl TelephoneDirectoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables (all required):
    /// - `PATHFINDER_SERVICE`
    /// - `PATHFINDER_PARTNER_ID`
    /// - `PATHFINDER_REGEX_PATTERN`
    /// - `PATHFINDER_REGEX_REPLACE`
    /// - `PATHFINDER_CACHE_TIME_MS`
    /// - `SCHEME_ID`
    pub fn from_env() -> Result<Self, ConfigError> {
        let cache_ms: u64 = required_number("PATHFINDER_CACHE_TIME_MS")?;
        Self {
            service: required_var("PATHFINDER_SERVICE")?,
            partner_id: required_var("PATHFINDER_PARTNER_ID")?,
            regex_pattern: required_var("PATHFINDER_REGEX_PATTERN")?,
            regex_replace: required_var("PATHFINDER_REGEX_REPLACE")?,
            cache_ttl: Duration::from_millis(cache_ms),
            scheme_identifier: required_var("SCHEME_ID")?,
        }
        .validated()
    }

    /// Check the replacement template carries the placeholder.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if !self.regex_replace.contains(IDENTIFIER_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(self.regex_replace));
        }
        Ok(self)
    }

    /// The `regexp.replace` value that identifies `dfsp_scheme_identifier`
    /// in this scheme.
    pub fn replace_for(&self, dfsp_scheme_identifier: &str) -> String {
        self.regex_replace.replacen(
            IDENTIFIER_PLACEHOLDER,
            &format!("{}.{}", self.scheme_identifier, dfsp_scheme_identifier),
            1,
        )
    }
}

/// Settings of the end-user-registry directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndUserRegistryConfig {
    pub base_url: Url,
    pub scheme_identifier: String,
    pub timeout_secs: u64,
}

impl EndUserRegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `END_USER_REGISTRY_URL` (required)
    /// - `SCHEME_ID` (required)
    /// - `END_USER_REGISTRY_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = required_var("END_USER_REGISTRY_URL")?;
        Ok(Self {
            base_url: Url::parse(&raw)
                .map_err(|e| ConfigError::InvalidUrl("END_USER_REGISTRY_URL".into(), e.to_string()))?,
            scheme_identifier: required_var("SCHEME_ID")?,
            timeout_secs: std::env::var("END_USER_REGISTRY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

fn required_var(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar(var.to_string()))
}

fn required_number(var: &str) -> Result<u64, ConfigError> {
    let raw = required_var(var)?;
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw))
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
    #[error("replacement template '{0}' does not contain #{{identifier}}")]
    MissingPlaceholder(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error(transparent)]
    Pathfinder(#[from] cdir_pathfinder::ConfigError),
}
