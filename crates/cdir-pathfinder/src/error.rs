//! Pathfinder client error types.

/// Errors from pathfinder calls.
///
/// A 404 from the provisioning service is not an error; it is reported as
/// [`Lookup::NotFound`](crate::Lookup::NotFound).
#[derive(Debug, thiserror::Error)]
pub enum PathfinderError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Pathfinder returned a non-2xx status.
    #[error("pathfinder {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl PathfinderError {
    /// The endpoint the failing call targeted, when there was one.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Http { endpoint, .. }
            | Self::ApiError { endpoint, .. }
            | Self::Deserialization { endpoint, .. } => Some(endpoint),
            Self::Config(_) => None,
        }
    }
}

/// Turn a non-2xx response into [`PathfinderError::ApiError`].
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, PathfinderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(PathfinderError::ApiError {
        endpoint: endpoint.into(),
        status,
        body,
    })
}
