//! End-user-registry directory (`eur`).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/users/{identifier}` | Users registered under a number |
//! | POST   | `/register` | Register a number for a DFSP |
//!
//! Users carry `dfspIdentifier` as `<scheme>:<dfsp>`. The first user of a
//! lookup is the primary one.

use std::time::Duration;

use async_trait::async_trait;
use cdir_core::{Directory, DirectoryError, RegisterRequest, ResolutionRecord};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::EndUserRegistryConfig;

const NOT_FOUND: &str = "The requested identifier could not be found";
const ALREADY_EXISTS: &str = "The identifier has already been registered by this DFSP";
const INVALID_RESPONSE: &str = "There was an issue processing the request.";
const REQUEST_FAILED: &str = "Unhandled error calling the end user registry";

/// A registered end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndUser {
    pub number: String,
    /// `<scheme_identifier>:<dfsp_scheme_identifier>`
    pub dfsp_identifier: String,
}

impl EndUser {
    fn into_record(self, primary: bool) -> Result<ResolutionRecord, DirectoryError> {
        let (scheme, dfsp) = self
            .dfsp_identifier
            .split_once(':')
            .ok_or_else(|| DirectoryError::InvalidResponse(INVALID_RESPONSE.into()))?;
        Ok(ResolutionRecord {
            identifier: self.number.clone(),
            scheme_identifier: scheme.to_string(),
            dfsp_scheme_identifier: dfsp.to_string(),
            primary,
        })
    }
}

/// Error body returned by the registry.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Directory backed by an end-user-registry HTTP service.
#[derive(Debug, Clone)]
pub struct EndUserRegistryDirectory {
    http: reqwest::Client,
    config: EndUserRegistryConfig,
}

impl EndUserRegistryDirectory {
    pub fn new(config: EndUserRegistryConfig) -> Result<Self, crate::ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| crate::ConfigError::Client(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Build from `END_USER_REGISTRY_URL` and `SCHEME_ID`.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        Self::new(EndUserRegistryConfig::from_env()?)
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                tracing::error!(base_url = %self.config.base_url, "end user registry URL cannot take a path");
                DirectoryError::Internal(REQUEST_FAILED.into())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport_error(endpoint: &str, e: reqwest::Error) -> DirectoryError {
        tracing::error!(%endpoint, error = %e, "end user registry request failed");
        DirectoryError::Internal(REQUEST_FAILED.into())
    }
}

#[async_trait]
impl Directory for EndUserRegistryDirectory {
    fn identifier_type(&self) -> &str {
        "eur"
    }

    fn description(&self) -> &str {
        "End User Registry number"
    }

    async fn find(&self, identifier: &str) -> Result<Vec<ResolutionRecord>, DirectoryError> {
        let endpoint = format!("GET /users/{identifier}");
        let resp = self
            .http
            .get(self.url(&["users", identifier])?)
            .send()
            .await
            .map_err(|e| Self::transport_error(&endpoint, e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(NOT_FOUND.into()));
        }
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body: ErrorBody = resp.json().await.unwrap_or_default();
            return Err(DirectoryError::BadRequest(body.message.unwrap_or_default()));
        }
        if !status.is_success() {
            tracing::error!(%endpoint, status = status.as_u16(), "end user registry returned an error");
            return Err(DirectoryError::Internal(REQUEST_FAILED.into()));
        }

        let users: Vec<EndUser> = resp.json().await.map_err(|e| {
            tracing::warn!(%endpoint, error = %e, "unusable end user registry response");
            DirectoryError::InvalidResponse(INVALID_RESPONSE.into())
        })?;

        users
            .into_iter()
            .enumerate()
            .map(|(index, user)| user.into_record(index == 0))
            .collect()
    }

    fn supports_registration(&self) -> bool {
        true
    }

    async fn register_identifier(
        &self,
        request: &RegisterRequest,
    ) -> Result<ResolutionRecord, DirectoryError> {
        let endpoint = "POST /register";
        let user = EndUser {
            number: request.identifier.clone(),
            dfsp_identifier: format!(
                "{}:{}",
                self.config.scheme_identifier, request.dfsp_scheme_identifier
            ),
        };
        let resp = self
            .http
            .post(self.url(&["register"])?)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&user)
            .send()
            .await
            .map_err(|e| Self::transport_error(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body: ErrorBody = resp.json().await.unwrap_or_default();
            if body.id.as_deref() == Some("AlreadyExistsError") {
                return Err(DirectoryError::AlreadyExists(ALREADY_EXISTS.into()));
            }
            tracing::error!(%endpoint, status = status.as_u16(), "end user registry returned an error");
            return Err(DirectoryError::Internal(REQUEST_FAILED.into()));
        }

        let stored: EndUser = resp.json().await.map_err(|e| {
            tracing::warn!(%endpoint, error = %e, "unusable end user registry response");
            DirectoryError::InvalidResponse(INVALID_RESPONSE.into())
        })?;
        stored.into_record(true)
    }
}
