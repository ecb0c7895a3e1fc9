//! Typed client for the pathfinder record query service.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/records/{digits}` | Records of the profile activated for a number |
//!
//! A 404 means no profile is activated for the number and is answered as
//! an empty record list.

use async_trait::async_trait;
use cdir_core::PhoneNumber;

use crate::error::{ensure_success, PathfinderError};
use crate::types::QueryResponse;

/// Record query service.
#[async_trait]
pub trait RoutingQuery: Send + Sync {
    /// All routing records currently published for `phone`.
    async fn request(&self, phone: &PhoneNumber) -> Result<QueryResponse, PathfinderError>;
}

/// HTTP implementation of [`RoutingQuery`].
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpQueryClient {
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl RoutingQuery for HttpQueryClient {
    /// Calls `GET {base_url}/records/{digits}`.
    async fn request(&self, phone: &PhoneNumber) -> Result<QueryResponse, PathfinderError> {
        let endpoint = format!("GET /records/{}", phone.digits());
        let url = crate::endpoint_url(&self.base_url, &format!("records/{}", phone.digits()));

        tracing::debug!(%endpoint, "querying pathfinder");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PathfinderError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(QueryResponse::default());
        }

        let resp = ensure_success(resp, &endpoint).await?;
        resp.json().await.map_err(|e| PathfinderError::Deserialization {
            endpoint,
            source: e,
        })
    }
}
