//! # cdir-pathfinder -- Typed client for the pathfinder routing services
//!
//! Pathfinder publishes NAPTR-style routing records for phone numbers. It is
//! split into two services:
//!
//! - **Query** ([`RoutingQuery`]): the records currently published for a
//!   number.
//! - **Provisioning** ([`Provisioning`]): routing profiles and the mapping
//!   from a number to its activated profile.
//!
//! Both are async traits so directories can run against the HTTP clients in
//! production and against [`StubPathfinder`] in tests.
//!
//! ## Not found
//!
//! Provisioning reads answer [`Lookup::NotFound`] instead of an error when
//! the service returns 404. Callers drive state transitions from that
//! variant; everything else is a [`PathfinderError`].
//!
//! ## Retries
//!
//! None. Each call is a single request bounded by the configured timeout.

pub mod config;
pub mod error;
pub mod provisioning;
pub mod query;
pub mod stub;
pub mod types;

pub use config::{ConfigError, PathfinderConfig};
pub use error::PathfinderError;
pub use provisioning::{HttpProvisioningClient, Provisioning};
pub use query::{HttpQueryClient, RoutingQuery};
pub use stub::{StubCall, StubOperation, StubPathfinder};
pub use types::{Lookup, QueryResponse, RecordRegexp, RoutingProfile, RoutingRecord};

use std::time::Duration;

/// HTTP clients for both pathfinder services, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct PathfinderClient {
    query: HttpQueryClient,
    provisioning: HttpProvisioningClient,
}

impl PathfinderClient {
    /// Create clients from configuration.
    pub fn new(config: PathfinderConfig) -> Result<Self, PathfinderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PathfinderError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            query: HttpQueryClient::new(http.clone(), config.query_url),
            provisioning: HttpProvisioningClient::new(http, config.provisioning_url),
        })
    }

    /// Access the record query client.
    pub fn query(&self) -> &HttpQueryClient {
        &self.query
    }

    /// Access the provisioning client.
    pub fn provisioning(&self) -> &HttpProvisioningClient {
        &self.provisioning
    }
}

/// Join a relative path onto a base URL regardless of trailing slashes.
pub(crate) fn endpoint_url(base: &url::Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_handles_slashes() {
        let bare: url::Url = "http://127.0.0.1:9000".parse().unwrap();
        let nested: url::Url = "http://pf.local/provisioning/".parse().unwrap();
        assert_eq!(
            endpoint_url(&bare, "profiles"),
            "http://127.0.0.1:9000/profiles"
        );
        assert_eq!(
            endpoint_url(&nested, "/profiles/P-1"),
            "http://pf.local/provisioning/profiles/P-1"
        );
    }

    #[test]
    fn client_builds_from_local_mock_config() {
        let config = PathfinderConfig::local_mock(9100, 9101).unwrap();
        assert!(PathfinderClient::new(config).is_ok());
    }
}
