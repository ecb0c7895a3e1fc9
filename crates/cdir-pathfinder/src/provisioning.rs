//! Typed client for the pathfinder provisioning service.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/phone-numbers/{digits}/profile` | Profile activated for a number |
//! | POST   | `/phone-numbers/{digits}/activate` | Activate a number for a profile |
//! | GET    | `/profiles/{id}` | Get profile by id |
//! | POST   | `/profiles` | Create profile |
//! | PUT    | `/profiles/{id}` | Replace profile records |
//!
//! Reads answer [`Lookup::NotFound`] on 404. Writes treat every non-2xx
//! status as an error.

use async_trait::async_trait;
use cdir_core::PhoneNumber;
use serde::Serialize;

use crate::error::{ensure_success, PathfinderError};
use crate::types::{Lookup, PhoneNumberProfile, RoutingProfile};

/// Routing-profile provisioning service.
#[async_trait]
pub trait Provisioning: Send + Sync {
    /// Id of the profile activated for `phone`.
    async fn get_profile_for_phone_number(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Lookup<String>, PathfinderError>;

    async fn find_profile(&self, profile_id: &str) -> Result<Lookup<RoutingProfile>, PathfinderError>;

    async fn create_profile(&self, profile: &RoutingProfile) -> Result<(), PathfinderError>;

    /// Replace the stored records of `profile` with the given ones.
    async fn update_profile(&self, profile: &RoutingProfile) -> Result<(), PathfinderError>;

    /// Make `profile_id` the profile answered for `phone`.
    async fn activate_phone_number(
        &self,
        phone: &PhoneNumber,
        profile_id: &str,
    ) -> Result<(), PathfinderError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateRequest<'a> {
    profile_id: &'a str,
}

/// HTTP implementation of [`Provisioning`].
#[derive(Debug, Clone)]
pub struct HttpProvisioningClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpProvisioningClient {
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        crate::endpoint_url(&self.base_url, path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, PathfinderError> {
        tracing::debug!(%endpoint, "calling pathfinder provisioning");
        request.send().await.map_err(|e| PathfinderError::Http {
            endpoint: endpoint.into(),
            source: e,
        })
    }
}

#[async_trait]
impl Provisioning for HttpProvisioningClient {
    async fn get_profile_for_phone_number(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Lookup<String>, PathfinderError> {
        let path = format!("phone-numbers/{}/profile", phone.digits());
        let endpoint = format!("GET /{path}");
        let resp = self.send(self.http.get(self.url(&path)), &endpoint).await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        let resp = ensure_success(resp, &endpoint).await?;
        let body: PhoneNumberProfile =
            resp.json()
                .await
                .map_err(|e| PathfinderError::Deserialization {
                    endpoint,
                    source: e,
                })?;
        Ok(Lookup::Found(body.profile_id))
    }

    async fn find_profile(&self, profile_id: &str) -> Result<Lookup<RoutingProfile>, PathfinderError> {
        let path = format!("profiles/{profile_id}");
        let endpoint = format!("GET /{path}");
        let resp = self.send(self.http.get(self.url(&path)), &endpoint).await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        let resp = ensure_success(resp, &endpoint).await?;
        let profile = resp
            .json()
            .await
            .map_err(|e| PathfinderError::Deserialization {
                endpoint,
                source: e,
            })?;
        Ok(Lookup::Found(profile))
    }

    async fn create_profile(&self, profile: &RoutingProfile) -> Result<(), PathfinderError> {
        let endpoint = "POST /profiles";
        let resp = self
            .send(self.http.post(self.url("profiles")).json(profile), endpoint)
            .await?;
        ensure_success(resp, endpoint).await?;
        Ok(())
    }

    async fn update_profile(&self, profile: &RoutingProfile) -> Result<(), PathfinderError> {
        let path = format!("profiles/{}", profile.id);
        let endpoint = format!("PUT /{path}");
        let resp = self
            .send(self.http.put(self.url(&path)).json(profile), &endpoint)
            .await?;
        ensure_success(resp, &endpoint).await?;
        Ok(())
    }

    async fn activate_phone_number(
        &self,
        phone: &PhoneNumber,
        profile_id: &str,
    ) -> Result<(), PathfinderError> {
        let path = format!("phone-numbers/{}/activate", phone.digits());
        let endpoint = format!("POST /{path}");
        let resp = self
            .send(
                self.http
                    .post(self.url(&path))
                    .json(&ActivateRequest { profile_id }),
                &endpoint,
            )
            .await?;
        ensure_success(resp, &endpoint).await?;
        Ok(())
    }
}
