//! In-memory pathfinder.
//!
//! Implements both [`RoutingQuery`] and [`Provisioning`] over shared maps so
//! directory logic can be exercised without a network. Every call is
//! recorded, and any operation can be made to fail with a 503.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use cdir_core::PhoneNumber;
use parking_lot::{Mutex, RwLock};

use crate::error::PathfinderError;
use crate::provisioning::Provisioning;
use crate::query::RoutingQuery;
use crate::types::{Lookup, QueryResponse, RoutingProfile};

/// Operations of the stub, used for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubOperation {
    Query,
    GetProfileForPhoneNumber,
    FindProfile,
    CreateProfile,
    UpdateProfile,
    ActivatePhoneNumber,
}

/// A recorded call with its key argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
    Query(String),
    GetProfileForPhoneNumber(String),
    FindProfile(String),
    CreateProfile(RoutingProfile),
    UpdateProfile(RoutingProfile),
    ActivatePhoneNumber { digits: String, profile_id: String },
}

impl StubCall {
    pub fn operation(&self) -> StubOperation {
        match self {
            Self::Query(_) => StubOperation::Query,
            Self::GetProfileForPhoneNumber(_) => StubOperation::GetProfileForPhoneNumber,
            Self::FindProfile(_) => StubOperation::FindProfile,
            Self::CreateProfile(_) => StubOperation::CreateProfile,
            Self::UpdateProfile(_) => StubOperation::UpdateProfile,
            Self::ActivatePhoneNumber { .. } => StubOperation::ActivatePhoneNumber,
        }
    }
}

#[derive(Debug, Default)]
struct StubState {
    profiles: HashMap<String, RoutingProfile>,
    /// digits -> activated profile id
    activations: HashMap<String, String>,
}

/// Shared in-memory pathfinder. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct StubPathfinder {
    state: Arc<RwLock<StubState>>,
    calls: Arc<Mutex<Vec<StubCall>>>,
    failing: Arc<RwLock<HashSet<StubOperation>>>,
}

impl StubPathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile without recording a call.
    pub fn seed_profile(&self, profile: RoutingProfile) {
        self.state
            .write()
            .profiles
            .insert(profile.id.clone(), profile);
    }

    /// Activate a number for a profile without recording a call.
    pub fn seed_activation(&self, digits: impl Into<String>, profile_id: impl Into<String>) {
        self.state
            .write()
            .activations
            .insert(digits.into(), profile_id.into());
    }

    pub fn profile(&self, profile_id: &str) -> Option<RoutingProfile> {
        self.state.read().profiles.get(profile_id).cloned()
    }

    pub fn activated_profile_id(&self, digits: &str) -> Option<String> {
        self.state.read().activations.get(digits).cloned()
    }

    /// Make every subsequent call of `operation` fail.
    pub fn fail(&self, operation: StubOperation) {
        self.failing.write().insert(operation);
    }

    pub fn recover(&self, operation: StubOperation) {
        self.failing.write().remove(&operation);
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, operation: StubOperation) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: StubCall) -> Result<(), PathfinderError> {
        let operation = call.operation();
        self.calls.lock().push(call);
        if self.failing.read().contains(&operation) {
            return Err(PathfinderError::ApiError {
                endpoint: format!("stub {operation:?}"),
                status: 503,
                body: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RoutingQuery for StubPathfinder {
    async fn request(&self, phone: &PhoneNumber) -> Result<QueryResponse, PathfinderError> {
        self.record(StubCall::Query(phone.digits().to_string()))?;
        let state = self.state.read();
        let records = state
            .activations
            .get(phone.digits())
            .and_then(|id| state.profiles.get(id))
            .map(|p| p.records.clone())
            .unwrap_or_default();
        Ok(QueryResponse { records })
    }
}

#[async_trait]
impl Provisioning for StubPathfinder {
    async fn get_profile_for_phone_number(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Lookup<String>, PathfinderError> {
        self.record(StubCall::GetProfileForPhoneNumber(phone.digits().to_string()))?;
        Ok(self.activated_profile_id(phone.digits()).into())
    }

    async fn find_profile(&self, profile_id: &str) -> Result<Lookup<RoutingProfile>, PathfinderError> {
        self.record(StubCall::FindProfile(profile_id.to_string()))?;
        Ok(self.profile(profile_id).into())
    }

    async fn create_profile(&self, profile: &RoutingProfile) -> Result<(), PathfinderError> {
        self.record(StubCall::CreateProfile(profile.clone()))?;
        let mut state = self.state.write();
        if state.profiles.contains_key(&profile.id) {
            return Err(PathfinderError::ApiError {
                endpoint: "stub CreateProfile".into(),
                status: 409,
                body: format!("profile {} already exists", profile.id),
            });
        }
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn update_profile(&self, profile: &RoutingProfile) -> Result<(), PathfinderError> {
        self.record(StubCall::UpdateProfile(profile.clone()))?;
        let mut state = self.state.write();
        match state.profiles.get_mut(&profile.id) {
            Some(stored) => {
                *stored = profile.clone();
                Ok(())
            }
            None => Err(PathfinderError::ApiError {
                endpoint: "stub UpdateProfile".into(),
                status: 404,
                body: format!("profile {} not found", profile.id),
            }),
        }
    }

    async fn activate_phone_number(
        &self,
        phone: &PhoneNumber,
        profile_id: &str,
    ) -> Result<(), PathfinderError> {
        self.record(StubCall::ActivatePhoneNumber {
            digits: phone.digits().to_string(),
            profile_id: profile_id.to_string(),
        })?;
        self.seed_activation(phone.digits(), profile_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordRegexp, RoutingRecord};

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+14441235555").unwrap()
    }

    fn profile() -> RoutingProfile {
        RoutingProfile {
            id: "Profile-14441235555".into(),
            records: vec![RoutingRecord {
                order: 10,
                preference: 1,
                service: "E2U+pstn:tel".into(),
                partner_id: "10305".into(),
                regexp: RecordRegexp {
                    pattern: "^.*$".into(),
                    replace: "mm:001.001@mojaloop.org".into(),
                },
            }],
        }
    }

    #[tokio::test]
    async fn query_answers_activated_profile_records() {
        let stub = StubPathfinder::new();
        assert!(stub.request(&phone()).await.unwrap().records.is_empty());

        stub.create_profile(&profile()).await.unwrap();
        stub.activate_phone_number(&phone(), "Profile-14441235555")
            .await
            .unwrap();

        let response = stub.request(&phone()).await.unwrap();
        assert_eq!(response.records, profile().records);
        assert_eq!(stub.call_count(StubOperation::Query), 2);
    }

    #[tokio::test]
    async fn create_twice_conflicts() {
        let stub = StubPathfinder::new();
        stub.create_profile(&profile()).await.unwrap();
        let err = stub.create_profile(&profile()).await.unwrap_err();
        assert!(matches!(err, PathfinderError::ApiError { status: 409, .. }));
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_and_recoverable() {
        let stub = StubPathfinder::new();
        stub.fail(StubOperation::FindProfile);
        assert!(stub.find_profile("p").await.is_err());
        stub.recover(StubOperation::FindProfile);
        assert_eq!(stub.find_profile("p").await.unwrap(), Lookup::NotFound);
        assert_eq!(stub.call_count(StubOperation::FindProfile), 2);
    }
}
