//! # Telephone Directory
//!
//! Resolves E.164 phone numbers through pathfinder and lets DFSPs claim
//! them by editing the number's routing profile.
//!
//! ## Lookup
//!
//! Records come from the cache when present, otherwise from the pathfinder
//! query service. Only records of the configured service are considered;
//! they are ordered by `(order, preference)` and the DFSP is read from the
//! credential part of each record's replacement URI.
//!
//! ## Registration
//!
//! A number is in one of three provisioning states:
//!
//! | State | Action |
//! |-------|--------|
//! | Activated profile | Insert, promote, or demote the DFSP's record |
//! | Inactive `Profile-<digits>` | Replace its records with the DFSP's, then activate |
//! | No profile | Create `Profile-<digits>` with the DFSP's record, then activate |
//!
//! Among the service's records exactly one carries the primary preference
//! after every successful change. The cache is refreshed with the profile's
//! records whenever pathfinder was modified.

use std::sync::Arc;

use async_trait::async_trait;
use cdir_core::{
    Directory, DirectoryError, IdentifierFormat, PhoneNumber, RegisterRequest, ResolutionRecord,
};
use cdir_pathfinder::{
    Lookup, PathfinderClient, PathfinderConfig, PathfinderError, Provisioning, RecordRegexp,
    RoutingProfile, RoutingQuery, RoutingRecord,
};

use crate::cache::{InMemoryRoutingCache, RoutingCache};
use crate::config::TelephoneDirectoryConfig;
use crate::uri::parse_dfsp_credential;

/// Preference of the primary record.
pub const PRIMARY_PREFERENCE: u32 = 1;
/// Preference of every other record.
pub const NON_PRIMARY_PREFERENCE: u32 = 2;
/// `order` of records created by this directory.
pub const DEFAULT_ORDER: u32 = 10;

const NO_RECORDS: &str = "No valid records could be found for the requested phone number";
const QUERY_FAILED: &str = "Unhandled error querying phone number";
const REGISTRATION_FAILED: &str = "Unhandled error registering phone number";
const NO_PRIMARY: &str = "There must be a primary DFSP set for the identifier";

fn preference_for(primary: bool) -> u32 {
    if primary {
        PRIMARY_PREFERENCE
    } else {
        NON_PRIMARY_PREFERENCE
    }
}

fn profile_id_for(phone: &PhoneNumber) -> String {
    format!("Profile-{}", phone.digits())
}

#[derive(Debug, thiserror::Error)]
enum RegistrationError {
    #[error("no primary DFSP would remain")]
    Primary,
    #[error(transparent)]
    Remote(#[from] PathfinderError),
}

/// Result of reconciling a profile with a registration request.
#[derive(Debug)]
struct Outcome {
    profile: RoutingProfile,
    /// The record that now represents the DFSP.
    record: RoutingRecord,
    /// Whether pathfinder was modified.
    updated: bool,
}

/// Pathfinder-backed directory for the `tel` identifier type.
pub struct TelephoneDirectory {
    config: TelephoneDirectoryConfig,
    query: Arc<dyn RoutingQuery>,
    provisioning: Arc<dyn Provisioning>,
    cache: Arc<dyn RoutingCache>,
}

impl TelephoneDirectory {
    pub fn new(
        config: TelephoneDirectoryConfig,
        query: Arc<dyn RoutingQuery>,
        provisioning: Arc<dyn Provisioning>,
        cache: Arc<dyn RoutingCache>,
    ) -> Self {
        Self {
            config,
            query,
            provisioning,
            cache,
        }
    }

    /// Build over the HTTP pathfinder clients with an in-process cache.
    pub fn with_client(config: TelephoneDirectoryConfig, client: &PathfinderClient) -> Self {
        Self::new(
            config,
            Arc::new(client.query().clone()),
            Arc::new(client.provisioning().clone()),
            Arc::new(InMemoryRoutingCache::new()),
        )
    }

    /// Build from `PATHFINDER_*` and `SCHEME_ID` environment variables.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        let config = TelephoneDirectoryConfig::from_env()?;
        let client = PathfinderClient::new(PathfinderConfig::from_env()?)
            .map_err(|e| crate::ConfigError::Client(e.to_string()))?;
        Ok(Self::with_client(config, &client))
    }

    pub fn config(&self) -> &TelephoneDirectoryConfig {
        &self.config
    }

    fn validate(identifier: &str) -> Result<PhoneNumber, DirectoryError> {
        Ok(PhoneNumber::new(identifier)?)
    }

    fn build_record(&self, dfsp_scheme_identifier: &str) -> RoutingRecord {
        RoutingRecord {
            order: DEFAULT_ORDER,
            preference: PRIMARY_PREFERENCE,
            service: self.config.service.clone(),
            partner_id: self.config.partner_id.clone(),
            regexp: RecordRegexp {
                pattern: self.config.regex_pattern.clone(),
                replace: self.config.replace_for(dfsp_scheme_identifier),
            },
        }
    }

    async fn query_records(&self, phone: &PhoneNumber) -> Result<Vec<RoutingRecord>, PathfinderError> {
        if let Some(records) = self.cache.get(phone.digits()) {
            tracing::info!(identifier = %phone, "found in cache, returning cached records");
            return Ok(records);
        }
        tracing::info!(identifier = %phone, "not found in cache, querying pathfinder");
        Ok(self.query.request(phone).await?.records)
    }

    fn map_records(&self, identifier: &str, records: Vec<RoutingRecord>) -> Vec<ResolutionRecord> {
        let mut records: Vec<RoutingRecord> = records
            .into_iter()
            .filter(|r| r.service == self.config.service)
            .collect();
        records.sort_by_key(|r| (r.order, r.preference));

        records
            .iter()
            .filter_map(|r| {
                let credential = parse_dfsp_credential(&r.regexp.replace)?;
                Some(ResolutionRecord {
                    identifier: identifier.to_string(),
                    scheme_identifier: credential.scheme_identifier,
                    dfsp_scheme_identifier: credential.dfsp_scheme_identifier,
                    primary: r.preference == PRIMARY_PREFERENCE,
                })
            })
            .collect()
    }

    async fn reconcile(
        &self,
        phone: &PhoneNumber,
        dfsp_scheme_identifier: &str,
        primary: bool,
    ) -> Result<Outcome, RegistrationError> {
        match self.provisioning.get_profile_for_phone_number(phone).await? {
            Lookup::Found(profile_id) => {
                self.create_or_update(&profile_id, dfsp_scheme_identifier, true, primary)
                    .await
            }
            Lookup::NotFound => {
                tracing::info!(identifier = %phone, "no activated profile found");
                let profile_id = profile_id_for(phone);
                let outcome = self
                    .create_or_update(&profile_id, dfsp_scheme_identifier, false, primary)
                    .await?;
                tracing::info!(%profile_id, identifier = %phone, "activating profile for phone number");
                self.provisioning
                    .activate_phone_number(phone, &profile_id)
                    .await?;
                Ok(outcome)
            }
        }
    }

    async fn create_or_update(
        &self,
        profile_id: &str,
        dfsp_scheme_identifier: &str,
        activated: bool,
        primary: bool,
    ) -> Result<Outcome, RegistrationError> {
        match self.provisioning.find_profile(profile_id).await? {
            Lookup::Found(profile) if activated => {
                tracing::info!(%profile_id, "activated profile found, updating with new record");
                self.update_activated(profile, dfsp_scheme_identifier, primary)
                    .await
            }
            Lookup::Found(mut profile) => {
                tracing::info!(
                    %profile_id,
                    "inactive profile found, clearing existing records and adding new record"
                );
                let record = self.build_record(dfsp_scheme_identifier);
                profile.clear_records();
                profile.add_record(record.clone());
                self.provisioning.update_profile(&profile).await?;
                Ok(Outcome {
                    profile,
                    record,
                    updated: true,
                })
            }
            Lookup::NotFound => {
                tracing::info!(%profile_id, "profile not found, creating new");
                let record = self.build_record(dfsp_scheme_identifier);
                let mut profile = RoutingProfile::new(profile_id);
                profile.add_record(record.clone());
                self.provisioning.create_profile(&profile).await?;
                Ok(Outcome {
                    profile,
                    record,
                    updated: true,
                })
            }
        }
    }

    /// Insert, promote, or demote the DFSP's record in an activated profile.
    ///
    /// Records of other services are not carried over.
    async fn update_activated(
        &self,
        mut profile: RoutingProfile,
        dfsp_scheme_identifier: &str,
        primary: bool,
    ) -> Result<Outcome, RegistrationError> {
        let preference = preference_for(primary);
        let replace = self.config.replace_for(dfsp_scheme_identifier);

        let mut others: Vec<RoutingRecord> = profile
            .records
            .iter()
            .filter(|r| r.service == self.config.service)
            .cloned()
            .collect();

        let mut target = match others.iter().position(|r| r.regexp.replace == replace) {
            Some(index) if others[index].preference == preference => {
                tracing::warn!(
                    profile_id = %profile.id,
                    "record already exists and is current, no need to update profile"
                );
                let record = others.swap_remove(index);
                return Ok(Outcome {
                    profile,
                    record,
                    updated: false,
                });
            }
            Some(index) => others.remove(index),
            None => self.build_record(dfsp_scheme_identifier),
        };

        if !primary && !others.iter().any(|r| r.preference == PRIMARY_PREFERENCE) {
            return Err(RegistrationError::Primary);
        }

        profile.clear_records();
        target.preference = preference;
        profile.add_record(target.clone());
        for mut record in others {
            if primary {
                record.preference = NON_PRIMARY_PREFERENCE;
            }
            profile.add_record(record);
        }

        self.provisioning.update_profile(&profile).await?;
        Ok(Outcome {
            profile,
            record: target,
            updated: true,
        })
    }
}

#[async_trait]
impl Directory for TelephoneDirectory {
    fn identifier_type(&self) -> &str {
        "tel"
    }

    fn description(&self) -> &str {
        "E.164 phone number"
    }

    fn format(&self) -> Option<IdentifierFormat> {
        Some(IdentifierFormat::predicate(PhoneNumber::is_e164))
    }

    async fn find(&self, identifier: &str) -> Result<Vec<ResolutionRecord>, DirectoryError> {
        let phone = Self::validate(identifier)?;

        let records = self.query_records(&phone).await.map_err(|e| {
            tracing::error!(identifier = %phone, error = %e, "unhandled error returned when querying");
            DirectoryError::Internal(QUERY_FAILED.into())
        })?;

        let mapped = self.map_records(identifier, records);
        if mapped.is_empty() {
            return Err(DirectoryError::NotFound(NO_RECORDS.into()));
        }
        Ok(mapped)
    }

    fn supports_registration(&self) -> bool {
        true
    }

    async fn register_identifier(
        &self,
        request: &RegisterRequest,
    ) -> Result<ResolutionRecord, DirectoryError> {
        let phone = Self::validate(&request.identifier)?;

        let outcome = match self
            .reconcile(&phone, &request.dfsp_scheme_identifier, request.primary)
            .await
        {
            Ok(outcome) => outcome,
            Err(RegistrationError::Primary) => {
                return Err(DirectoryError::Primary(NO_PRIMARY.into()))
            }
            Err(RegistrationError::Remote(e)) => {
                tracing::error!(
                    identifier = %phone,
                    error = %e,
                    "unhandled error when registering phone number"
                );
                return Err(DirectoryError::Internal(REGISTRATION_FAILED.into()));
            }
        };

        if outcome.updated {
            self.cache
                .put(phone.digits(), outcome.profile.records, self.config.cache_ttl);
        }

        Ok(ResolutionRecord {
            identifier: request.identifier.clone(),
            scheme_identifier: self.config.scheme_identifier.clone(),
            dfsp_scheme_identifier: request.dfsp_scheme_identifier.clone(),
            primary: outcome.record.preference == PRIMARY_PREFERENCE,
        })
    }
}

impl std::fmt::Debug for TelephoneDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelephoneDirectory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
