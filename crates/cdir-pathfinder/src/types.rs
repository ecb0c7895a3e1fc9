//! Pathfinder wire types.
//!
//! A routing profile is a named, ordered set of NAPTR-style records. A
//! phone number is activated for at most one profile; the query service
//! answers with the records of that profile.

use serde::{Deserialize, Serialize};

/// Substitution rule of a routing record. `replace` is a URI whose
/// credential part names the owning DFSP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRegexp {
    pub pattern: String,
    pub replace: String,
}

/// One routing record inside a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRecord {
    /// Processing order; lower first.
    pub order: u32,
    /// Preference among records of equal order; lower first.
    pub preference: u32,
    pub service: String,
    pub partner_id: String,
    pub regexp: RecordRegexp,
}

/// A named collection of routing records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingProfile {
    pub id: String,
    #[serde(default)]
    pub records: Vec<RoutingRecord>,
}

impl RoutingProfile {
    /// An empty profile.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            records: Vec::new(),
        }
    }

    pub fn clear_records(&mut self) {
        self.records.clear();
    }

    pub fn add_record(&mut self, record: RoutingRecord) {
        self.records.push(record);
    }
}

/// Result of a record query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub records: Vec<RoutingRecord>,
}

/// Outcome of a provisioning read that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }
}

/// Body of `GET /phone-numbers/{digits}/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhoneNumberProfile {
    pub profile_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_partner_id_in_camel_case() {
        let record = RoutingRecord {
            order: 10,
            preference: 1,
            service: "E2U+pstn:tel".into(),
            partner_id: "10305".into(),
            regexp: RecordRegexp {
                pattern: "^.*$".into(),
                replace: "mm:001.001@mojaloop.org".into(),
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["partnerId"], "10305");
        assert_eq!(json["regexp"]["replace"], "mm:001.001@mojaloop.org");
    }

    #[test]
    fn profile_records_default_to_empty() {
        let profile: RoutingProfile = serde_json::from_str(r#"{"id":"Profile-1"}"#).unwrap();
        assert!(profile.records.is_empty());
    }

    #[test]
    fn lookup_from_option() {
        assert_eq!(Lookup::from(Some(3)), Lookup::Found(3));
        assert!(!Lookup::<u8>::from(None).is_found());
        assert_eq!(Lookup::Found("x").into_option(), Some("x"));
    }
}
