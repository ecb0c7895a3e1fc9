//! # Directory Contract
//!
//! A [`Directory`] resolves identifiers of one identifier type to the DFSPs
//! that own them, and optionally lets a DFSP claim an identifier. Concrete
//! directories live in `cdir-directory`; the [`Registry`](crate::Registry)
//! validates them against this contract at startup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// The result of resolving one identifier to one DFSP's scheme code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    /// The identifier as supplied by the caller.
    pub identifier: String,
    /// Scheme code of the deployment that owns the DFSP.
    pub scheme_identifier: String,
    /// The DFSP's code within its scheme.
    pub dfsp_scheme_identifier: String,
    /// Whether this DFSP is the default receiver for the identifier.
    pub primary: bool,
}

/// A DFSP's request to claim (or update its claim on) an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub identifier: String,
    pub dfsp_scheme_identifier: String,
    #[serde(default)]
    pub primary: bool,
}

/// Shape restriction a directory places on its identifiers.
#[derive(Clone)]
pub enum IdentifierFormat {
    /// A regular expression, compiled by the registry at registration.
    Pattern(String),
    /// An arbitrary predicate.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IdentifierFormat {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }
}

impl std::fmt::Debug for IdentifierFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Predicate(_) => f.debug_tuple("Predicate").field(&"<fn>").finish(),
        }
    }
}

/// Resolver for one identifier type.
///
/// Implementations must be `Send + Sync` so the registry can hand them out
/// behind an `Arc` to concurrent callers. Each call is independent; no
/// ordering is guaranteed between concurrent `find` and
/// `register_identifier` calls on the same identifier.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The identifier type key (e.g. `"tel"`).
    fn identifier_type(&self) -> &str;

    /// Human-readable description shown when enumerating identifier types.
    fn description(&self) -> &str;

    /// Optional identifier format. `None` accepts every identifier.
    fn format(&self) -> Option<IdentifierFormat> {
        None
    }

    /// Resolve an identifier to the DFSPs that own it, most preferred first.
    async fn find(&self, identifier: &str) -> Result<Vec<ResolutionRecord>, DirectoryError>;

    /// Whether [`Directory::register_identifier`] is implemented.
    fn supports_registration(&self) -> bool {
        false
    }

    /// Claim or update a DFSP's ownership of an identifier.
    async fn register_identifier(
        &self,
        request: &RegisterRequest,
    ) -> Result<ResolutionRecord, DirectoryError> {
        let _ = request;
        Err(DirectoryError::RegistrationUnsupported {
            identifier_type: self.identifier_type().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    #[async_trait]
    impl Directory for ReadOnly {
        fn identifier_type(&self) -> &str {
            "ro"
        }
        fn description(&self) -> &str {
            "read only"
        }
        async fn find(&self, identifier: &str) -> Result<Vec<ResolutionRecord>, DirectoryError> {
            Ok(vec![ResolutionRecord {
                identifier: identifier.to_string(),
                scheme_identifier: "010".into(),
                dfsp_scheme_identifier: "001".into(),
                primary: true,
            }])
        }
    }

    #[tokio::test]
    async fn register_defaults_to_unsupported() {
        let dir = ReadOnly;
        assert!(!dir.supports_registration());
        let err = dir
            .register_identifier(&RegisterRequest {
                identifier: "1".into(),
                dfsp_scheme_identifier: "001".into(),
                primary: false,
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DirectoryError::RegistrationUnsupported {
                identifier_type: "ro".into()
            }
        );
    }

    #[test]
    fn resolution_record_uses_camel_case() {
        let record = ResolutionRecord {
            identifier: "14441235555".into(),
            scheme_identifier: "010".into(),
            dfsp_scheme_identifier: "001".into(),
            primary: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["schemeIdentifier"], "010");
        assert_eq!(json["dfspSchemeIdentifier"], "001");
    }

    #[test]
    fn register_request_primary_defaults_false() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"identifier":"14441235555","dfspSchemeIdentifier":"001"}"#,
        )
        .unwrap();
        assert!(!req.primary);
    }

    #[test]
    fn format_debug_hides_closure() {
        let f = IdentifierFormat::predicate(|s| s.len() == 3);
        assert_eq!(format!("{f:?}"), "Predicate(\"<fn>\")");
    }
}
