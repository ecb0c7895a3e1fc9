//! # Identifier Resolver
//!
//! Turns `type:identifier` queries into displayable DFSPs. The resolver
//! picks the directory from the [`Registry`], checks the identifier against
//! the directory's format, runs the directory, and maps each
//! [`ResolutionRecord`] to a DFSP through the [`DfspLookup`] collaborator.
//!
//! When a directory reports that nothing is registered for an identifier,
//! `lookup` falls back to the configured default DFSP, flagged as not
//! registered.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::directory::{RegisterRequest, ResolutionRecord};
use crate::error::DirectoryError;
use crate::registry::{DirectoryEntry, IdentifierTypeInfo, Registry};

/// A DFSP as known to the DFSP lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dfsp {
    pub name: String,
    pub short_name: String,
    /// Base URL of the DFSP's own API.
    pub url: String,
    pub dfsp_scheme_identifier: String,
}

/// What a caller sees for each DFSP an identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfspResolution {
    pub name: String,
    pub provider_url: String,
    pub short_name: String,
    pub primary: bool,
    /// `false` when the identifier is unknown and the default DFSP answered.
    pub registered: bool,
}

impl DfspResolution {
    fn new(dfsp: &Dfsp, primary: bool, registered: bool) -> Self {
        Self {
            name: dfsp.name.clone(),
            provider_url: dfsp.url.clone(),
            short_name: dfsp.short_name.clone(),
            primary,
            registered,
        }
    }
}

/// DFSP lookup collaborator.
#[async_trait]
pub trait DfspLookup: Send + Sync {
    /// Find a DFSP by its scheme code. `Ok(None)` when no such DFSP exists.
    async fn get_by_dfsp_scheme_identifier(
        &self,
        dfsp_scheme_identifier: &str,
    ) -> Result<Option<Dfsp>, DirectoryError>;

    /// The DFSP that receives traffic for unregistered identifiers.
    async fn get_default_dfsp(&self) -> Result<Dfsp, DirectoryError>;
}

/// Errors loading an [`InMemoryDfsps`] store from disk.
#[derive(Debug, thiserror::Error)]
pub enum DfspStoreError {
    #[error("failed to read DFSP file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse DFSP file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// In-memory [`DfspLookup`], keyed by DFSP scheme code.
#[derive(Debug, Default)]
pub struct InMemoryDfsps {
    dfsps: RwLock<HashMap<String, Dfsp>>,
    default_name: Option<String>,
}

impl InMemoryDfsps {
    /// Create a store whose default DFSP is the one named `default_name`.
    pub fn new(default_name: Option<String>) -> Self {
        Self {
            dfsps: RwLock::new(HashMap::new()),
            default_name,
        }
    }

    /// Load a JSON array of [`Dfsp`] from `path`.
    pub fn from_json_file(
        path: impl AsRef<Path>,
        default_name: Option<String>,
    ) -> Result<Self, DfspStoreError> {
        let raw = std::fs::read_to_string(path)?;
        let dfsps: Vec<Dfsp> = serde_json::from_str(&raw)?;
        let store = Self::new(default_name);
        for dfsp in dfsps {
            store.insert(dfsp);
        }
        Ok(store)
    }

    pub fn insert(&self, dfsp: Dfsp) {
        self.dfsps
            .write()
            .insert(dfsp.dfsp_scheme_identifier.clone(), dfsp);
    }

    pub fn len(&self) -> usize {
        self.dfsps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dfsps.read().is_empty()
    }
}

#[async_trait]
impl DfspLookup for InMemoryDfsps {
    async fn get_by_dfsp_scheme_identifier(
        &self,
        dfsp_scheme_identifier: &str,
    ) -> Result<Option<Dfsp>, DirectoryError> {
        Ok(self.dfsps.read().get(dfsp_scheme_identifier).cloned())
    }

    async fn get_default_dfsp(&self) -> Result<Dfsp, DirectoryError> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| DirectoryError::Internal("Error retrieving DFSP.".into()))?;
        self.dfsps
            .read()
            .values()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| DirectoryError::Internal("Error retrieving DFSP.".into()))
    }
}

/// Split a `type:identifier` query. A query without `:` yields two empty
/// parts, which no registry will accept.
pub fn parse_query(query: &str) -> (&str, &str) {
    query.split_once(':').unwrap_or(("", ""))
}

/// Resolves identifier queries against a registry and a DFSP lookup.
pub struct Resolver {
    registry: Arc<Registry>,
    dfsps: Arc<dyn DfspLookup>,
    scheme_identifier: String,
}

impl Resolver {
    pub fn new(
        registry: Arc<Registry>,
        dfsps: Arc<dyn DfspLookup>,
        scheme_identifier: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            dfsps,
            scheme_identifier: scheme_identifier.into(),
        }
    }

    /// Registered identifier types, in registration order.
    pub fn identifier_types(&self) -> &[IdentifierTypeInfo] {
        self.registry.identifier_types()
    }

    fn validate<'q>(&self, query: &'q str) -> Result<(&DirectoryEntry, &'q str), DirectoryError> {
        let (identifier_type, identifier) = parse_query(query);
        let entry = self
            .registry
            .by_identifier_type(identifier_type)
            .ok_or_else(|| DirectoryError::UnknownIdentifierType(identifier_type.to_string()))?;
        if !entry.is_identifier_valid(identifier) {
            return Err(DirectoryError::InvalidIdentifier(format!(
                "'{identifier}' is not a valid identifier for identifierType '{identifier_type}'"
            )));
        }
        Ok((entry, identifier))
    }

    /// Resolve a query to the DFSPs that own the identifier.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::UnknownIdentifierType`] / `InvalidIdentifier` for
    ///   a malformed query
    /// - [`DirectoryError::NotFound`] for cross-scheme results
    /// - whatever the directory or DFSP lookup reports otherwise
    pub async fn lookup(&self, query: &str) -> Result<Vec<DfspResolution>, DirectoryError> {
        let (entry, identifier) = self.validate(query)?;

        let records = match entry.directory().find(identifier).await {
            Ok(records) => records,
            Err(DirectoryError::NotFound(reason)) => {
                tracing::info!(%identifier, %reason, "identifier not registered, using default DFSP");
                let dfsp = self.dfsps.get_default_dfsp().await?;
                return Ok(vec![DfspResolution::new(&dfsp, true, false)]);
            }
            Err(e) => return Err(e),
        };

        if records
            .iter()
            .any(|r| r.scheme_identifier != self.scheme_identifier)
        {
            return Err(DirectoryError::NotFound(
                "Cross-scheme lookups are not currently supported".into(),
            ));
        }

        let mut resolved = Vec::with_capacity(records.len());
        for record in &records {
            match self
                .dfsps
                .get_by_dfsp_scheme_identifier(&record.dfsp_scheme_identifier)
                .await?
            {
                Some(dfsp) => resolved.push(DfspResolution::new(&dfsp, record.primary, true)),
                None => tracing::warn!(
                    dfsp_scheme_identifier = %record.dfsp_scheme_identifier,
                    "resolved DFSP is unknown, skipping"
                ),
            }
        }
        Ok(resolved)
    }

    /// Claim an identifier for a DFSP.
    pub async fn register(
        &self,
        query: &str,
        dfsp_scheme_identifier: &str,
        primary: bool,
    ) -> Result<DfspResolution, DirectoryError> {
        let (entry, identifier) = self.validate(query)?;
        let request = RegisterRequest {
            identifier: identifier.to_string(),
            dfsp_scheme_identifier: dfsp_scheme_identifier.to_string(),
            primary,
        };
        let record: ResolutionRecord = entry.directory().register_identifier(&request).await?;

        let dfsp = self
            .dfsps
            .get_by_dfsp_scheme_identifier(&record.dfsp_scheme_identifier)
            .await?
            .ok_or_else(|| {
                tracing::error!(
                    dfsp_scheme_identifier = %record.dfsp_scheme_identifier,
                    "registered DFSP is unknown to the DFSP lookup"
                );
                DirectoryError::Internal("The identifier could not be registered".into())
            })?;
        Ok(DfspResolution::new(&dfsp, record.primary, true))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("scheme_identifier", &self.scheme_identifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Directory, IdentifierFormat};
    use crate::registry::DirectorySource;
    use std::io::Write;

    /// Directory that answers from a fixed table.
    struct TableDirectory {
        records: HashMap<String, Vec<ResolutionRecord>>,
    }

    #[async_trait]
    impl Directory for TableDirectory {
        fn identifier_type(&self) -> &str {
            "num"
        }
        fn description(&self) -> &str {
            "numbers"
        }
        fn format(&self) -> Option<IdentifierFormat> {
            Some(IdentifierFormat::pattern(r"^\d+$"))
        }
        async fn find(&self, identifier: &str) -> Result<Vec<ResolutionRecord>, DirectoryError> {
            self.records
                .get(identifier)
                .cloned()
                .ok_or_else(|| DirectoryError::NotFound("not here".into()))
        }
        fn supports_registration(&self) -> bool {
            true
        }
        async fn register_identifier(
            &self,
            request: &RegisterRequest,
        ) -> Result<ResolutionRecord, DirectoryError> {
            Ok(ResolutionRecord {
                identifier: request.identifier.clone(),
                scheme_identifier: "010".into(),
                dfsp_scheme_identifier: request.dfsp_scheme_identifier.clone(),
                primary: request.primary,
            })
        }
    }

    fn record(scheme: &str, dfsp: &str, primary: bool) -> ResolutionRecord {
        ResolutionRecord {
            identifier: "1".into(),
            scheme_identifier: scheme.into(),
            dfsp_scheme_identifier: dfsp.into(),
            primary,
        }
    }

    fn dfsp(name: &str, code: &str) -> Dfsp {
        Dfsp {
            name: name.into(),
            short_name: name.to_uppercase(),
            url: format!("http://{name}.example"),
            dfsp_scheme_identifier: code.into(),
        }
    }

    fn resolver(records: HashMap<String, Vec<ResolutionRecord>>) -> Resolver {
        let mut registry = Registry::new();
        registry
            .register([DirectorySource::ready(TableDirectory { records })])
            .unwrap();
        let dfsps = InMemoryDfsps::new(Some("dfsp1".into()));
        dfsps.insert(dfsp("dfsp1", "001"));
        dfsps.insert(dfsp("dfsp2", "002"));
        Resolver::new(Arc::new(registry), Arc::new(dfsps), "010")
    }

    #[test]
    fn parse_query_splits_on_first_colon() {
        assert_eq!(parse_query("tel:+14441235555"), ("tel", "+14441235555"));
        assert_eq!(parse_query("no-colon"), ("", ""));
        assert_eq!(parse_query("tel:a:b"), ("tel", "a:b"));
    }

    #[tokio::test]
    async fn lookup_maps_records_to_dfsps() {
        let mut table = HashMap::new();
        table.insert(
            "1".to_string(),
            vec![record("010", "002", true), record("010", "001", false)],
        );
        let found = resolver(table).lookup("num:1").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "dfsp2");
        assert!(found[0].primary);
        assert!(found[0].registered);
        assert_eq!(found[1].name, "dfsp1");
        assert!(!found[1].primary);
    }

    #[tokio::test]
    async fn lookup_falls_back_to_default_dfsp() {
        let found = resolver(HashMap::new()).lookup("num:5").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "dfsp1");
        assert!(found[0].primary);
        assert!(!found[0].registered);
    }

    #[tokio::test]
    async fn lookup_rejects_cross_scheme_results() {
        let mut table = HashMap::new();
        table.insert("1".to_string(), vec![record("999", "001", true)]);
        let err = resolver(table).lookup("num:1").await.unwrap_err();
        assert_eq!(
            err,
            DirectoryError::NotFound("Cross-scheme lookups are not currently supported".into())
        );
    }

    #[tokio::test]
    async fn lookup_skips_unknown_dfsps() {
        let mut table = HashMap::new();
        table.insert(
            "1".to_string(),
            vec![record("010", "777", true), record("010", "001", false)],
        );
        let found = resolver(table).lookup("num:1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "dfsp1");
    }

    #[tokio::test]
    async fn lookup_validates_type_and_format() {
        let r = resolver(HashMap::new());
        assert_eq!(
            r.lookup("fax:1").await.unwrap_err(),
            DirectoryError::UnknownIdentifierType("fax".into())
        );
        assert_eq!(
            r.lookup("num:abc").await.unwrap_err(),
            DirectoryError::InvalidIdentifier(
                "'abc' is not a valid identifier for identifierType 'num'".into()
            )
        );
    }

    #[tokio::test]
    async fn register_maps_result_to_dfsp() {
        let r = resolver(HashMap::new());
        let resolved = r.register("num:1", "002", true).await.unwrap();
        assert_eq!(resolved.name, "dfsp2");
        assert!(resolved.primary);
        assert!(resolved.registered);
    }

    #[tokio::test]
    async fn default_dfsp_missing_is_internal() {
        let store = InMemoryDfsps::new(None);
        assert_eq!(
            store.get_default_dfsp().await.unwrap_err(),
            DirectoryError::Internal("Error retrieving DFSP.".into())
        );
    }

    #[test]
    fn loads_dfsps_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name":"dfsp1","shortName":"D1","url":"http://d1","dfspSchemeIdentifier":"001"}}]"#
        )
        .unwrap();
        let store = InMemoryDfsps::from_json_file(file.path(), Some("dfsp1".into())).unwrap();
        assert_eq!(store.len(), 1);
    }
}
