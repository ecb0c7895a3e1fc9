//! # Directory Registry
//!
//! Holds the set of registered [`Directory`] implementations, keyed by
//! identifier type. The registry is an ordinary value built by the process
//! composition root: registration takes `&mut self`, so it is serialized by
//! construction during startup, and the populated registry is shared
//! read-only behind an `Arc` afterwards.
//!
//! ## Contract validation
//!
//! Each directory is checked when it is registered:
//!
//! - `identifier_type` must be a non-empty plain token
//! - `description` must be non-empty
//! - a `format` pattern must compile as a regular expression
//! - the identifier type must not already be registered, nor appear twice
//!   in the same batch
//!
//! ## Batch semantics
//!
//! A batch is all-or-nothing. Every source is resolved and validated before
//! anything is committed, so a failing batch leaves the registry exactly as
//! it was.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::directory::{Directory, IdentifierFormat};
use crate::error::{DirectoryError, ValidationError};
use crate::identity::IdentifierType;

/// Lazily constructs a directory at registration time.
pub type DirectoryFactory =
    Box<dyn FnOnce() -> Result<Arc<dyn Directory>, DirectoryError> + Send>;

/// A directory handed to [`Registry::register`].
pub enum DirectorySource {
    /// An already-constructed directory.
    Ready(Arc<dyn Directory>),
    /// A factory, run when the batch is registered. Used to defer building
    /// remote clients until configuration is known to be complete.
    Deferred(DirectoryFactory),
}

impl DirectorySource {
    pub fn ready<D: Directory + 'static>(directory: D) -> Self {
        Self::Ready(Arc::new(directory))
    }

    pub fn deferred<F>(factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn Directory>, DirectoryError> + Send + 'static,
    {
        Self::Deferred(Box::new(factory))
    }

    fn resolve(self) -> Result<Arc<dyn Directory>, DirectoryError> {
        match self {
            Self::Ready(directory) => Ok(directory),
            Self::Deferred(factory) => factory(),
        }
    }
}

impl From<Arc<dyn Directory>> for DirectorySource {
    fn from(directory: Arc<dyn Directory>) -> Self {
        Self::Ready(directory)
    }
}

impl std::fmt::Debug for DirectorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(d) => f.debug_tuple("Ready").field(&d.identifier_type()).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").finish(),
        }
    }
}

#[derive(Clone)]
enum IdentifierValidator {
    Any,
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IdentifierValidator {
    fn from_format(format: Option<IdentifierFormat>) -> Result<Self, DirectoryError> {
        match format {
            None => Ok(Self::Any),
            Some(IdentifierFormat::Pattern(pattern)) => Regex::new(&pattern)
                .map(Self::Pattern)
                .map_err(|_| {
                    DirectoryError::InvalidDirectory(
                        "'format' must be a regular expression or function".into(),
                    )
                }),
            Some(IdentifierFormat::Predicate(f)) => Ok(Self::Predicate(f)),
        }
    }

    fn is_valid(&self, identifier: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Pattern(re) => re.is_match(identifier),
            Self::Predicate(f) => f(identifier),
        }
    }
}

/// A directory accepted by the registry.
#[derive(Clone)]
pub struct DirectoryEntry {
    identifier_type: IdentifierType,
    description: String,
    directory: Arc<dyn Directory>,
    validator: IdentifierValidator,
}

impl DirectoryEntry {
    pub fn identifier_type(&self) -> &IdentifierType {
        &self.identifier_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The underlying directory.
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Check an identifier against the directory's declared format.
    pub fn is_identifier_valid(&self, identifier: &str) -> bool {
        self.validator.is_valid(identifier)
    }
}

impl std::fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("identifier_type", &self.identifier_type)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Enumeration entry returned by [`Registry::identifier_types`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierTypeInfo {
    pub identifier_type: String,
    pub description: String,
}

/// The set of registered directories.
#[derive(Default)]
pub struct Registry {
    directories: HashMap<IdentifierType, DirectoryEntry>,
    identifier_types: Vec<IdentifierTypeInfo>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of directories.
    ///
    /// Returns the accepted entries in batch order.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InvalidDirectory`] on the first contract
    /// violation or duplicate identifier type, or whatever error a deferred
    /// factory produced. On error nothing from the batch is registered.
    pub fn register<I>(&mut self, sources: I) -> Result<Vec<DirectoryEntry>, DirectoryError>
    where
        I: IntoIterator<Item = DirectorySource>,
    {
        let mut accepted: Vec<DirectoryEntry> = Vec::new();

        for source in sources {
            let entry = Self::validate(source.resolve()?)?;
            let duplicate = self
                .directories
                .contains_key(entry.identifier_type.as_str())
                || accepted
                    .iter()
                    .any(|e| e.identifier_type == entry.identifier_type);
            if duplicate {
                return Err(DirectoryError::InvalidDirectory(format!(
                    "Directory with 'identifierType' = '{}' has already been registered",
                    entry.identifier_type
                )));
            }
            accepted.push(entry);
        }

        for entry in &accepted {
            tracing::info!(
                identifier_type = %entry.identifier_type,
                description = %entry.description,
                "registered directory"
            );
            self.identifier_types.push(IdentifierTypeInfo {
                identifier_type: entry.identifier_type.to_string(),
                description: entry.description.clone(),
            });
            self.directories
                .insert(entry.identifier_type.clone(), entry.clone());
        }

        Ok(accepted)
    }

    fn validate(directory: Arc<dyn Directory>) -> Result<DirectoryEntry, DirectoryError> {
        let identifier_type = IdentifierType::new(directory.identifier_type()).map_err(|e| {
            DirectoryError::InvalidDirectory(match e {
                ValidationError::EmptyIdentifierType => {
                    "Directory does not implement required property 'identifierType'".into()
                }
                _ => "'identifierType' must be a plain token without ':' or whitespace".into(),
            })
        })?;

        let description = directory.description();
        if description.trim().is_empty() {
            return Err(DirectoryError::InvalidDirectory(
                "Directory does not implement required property 'description'".into(),
            ));
        }
        let description = description.to_string();

        let validator = IdentifierValidator::from_format(directory.format())?;

        Ok(DirectoryEntry {
            identifier_type,
            description,
            directory,
            validator,
        })
    }

    /// Look up the directory for an identifier type.
    pub fn by_identifier_type(&self, identifier_type: &str) -> Option<&DirectoryEntry> {
        self.directories.get(identifier_type)
    }

    /// Registered identifier types, in registration order.
    pub fn identifier_types(&self) -> &[IdentifierTypeInfo] {
        &self.identifier_types
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("identifier_types", &self.identifier_types)
            .finish()
    }
}
