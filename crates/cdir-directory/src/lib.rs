//! # cdir-directory -- Concrete directories
//!
//! - [`TelephoneDirectory`] (`tel`): E.164 numbers resolved and provisioned
//!   through pathfinder, with a TTL cache of routing records.
//! - [`EndUserRegistryDirectory`] (`eur`): numbers held by an end-user
//!   registry HTTP service.
//!
//! [`default_sources`] lists every directory this crate ships, ready to be
//! handed to [`Registry::register`](cdir_core::Registry::register).

pub mod cache;
pub mod config;
pub mod end_user_registry;
pub mod telephone;
pub mod uri;

pub use cache::{Clock, InMemoryRoutingCache, RoutingCache, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use cache::ManualClock;
pub use config::{ConfigError, EndUserRegistryConfig, TelephoneDirectoryConfig};
pub use end_user_registry::EndUserRegistryDirectory;
pub use telephone::TelephoneDirectory;

use std::sync::Arc;

use cdir_core::{Directory, DirectoryError, DirectorySource};

fn not_configured(identifier_type: &str, e: ConfigError) -> DirectoryError {
    DirectoryError::InvalidDirectory(format!(
        "directory '{identifier_type}' is not configured: {e}"
    ))
}

/// Every directory shipped by this crate, built from the environment when
/// the registry resolves them.
pub fn default_sources() -> Vec<DirectorySource> {
    vec![
        DirectorySource::deferred(|| {
            let directory = TelephoneDirectory::from_env().map_err(|e| not_configured("tel", e))?;
            Ok(Arc::new(directory) as Arc<dyn Directory>)
        }),
        DirectorySource::deferred(|| {
            let directory =
                EndUserRegistryDirectory::from_env().map_err(|e| not_configured("eur", e))?;
            Ok(Arc::new(directory) as Arc<dyn Directory>)
        }),
    ]
}
