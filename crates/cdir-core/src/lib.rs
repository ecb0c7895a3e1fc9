//! # cdir-core -- Foundational types for the central directory
//!
//! The central directory answers "which DFSP owns this identifier?" for a
//! payment scheme. This crate holds the parts every directory shares:
//!
//! - **Identifiers** ([`identity`]): validated [`PhoneNumber`] and
//!   [`IdentifierType`] newtypes.
//! - **Directory contract** ([`directory`]): the async [`Directory`] trait
//!   and the [`ResolutionRecord`] it produces.
//! - **Registry** ([`registry`]): a keyed collection of validated
//!   directories, built once at startup.
//! - **Resolver** ([`resolver`]): `type:identifier` queries mapped to
//!   displayable DFSPs.
//!
//! Concrete directories live in `cdir-directory`; the remote routing
//! service they talk to is wrapped by `cdir-pathfinder`.

pub mod directory;
pub mod error;
pub mod identity;
pub mod registry;
pub mod resolver;

pub use directory::{Directory, IdentifierFormat, RegisterRequest, ResolutionRecord};
pub use error::{DirectoryError, ErrorCategory, ValidationError};
pub use identity::{IdentifierType, PhoneNumber};
pub use registry::{DirectoryEntry, DirectorySource, IdentifierTypeInfo, Registry};
pub use resolver::{parse_query, Dfsp, DfspLookup, DfspResolution, InMemoryDfsps, Resolver};
