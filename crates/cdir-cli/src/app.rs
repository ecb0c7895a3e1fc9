//! Startup wiring: registry, DFSP store, and resolver.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cdir_core::{DirectorySource, InMemoryDfsps, Registry, Resolver};

/// Register `sources` into a fresh registry.
pub fn build_registry(sources: Vec<DirectorySource>) -> anyhow::Result<Registry> {
    let mut registry = Registry::new();
    registry
        .register(sources)
        .context("failed to register directories")?;
    Ok(registry)
}

/// Load DFSPs from `path`, or start empty. `DEFAULT_DFSP` names the
/// fallback DFSP.
pub fn load_dfsps(path: Option<&Path>) -> anyhow::Result<InMemoryDfsps> {
    let default_name = std::env::var("DEFAULT_DFSP").ok();
    match path {
        Some(path) => InMemoryDfsps::from_json_file(path, default_name)
            .with_context(|| format!("failed to load DFSPs from {}", path.display())),
        None => {
            tracing::warn!("no DFSP file given; lookups can only fail or fall back");
            Ok(InMemoryDfsps::new(default_name))
        }
    }
}

/// Build the resolver over every shipped directory.
pub fn build_resolver(dfsps_path: Option<&Path>) -> anyhow::Result<Resolver> {
    let scheme_identifier =
        std::env::var("SCHEME_ID").context("SCHEME_ID environment variable is required")?;
    let registry = build_registry(cdir_directory::default_sources())?;
    let dfsps = load_dfsps(dfsps_path)?;
    tracing::info!(
        directories = registry.len(),
        dfsps = dfsps.len(),
        %scheme_identifier,
        "resolver ready"
    );
    Ok(Resolver::new(
        Arc::new(registry),
        Arc::new(dfsps),
        scheme_identifier,
    ))
}
