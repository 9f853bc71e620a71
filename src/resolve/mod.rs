//! Wheel resolution
//!
//! This module provides:
//! - The [`WheelResolver`] trait: an explicit, ordered strategy interface
//! - Local filesystem resolution for existing .whl paths
//! - Package index resolution for pip-style requirement specs
//! - Transitive dependency traversal over Requires-Dist metadata

mod client;
mod index;
mod local;
mod project;

pub use client::HttpClient;
pub use index::{IndexResolver, DEFAULT_INDEX_URL};
pub use local::LocalPathResolver;
pub use project::{parse_requirement_name, resolve_project_wheels};

use crate::error::ResolveError;
use crate::wheel::WheelSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Strategy interface for turning a wheel spec into a wheel file on disk
///
/// Resolvers are tried in list order; the first one whose `can_handle`
/// returns true owns the spec.
#[async_trait]
pub trait WheelResolver: Send + Sync {
    /// Short name for error messages
    fn name(&self) -> &'static str;

    /// Whether this resolver recognizes the spec
    fn can_handle(&self, spec: &str) -> bool;

    /// Provenance recorded on wheels this resolver produces
    fn source(&self) -> WheelSource;

    /// Produce a wheel file for the spec inside `dest_dir`
    async fn resolve(&self, spec: &str, dest_dir: &Path) -> Result<PathBuf, ResolveError>;
}

/// The default resolver chain: local paths first, then the package index.
pub fn default_resolvers(client: HttpClient, index_url: String) -> Vec<Box<dyn WheelResolver>> {
    vec![
        Box::new(LocalPathResolver::new()),
        Box::new(IndexResolver::new(client, index_url)),
    ]
}

/// Resolve one spec through the ordered resolver list.
///
/// Returns the staged wheel path and the provenance of the resolver that
/// handled the spec.
pub async fn resolve_spec(
    spec: &str,
    dest_dir: &Path,
    resolvers: &[Box<dyn WheelResolver>],
) -> Result<(PathBuf, WheelSource), ResolveError> {
    for resolver in resolvers {
        if resolver.can_handle(spec) {
            let path = resolver.resolve(spec, dest_dir).await?;
            return Ok((path, resolver.source()));
        }
    }
    Err(ResolveError::UnhandledSpec {
        spec: spec.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_spec_unhandled() {
        let resolvers: Vec<Box<dyn WheelResolver>> = vec![Box::new(LocalPathResolver::new())];
        let dir = tempfile::tempdir().unwrap();
        // a requirement spec is not a local path, and no index resolver is registered
        let err = resolve_spec("requests>=2.28", dir.path(), &resolvers)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnhandledSpec { .. }));
    }

    #[test]
    fn test_default_resolvers_order() {
        let client = HttpClient::new().unwrap();
        let resolvers = default_resolvers(client, DEFAULT_INDEX_URL.to_string());
        assert_eq!(resolvers.len(), 2);
        assert_eq!(resolvers[0].name(), "local-path");
        assert_eq!(resolvers[1].name(), "package-index");
    }
}
