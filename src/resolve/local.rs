//! Local filesystem wheel resolution
//!
//! Handles specs that name an existing .whl file. The wheel is copied into
//! the staging directory unless it already lives there.

use crate::error::ResolveError;
use crate::resolve::WheelResolver;
use crate::wheel::WheelSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Resolver for wheel files already on disk
#[derive(Debug, Default)]
pub struct LocalPathResolver;

impl LocalPathResolver {
    /// Create a new local path resolver
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WheelResolver for LocalPathResolver {
    fn name(&self) -> &'static str {
        "local-path"
    }

    fn can_handle(&self, spec: &str) -> bool {
        spec.ends_with(".whl")
    }

    fn source(&self) -> WheelSource {
        WheelSource::Path
    }

    async fn resolve(&self, spec: &str, dest_dir: &Path) -> Result<PathBuf, ResolveError> {
        let source = PathBuf::from(spec);
        if !source.is_file() {
            return Err(ResolveError::resolution_failed(
                spec,
                self.name(),
                "file does not exist",
            ));
        }

        let filename = source
            .file_name()
            .ok_or_else(|| ResolveError::resolution_failed(spec, self.name(), "no filename"))?;
        let dest = dest_dir.join(filename);

        if source == dest {
            return Ok(dest);
        }

        tokio::fs::copy(&source, &dest)
            .await
            .map_err(|source| ResolveError::Io {
                path: dest.clone(),
                source,
            })?;
        Ok(dest)
    }
}
