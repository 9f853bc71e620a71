//! chubproject.toml configuration
//!
//! A chubproject file records the packaging options for a project so they do
//! not have to be repeated on the command line. Options live under a dotted
//! table (default `chub.package`), which allows embedding the same block in
//! another TOML document (e.g. a pyproject-style file). CLI flags always
//! override file values.

use crate::compat::spec::{CompatibilitySpecLayer, MergeStrategy};
use crate::error::ProjectError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default table holding the packaging options
pub const DEFAULT_TABLE: &str = "chub.package";

/// Packaging options loaded from a chubproject file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChubProject {
    /// Wheel specs: local .whl paths or pip-style requirements
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wheels: Vec<String>,

    /// Output archive path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chub: Option<PathBuf>,

    /// `module:function` to run after install
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,

    /// Default arguments passed to the entrypoint
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entrypoint_args: Vec<String>,

    /// Extra files to include (`SRC` or `SRC::DEST`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    /// Pre-install scripts, in run order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_scripts: Vec<String>,

    /// Post-install scripts, in run order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_scripts: Vec<String>,

    /// Free-form metadata entries embedded in the manifest
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    /// Compatibility analysis options
    pub compatibility: CompatibilityOptions,
}

/// Compatibility options within a chubproject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityOptions {
    /// Single explicit target (e.g. "universal")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Explicit target list
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// User compatibility spec file layered over the embedded default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_file: Option<PathBuf>,

    /// Strategy for combining the spec file with the default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,

    /// Inline spec overrides, applied last with override semantics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<CompatibilitySpecLayer>,
}

impl ChubProject {
    /// Load options from a chubproject file, reading the given dotted table.
    pub fn load(path: &Path, table: &str) -> Result<Self, ProjectError> {
        if !path.exists() {
            return Err(ProjectError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| ProjectError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let document: toml::Value =
            toml::from_str(&text).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut value = &document;
        for segment in table.split('.') {
            value = value
                .get(segment)
                .ok_or_else(|| ProjectError::TableNotFound {
                    path: path.to_path_buf(),
                    table: table.to_string(),
                })?;
        }

        value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| ProjectError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Save options to a chubproject file under the given dotted table.
    pub fn save(&self, path: &Path, table: &str, overwrite: bool) -> Result<(), ProjectError> {
        if path.exists() && !overwrite {
            return Err(ProjectError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let mut value = toml::Value::try_from(self).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        for segment in table.split('.').rev() {
            let mut wrapper = toml::value::Table::new();
            wrapper.insert(segment.to_string(), value);
            value = toml::Value::Table(wrapper);
        }

        let text = toml::to_string_pretty(&value).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, text).map_err(|source| ProjectError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}
