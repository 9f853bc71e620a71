//! Bundle manifest (chubconfig.toml)
//!
//! The manifest rides inside every .chub archive and records what was
//! packaged: the primary wheel(s) with their dependency wheel lists, staged
//! scripts and includes, the resolved compatibility targets with the
//! per-target wheel selection, and free-form metadata.

use crate::error::BundleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_built_at() -> DateTime<Utc> {
    Utc::now()
}

/// Archive manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChubManifest {
    /// Primary distribution name
    pub name: String,
    /// Primary distribution version
    pub version: String,

    /// `module:function` to run after install
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,

    /// Default arguments for the entrypoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint_args: Vec<String>,

    /// Primary wheel filename -> dependency wheel filenames
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wheels: BTreeMap<String, Vec<String>>,

    /// Included files, by archive destination
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    /// Staged install scripts
    #[serde(default)]
    pub scripts: ScriptsSection,

    /// Compatibility targets and per-target wheel selection
    #[serde(default)]
    pub compatibility: CompatibilitySection,

    /// Content hashes of the bundled wheels, by filename
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hashes: BTreeMap<String, String>,

    /// Free-form metadata entries
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    /// Build timestamp
    #[serde(default = "default_built_at")]
    pub built_at: DateTime<Utc>,
}

/// Install scripts, in run order, by staged archive name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptsSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<String>,
}

/// Compatibility section of the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilitySection {
    /// Resolved target strings (`universal` or combo strings)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Combo string -> dependency name -> selected wheel filename
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wheel_map: BTreeMap<String, BTreeMap<String, String>>,
}

impl ChubManifest {
    /// Create a manifest with the required fields set
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            entrypoint: None,
            entrypoint_args: Vec::new(),
            wheels: BTreeMap::new(),
            includes: Vec::new(),
            scripts: ScriptsSection::default(),
            compatibility: CompatibilitySection::default(),
            hashes: BTreeMap::new(),
            metadata: BTreeMap::new(),
            built_at: Utc::now(),
        }
    }

    /// Validate manifest invariants before writing.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.name.trim().is_empty() {
            return Err(BundleError::MissingField {
                field: "name".to_string(),
            });
        }
        if self.version.trim().is_empty() {
            return Err(BundleError::MissingField {
                field: "version".to_string(),
            });
        }

        for (wheel, deps) in &self.wheels {
            if !wheel.ends_with(".whl") {
                return Err(BundleError::InvalidWheelName {
                    name: wheel.clone(),
                });
            }
            for dep in deps {
                if !dep.ends_with(".whl") {
                    return Err(BundleError::InvalidWheelName { name: dep.clone() });
                }
            }
        }

        // Entrypoint stays a single token; argument parsing happens at run time
        if let Some(entrypoint) = &self.entrypoint {
            if entrypoint.contains(char::is_whitespace) || !entrypoint.contains(':') {
                return Err(BundleError::InvalidEntrypoint {
                    value: entrypoint.clone(),
                });
            }
        }

        Ok(())
    }

    /// Serialize to the TOML document stored in the archive.
    pub fn to_toml_string(&self) -> Result<String, BundleError> {
        toml::to_string_pretty(self).map_err(|e| BundleError::Serialize {
            message: e.to_string(),
        })
    }

    /// Parse a manifest from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, BundleError> {
        toml::from_str(text).map_err(|e| BundleError::Serialize {
            message: e.to_string(),
        })
    }
}
