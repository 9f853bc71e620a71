//! Compatibility spec model
//!
//! The spec document has four top-level tables: `PythonVersions`, `AbiValues`,
//! `PlatformValues.<os>` (with platform families nested under each OS), and
//! `CompatibilityTags.<profile>`. Documents are loaded as partially-populated
//! layers (every field optional) so that an embedded default, a user file, and
//! inline overrides can be combined; the resolved [`CompatibilitySpec`] applies
//! defaults on top of the final layer.
//!
//! Two combination strategies exist:
//! - `override`: nested tables recurse key-by-key; any present non-table value
//!   (lists included) fully replaces the base value.
//! - `merge`: nested tables recurse; lists concatenate base-first with
//!   override items deduplicated against the base; scalars replace.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Strategy for combining spec layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Present override values fully replace base values
    Override,
    /// Lists append-dedupe onto the base, scalars replace
    #[default]
    Merge,
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "override" => Ok(MergeStrategy::Override),
            "merge" => Ok(MergeStrategy::Merge),
            other => Err(format!(
                "invalid merge strategy '{}': expected 'override' or 'merge'",
                other
            )),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Override => write!(f, "override"),
            MergeStrategy::Merge => write!(f, "merge"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved model
// ---------------------------------------------------------------------------

/// Accepted Python interpreter versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonVersionsSpec {
    /// Minimum version label (e.g. "3.9"); defaults to the runtime major line
    pub min: Option<String>,
    /// Maximum version label, optionally prefixed with `<=` or `<`
    pub max: Option<String>,
    /// Informational interpreter type names
    pub types: Vec<String>,
    /// Accept `py<major>` universal interpreter labels within bounds
    pub accept_universal: bool,
    /// Explicitly accepted labels (additive unless specific_only)
    pub specific: Vec<String>,
    /// Whitelist mode: only `specific` labels are accepted
    pub specific_only: bool,
    /// Explicitly rejected labels (always win)
    pub excludes: Vec<String>,
}

impl Default for PythonVersionsSpec {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            types: Vec::new(),
            accept_universal: true,
            specific: Vec::new(),
            specific_only: false,
            excludes: Vec::new(),
        }
    }
}

/// Accepted ABI values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbiValuesSpec {
    /// Accept debug ABIs (trailing `d`)
    pub include_debug: bool,
    /// Accept stable ABIs (`none`, `abi3`, ...)
    pub include_stable: bool,
    /// Explicitly accepted labels
    pub specific: Vec<String>,
    /// Whitelist mode
    pub specific_only: bool,
    /// Explicitly rejected labels
    pub excludes: Vec<String>,
}

/// Version range for one platform family (glibc-like versions, `*` = no bound)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFamilySpec {
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Platform rules grouped under one OS umbrella
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOsSpec {
    /// Architecture whitelist shared by every family of this OS
    pub arches: Vec<String>,
    /// Explicitly accepted platform labels
    pub specific: Vec<String>,
    /// Whitelist mode
    pub specific_only: bool,
    /// Explicitly rejected platform labels
    pub excludes: Vec<String>,
    /// Families (tag flavors) owned by this OS
    pub families: BTreeMap<String, PlatformFamilySpec>,
}

/// Named allow/deny profile over full tag triples
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityTagsSpec {
    pub specific: Vec<String>,
    pub specific_only: bool,
    pub excludes: Vec<String>,
}

/// Fully resolved compatibility spec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilitySpec {
    /// Provenance of the layered sources, informational only
    pub source_description: String,
    pub python_versions: PythonVersionsSpec,
    pub abi_values: AbiValuesSpec,
    pub platform_values: BTreeMap<String, PlatformOsSpec>,
    pub compatibility_tags: BTreeMap<String, CompatibilityTagsSpec>,
}

impl CompatibilitySpec {
    /// Resolve a combined layer into a concrete spec, applying defaults.
    pub fn from_layer(layer: CompatibilitySpecLayer, source_description: String) -> Self {
        let py = layer.python_versions.unwrap_or_default();
        let abi = layer.abi_values.unwrap_or_default();

        let platform_values = layer
            .platform_values
            .unwrap_or_default()
            .into_iter()
            .map(|(os, os_layer)| (os, os_layer.resolve()))
            .collect();

        let compatibility_tags = layer
            .compatibility_tags
            .unwrap_or_default()
            .into_iter()
            .map(|(profile, p)| {
                (
                    profile,
                    CompatibilityTagsSpec {
                        specific: p.specific.unwrap_or_default(),
                        specific_only: p.specific_only.unwrap_or(false),
                        excludes: p.excludes.unwrap_or_default(),
                    },
                )
            })
            .collect();

        CompatibilitySpec {
            source_description,
            python_versions: PythonVersionsSpec {
                min: py.min,
                max: py.max,
                types: py.types.unwrap_or_default(),
                accept_universal: py.accept_universal.unwrap_or(true),
                specific: py.specific.unwrap_or_default(),
                specific_only: py.specific_only.unwrap_or(false),
                excludes: py.excludes.unwrap_or_default(),
            },
            abi_values: AbiValuesSpec {
                include_debug: abi.include_debug.unwrap_or(false),
                include_stable: abi.include_stable.unwrap_or(false),
                specific: abi.specific.unwrap_or_default(),
                specific_only: abi.specific_only.unwrap_or(false),
                excludes: abi.excludes.unwrap_or_default(),
            },
            platform_values,
            compatibility_tags,
        }
    }
}

// ---------------------------------------------------------------------------
// Layer model (partially populated documents)
// ---------------------------------------------------------------------------

/// One spec document as loaded from TOML, every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilitySpecLayer {
    #[serde(rename = "PythonVersions", skip_serializing_if = "Option::is_none")]
    pub python_versions: Option<PythonVersionsLayer>,

    #[serde(rename = "AbiValues", skip_serializing_if = "Option::is_none")]
    pub abi_values: Option<AbiValuesLayer>,

    #[serde(rename = "PlatformValues", skip_serializing_if = "Option::is_none")]
    pub platform_values: Option<BTreeMap<String, PlatformOsLayer>>,

    #[serde(rename = "CompatibilityTags", skip_serializing_if = "Option::is_none")]
    pub compatibility_tags: Option<BTreeMap<String, TagsProfileLayer>>,
}

/// `[PythonVersions]` layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PythonVersionsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_universal: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub specific: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_only: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub excludes: Option<Vec<String>>,
}

/// `[AbiValues]` layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbiValuesLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_stable: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub specific: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_only: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub excludes: Option<Vec<String>>,
}

/// `[PlatformValues.<os>]` layer; family tables are the remaining keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformOsLayer {
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub arches: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub specific: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_only: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub excludes: Option<Vec<String>>,
    #[serde(flatten)]
    pub families: BTreeMap<String, PlatformFamilyLayer>,
}

impl PlatformOsLayer {
    fn resolve(self) -> PlatformOsSpec {
        PlatformOsSpec {
            arches: self.arches.unwrap_or_default(),
            specific: self.specific.unwrap_or_default(),
            specific_only: self.specific_only.unwrap_or(false),
            excludes: self.excludes.unwrap_or_default(),
            families: self
                .families
                .into_iter()
                .map(|(name, f)| {
                    (
                        name,
                        PlatformFamilySpec {
                            min: f.min,
                            max: f.max,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// `[PlatformValues.<os>.<family>]` layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformFamilyLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// `[CompatibilityTags.<profile>]` layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagsProfileLayer {
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub specific: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_only: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub excludes: Option<Vec<String>>,
}

/// Accept either a single string or a list of strings, normalizing to a list
fn de_opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let value = Option::<StringOrList>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        StringOrList::One(s) => vec![s],
        StringOrList::Many(list) => list,
    }))
}

// ---------------------------------------------------------------------------
// Layer combination
// ---------------------------------------------------------------------------

trait Combinable: Sized {
    fn combine(base: Self, over: Self, strategy: MergeStrategy) -> Self;
}

fn combine_scalar<T>(base: Option<T>, over: Option<T>) -> Option<T> {
    over.or(base)
}

fn combine_list(
    base: Option<Vec<String>>,
    over: Option<Vec<String>>,
    strategy: MergeStrategy,
) -> Option<Vec<String>> {
    match strategy {
        MergeStrategy::Override => over.or(base),
        MergeStrategy::Merge => match (base, over) {
            (Some(mut merged), Some(over)) => {
                // base first, then override items not already present
                for item in over {
                    if !merged.contains(&item) {
                        merged.push(item);
                    }
                }
                Some(merged)
            }
            (base, over) => over.or(base),
        },
    }
}

fn combine_nested<T: Combinable>(
    base: Option<T>,
    over: Option<T>,
    strategy: MergeStrategy,
) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(T::combine(b, o, strategy)),
        (base, over) => over.or(base),
    }
}

fn combine_map<T: Combinable>(
    base: BTreeMap<String, T>,
    over: BTreeMap<String, T>,
    strategy: MergeStrategy,
) -> BTreeMap<String, T> {
    let mut result = base;
    for (key, over_value) in over {
        let combined = match result.remove(&key) {
            Some(base_value) => T::combine(base_value, over_value, strategy),
            None => over_value,
        };
        result.insert(key, combined);
    }
    result
}

fn combine_opt_map<T: Combinable>(
    base: Option<BTreeMap<String, T>>,
    over: Option<BTreeMap<String, T>>,
    strategy: MergeStrategy,
) -> Option<BTreeMap<String, T>> {
    match (base, over) {
        (Some(b), Some(o)) => Some(combine_map(b, o, strategy)),
        (base, over) => over.or(base),
    }
}

impl Combinable for PythonVersionsLayer {
    fn combine(base: Self, over: Self, strategy: MergeStrategy) -> Self {
        Self {
            min: combine_scalar(base.min, over.min),
            max: combine_scalar(base.max, over.max),
            types: combine_list(base.types, over.types, strategy),
            accept_universal: combine_scalar(base.accept_universal, over.accept_universal),
            specific: combine_list(base.specific, over.specific, strategy),
            specific_only: combine_scalar(base.specific_only, over.specific_only),
            excludes: combine_list(base.excludes, over.excludes, strategy),
        }
    }
}

impl Combinable for AbiValuesLayer {
    fn combine(base: Self, over: Self, strategy: MergeStrategy) -> Self {
        Self {
            include_debug: combine_scalar(base.include_debug, over.include_debug),
            include_stable: combine_scalar(base.include_stable, over.include_stable),
            specific: combine_list(base.specific, over.specific, strategy),
            specific_only: combine_scalar(base.specific_only, over.specific_only),
            excludes: combine_list(base.excludes, over.excludes, strategy),
        }
    }
}

impl Combinable for PlatformFamilyLayer {
    fn combine(base: Self, over: Self, _strategy: MergeStrategy) -> Self {
        Self {
            min: combine_scalar(base.min, over.min),
            max: combine_scalar(base.max, over.max),
        }
    }
}

impl Combinable for PlatformOsLayer {
    fn combine(base: Self, over: Self, strategy: MergeStrategy) -> Self {
        Self {
            arches: combine_list(base.arches, over.arches, strategy),
            specific: combine_list(base.specific, over.specific, strategy),
            specific_only: combine_scalar(base.specific_only, over.specific_only),
            excludes: combine_list(base.excludes, over.excludes, strategy),
            families: combine_map(base.families, over.families, strategy),
        }
    }
}

impl Combinable for TagsProfileLayer {
    fn combine(base: Self, over: Self, strategy: MergeStrategy) -> Self {
        Self {
            specific: combine_list(base.specific, over.specific, strategy),
            specific_only: combine_scalar(base.specific_only, over.specific_only),
            excludes: combine_list(base.excludes, over.excludes, strategy),
        }
    }
}

impl CompatibilitySpecLayer {
    /// Combine this layer (the base) with an overriding layer.
    pub fn combined_with(self, over: CompatibilitySpecLayer, strategy: MergeStrategy) -> Self {
        Self {
            python_versions: combine_nested(self.python_versions, over.python_versions, strategy),
            abi_values: combine_nested(self.abi_values, over.abi_values, strategy),
            platform_values: combine_opt_map(self.platform_values, over.platform_values, strategy),
            compatibility_tags: combine_opt_map(
                self.compatibility_tags,
                over.compatibility_tags,
                strategy,
            ),
        }
    }
}
