//! Package index wheel resolution
//!
//! Resolves pip-style requirement specs against a PyPI-compatible JSON API
//! (`{index}/{package}/json`). The newest release satisfying the requirement
//! and offering at least one wheel is selected; within the release a
//! universal wheel is preferred over platform-specific ones. Only simple
//! comparison operators are honored; full specifier semantics are out of
//! scope.

use crate::error::ResolveError;
use crate::resolve::{HttpClient, WheelResolver};
use crate::tags::has_universal_tag;
use crate::wheel::WheelSource;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Default package index base URL
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<name>[A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*(?P<constraints>[^;]*)(?:;.*)?$")
        .unwrap()
});

static CONSTRAINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op>==|~=|!=|>=|<=|>|<)\s*(?P<version>[A-Za-z0-9._*+!]+)$").unwrap()
});

/// Resolver that downloads wheels from a package index
pub struct IndexResolver {
    client: HttpClient,
    index_url: String,
}

/// Package metadata response
#[derive(Debug, Deserialize)]
struct IndexResponse {
    /// Release files keyed by version
    releases: HashMap<String, Vec<ReleaseFile>>,
}

/// One downloadable file of a release
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    filename: String,
    url: Option<String>,
}

/// A parsed requirement: package name plus simple version constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub constraints: Vec<(String, String)>,
}

impl Requirement {
    /// Parse a pip-style requirement spec, ignoring extras and markers.
    pub fn parse(spec: &str) -> Option<Self> {
        let caps = REQUIREMENT_RE.captures(spec)?;
        let name = caps.name("name")?.as_str().to_string();
        let raw_constraints = caps.name("constraints").map_or("", |m| m.as_str()).trim();

        let mut constraints = Vec::new();
        if !raw_constraints.is_empty() {
            for part in raw_constraints.split(',') {
                let caps = CONSTRAINT_RE.captures(part.trim())?;
                constraints.push((caps["op"].to_string(), caps["version"].to_string()));
            }
        }
        Some(Self { name, constraints })
    }

    /// Whether a version satisfies every constraint.
    pub fn matches(&self, version: &str) -> bool {
        self.constraints
            .iter()
            .all(|(op, pin)| constraint_matches(version, op, pin))
    }
}

impl IndexResolver {
    /// Create a new index resolver
    pub fn new(client: HttpClient, index_url: String) -> Self {
        Self { client, index_url }
    }

    /// Build the metadata URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.index_url.trim_end_matches('/'), package)
    }
}

#[async_trait]
impl WheelResolver for IndexResolver {
    fn name(&self) -> &'static str {
        "package-index"
    }

    fn can_handle(&self, spec: &str) -> bool {
        !spec.ends_with(".whl")
            && !spec.contains('/')
            && !spec.contains('\\')
            && Requirement::parse(spec).is_some()
    }

    fn source(&self) -> WheelSource {
        WheelSource::Index
    }

    async fn resolve(&self, spec: &str, dest_dir: &Path) -> Result<PathBuf, ResolveError> {
        let requirement = Requirement::parse(spec).ok_or_else(|| {
            ResolveError::resolution_failed(spec, self.name(), "unparsable requirement")
        })?;

        let url = self.build_url(&requirement.name);
        let response: IndexResponse = self
            .client
            .get_json(&url, &requirement.name, &self.index_url)
            .await?;

        // Newest satisfying release that actually ships wheels
        let mut candidates: Vec<(&String, &Vec<ReleaseFile>)> = response
            .releases
            .iter()
            .filter(|(version, files)| {
                requirement.matches(version) && files.iter().any(|f| f.filename.ends_with(".whl"))
            })
            .collect();
        candidates.sort_by(|a, b| compare_versions(a.0, b.0));

        let Some((version, files)) = candidates.pop() else {
            return Err(ResolveError::NoWheelAvailable {
                package: requirement.name.clone(),
                version: if requirement.constraints.is_empty() {
                    "any version".to_string()
                } else {
                    spec.to_string()
                },
            });
        };

        let wheels: Vec<&ReleaseFile> = files
            .iter()
            .filter(|f| f.filename.ends_with(".whl"))
            .collect();
        let selected = wheels
            .iter()
            .find(|f| has_universal_tag(&f.filename).unwrap_or(false))
            .or_else(|| wheels.first())
            .ok_or_else(|| ResolveError::NoWheelAvailable {
                package: requirement.name.clone(),
                version: version.clone(),
            })?;

        let file_url = selected.url.as_deref().ok_or_else(|| {
            ResolveError::InvalidResponse {
                package: requirement.name.clone(),
                index: self.index_url.clone(),
                message: format!("release file {} has no URL", selected.filename),
            }
        })?;

        let dest = dest_dir.join(&selected.filename);
        self.client
            .download(file_url, &dest, &requirement.name, &self.index_url)
            .await?;
        Ok(dest)
    }
}

/// Compare two version strings by their numeric dotted parts.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse_parts = |s: &str| -> Vec<u64> {
        s.strip_prefix('v')
            .unwrap_or(s)
            .split(['.', '-', '+'])
            .filter_map(|p| p.parse().ok())
            .collect()
    };

    let parts_a = parse_parts(a);
    let parts_b = parse_parts(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        match pa.cmp(pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    parts_a.len().cmp(&parts_b.len())
}

fn constraint_matches(version: &str, op: &str, pin: &str) -> bool {
    match op {
        "==" => {
            if let Some(prefix) = pin.strip_suffix(".*") {
                version == prefix || version.starts_with(&format!("{}.", prefix))
            } else {
                compare_versions(version, pin) == Ordering::Equal
            }
        }
        "!=" => compare_versions(version, pin) != Ordering::Equal,
        ">" => compare_versions(version, pin) == Ordering::Greater,
        ">=" => compare_versions(version, pin) != Ordering::Less,
        "<" => compare_versions(version, pin) == Ordering::Less,
        "<=" => compare_versions(version, pin) != Ordering::Greater,
        // approximate: at least the pin, within the same leading component
        "~=" => {
            compare_versions(version, pin) != Ordering::Less
                && leading_component(version) == leading_component(pin)
        }
        _ => false,
    }
}

fn leading_component(version: &str) -> Option<u64> {
    version
        .strip_prefix('v')
        .unwrap_or(version)
        .split('.')
        .next()
        .and_then(|p| p.parse().ok())
}
