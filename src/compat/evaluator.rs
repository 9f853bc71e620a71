//! Policy-driven compatibility evaluator
//!
//! Decides whether an interpreter label, an ABI label, a platform label, or a
//! full tag is acceptable under a [`CompatibilitySpec`]. Evaluation order on
//! every axis is fixed: excludes win first, then specific-only whitelisting,
//! then additive specifics, then the axis rules (version bounds, debug/stable
//! ABI gates, platform family ranges). Unrecognized labels are rejected, never
//! guessed at. Platforms are fail-closed: a spec with no platform tables
//! rejects every platform string.

use crate::compat::pyversion::{
    compute_python_version_bounds, major_in_bounds, parse_glibc_like_version,
    parse_python_version_label, split_platform_tag, version_in_bounds, PythonVersionBounds,
};
use crate::compat::spec::CompatibilitySpec;
use crate::error::{SpecError, WheelError};
use crate::tags::{parse_tag, Tag};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Python line assumed when a spec does not pin a minimum version
pub const DEFAULT_RUNTIME_MAJOR: u32 = 3;

static PY_UNIVERSAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^py(\d+)$").unwrap());

/// Returns true for debug-build ABIs (trailing `d`).
pub fn is_debug_abi(abi: &str) -> bool {
    abi.ends_with('d')
}

/// Returns true for stable ABIs: `none`, or `abi` followed by digits.
pub fn is_stable_abi(abi: &str) -> bool {
    if abi == "none" {
        return true;
    }
    match abi.strip_prefix("abi") {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Compatibility evaluator with precomputed bounds and tag profiles
///
/// Construction validates the Python version bounds and flattens every
/// `CompatibilityTags` profile; the evaluator is immutable afterwards.
#[derive(Debug)]
pub struct CompatibilityEvaluator {
    spec: CompatibilitySpec,
    py_bounds: PythonVersionBounds,
    tags: BTreeSet<Tag>,
    exclude_tags: BTreeSet<Tag>,
    tags_specific_only: bool,
    tags_whitelist: BTreeSet<Tag>,
}

impl CompatibilityEvaluator {
    /// Build an evaluator assuming the default Python line.
    pub fn new(spec: CompatibilitySpec) -> Result<Self, SpecError> {
        Self::with_runtime_major(spec, DEFAULT_RUNTIME_MAJOR)
    }

    /// Build an evaluator with an explicit runtime major version, used as the
    /// lower bound when the spec omits `PythonVersions.min`.
    pub fn with_runtime_major(
        spec: CompatibilitySpec,
        runtime_major: u32,
    ) -> Result<Self, SpecError> {
        let py_bounds = compute_python_version_bounds(&spec.python_versions, runtime_major)?;

        let mut tags = BTreeSet::new();
        let mut exclude_tags = BTreeSet::new();
        let mut tags_specific_only = false;
        let mut tags_whitelist = BTreeSet::new();

        for (profile_name, profile) in &spec.compatibility_tags {
            let mut parsed_specific = BTreeSet::new();
            for value in &profile.specific {
                parsed_specific.extend(parse_profile_tag(profile_name, value)?);
            }
            tags.extend(parsed_specific.iter().cloned());

            if profile.specific_only {
                // Any specific-only profile switches tag matching to
                // whitelist mode over the union of such profiles
                tags_specific_only = true;
                tags_whitelist.extend(parsed_specific.iter().cloned());
            }

            for value in &profile.excludes {
                exclude_tags.extend(parse_profile_tag(profile_name, value)?);
            }
        }

        Ok(Self {
            spec,
            py_bounds,
            tags,
            exclude_tags,
            tags_specific_only,
            tags_whitelist,
        })
    }

    /// The spec this evaluator was built from.
    pub fn spec(&self) -> &CompatibilitySpec {
        &self.spec
    }

    /// The effective Python version bounds.
    pub fn python_bounds(&self) -> &PythonVersionBounds {
        &self.py_bounds
    }

    /// Check the interpreter part of a tag (e.g. `cp311`, `py3`).
    pub fn accept_interpreter(&self, interpreter: &str) -> bool {
        let spec = &self.spec.python_versions;

        // 1) explicit excludes
        if spec.excludes.iter().any(|e| e == interpreter) {
            return false;
        }

        // 2) specific_only: pure whitelist
        if spec.specific_only {
            return spec.specific.iter().any(|s| s == interpreter);
        }

        // 3) additive specifics
        if spec.specific.iter().any(|s| s == interpreter) {
            return true;
        }

        // 4) 'py<digits>' universal form; the digit run is taken as a bare
        //    major, so 'py312' is major 312, not 3.12
        if spec.accept_universal {
            if let Some(caps) = PY_UNIVERSAL_RE.captures(interpreter) {
                return match caps[1].parse::<u32>() {
                    Ok(major) => major_in_bounds(major, &self.py_bounds),
                    Err(_) => false,
                };
            }
        }

        // 5) everything else must map to a concrete version in range
        match parse_python_version_label(interpreter) {
            Some(version) => version_in_bounds(version, &self.py_bounds),
            None => false,
        }
    }

    /// Check the ABI part of a tag (e.g. `cp311`, `abi3`, `none`).
    pub fn accept_abi(&self, abi: &str) -> bool {
        let spec = &self.spec.abi_values;

        // 1) excludes
        if spec.excludes.iter().any(|e| e == abi) {
            return false;
        }

        // 2) specific_only: pure whitelist
        if spec.specific_only {
            return spec.specific.iter().any(|s| s == abi);
        }

        // 3) additive specifics
        if spec.specific.iter().any(|s| s == abi) {
            return true;
        }

        // 4) debug ABIs
        if is_debug_abi(abi) && !spec.include_debug {
            return false;
        }

        // 5) stable ABIs
        if is_stable_abi(abi) {
            if !spec.include_stable {
                return false;
            }
            if abi == "none" {
                return true;
            }
            // abi<N>: stable ABI for major N
            return match abi[3..].parse::<u32>() {
                Ok(major) => major_in_bounds(major, &self.py_bounds),
                Err(_) => false,
            };
        }

        // 6) cpXYZ-style ABIs: must map to a concrete version in range
        match parse_python_version_label(abi) {
            Some(version) => version_in_bounds(version, &self.py_bounds),
            None => false,
        }
    }

    /// Check the platform part of a tag (e.g. `manylinux_2_17_x86_64`).
    pub fn accept_platform(&self, platform: &str) -> bool {
        let platform_specs = &self.spec.platform_values;

        // No platform constraints at all: reject everything by default
        if platform_specs.is_empty() {
            return false;
        }

        // 1) excludes across every OS spec
        for os_spec in platform_specs.values() {
            if os_spec.excludes.iter().any(|e| e == platform) {
                return false;
            }
        }

        // 2) specific_only: whitelist union over specific-only OS specs
        let specific_only: Vec<_> = platform_specs
            .values()
            .filter(|os_spec| os_spec.specific_only)
            .collect();
        if !specific_only.is_empty() {
            return specific_only
                .iter()
                .any(|os_spec| os_spec.specific.iter().any(|p| p == platform));
        }

        // 3) additive specifics
        for os_spec in platform_specs.values() {
            if os_spec.specific.iter().any(|p| p == platform) {
                return true;
            }
        }

        // 4) family rules: first OS spec owning the flavor decides
        let (flavor, version, arch) = split_platform_tag(platform);

        let owner = platform_specs
            .values()
            .find_map(|os_spec| os_spec.families.get(&flavor).map(|family| (os_spec, family)));
        let Some((os_spec, family)) = owner else {
            return false;
        };

        // OS-level arch filter
        if !os_spec.arches.is_empty() {
            match &arch {
                Some(arch) if os_spec.arches.contains(arch) => {}
                _ => return false,
            }
        }

        // Family version range: a declared bound demands a version segment
        if (family.min.is_some() || family.max.is_some()) && version.is_none() {
            return false;
        }

        if let Some(version) = version {
            let Some(version) = parse_glibc_like_version(&version) else {
                return false;
            };

            if let Some(min) = family.min.as_deref() {
                if min != "*" {
                    match parse_glibc_like_version(min) {
                        Some(min_version) if version >= min_version => {}
                        _ => return false,
                    }
                }
            }

            if let Some(max) = family.max.as_deref() {
                if max != "*" {
                    match parse_glibc_like_version(max) {
                        Some(max_version) if version <= max_version => {}
                        _ => return false,
                    }
                }
            }
        }

        true
    }

    /// Check a full tag: all three axes must accept.
    pub fn accept_tag(&self, tag: &Tag) -> bool {
        self.accept_interpreter(&tag.interpreter)
            && self.accept_abi(&tag.abi)
            && self.accept_platform(&tag.platform)
    }

    /// Evaluate a tag string against profiles first, then the axis rules.
    ///
    /// Precedence: tag-level excludes, then the specific-only whitelist, then
    /// additive tag specifics, then [`Self::accept_tag`].
    pub fn evaluate_compatibility(&self, tag_str: &str) -> Result<bool, WheelError> {
        let mut parsed = parse_tag(tag_str)?.into_iter();
        let Some(tag) = parsed.next() else {
            return Err(WheelError::invalid_tag(tag_str));
        };

        if self.exclude_tags.contains(&tag) {
            return Ok(false);
        }

        if self.tags_specific_only {
            return Ok(self.tags_whitelist.contains(&tag));
        }

        if self.tags.contains(&tag) {
            return Ok(true);
        }

        Ok(self.accept_tag(&tag))
    }
}

fn parse_profile_tag(profile: &str, value: &str) -> Result<BTreeSet<Tag>, SpecError> {
    parse_tag(value).map_err(|err| SpecError::ParseError {
        origin: format!("CompatibilityTags.{}", profile),
        message: err.to_string(),
    })
}
