//! Python version labels and version-bound arithmetic
//!
//! Handles the label formats that appear in wheel tags and spec documents:
//! - Dotted: `3.11`
//! - Interpreter/ABI labels with trailing digits: `cp311`, `py39`, `py3`
//! - Platform tags: `manylinux_2_17_x86_64`, `macosx_11_0_arm64`, `win_amd64`
//! - glibc-like platform versions: `2_17`, `11.0`, `1`

use crate::error::SpecError;
use crate::compat::spec::PythonVersionsSpec;
use regex::Regex;
use std::sync::LazyLock;

static DOTTED_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)$").unwrap());
static TRAILING_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)$").unwrap());
static PLATFORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<flavor>[a-zA-Z0-9]+)(?:_(?P<major>\d+)_(?P<minor>\d+))?(?:_(?P<arch>[A-Za-z0-9_]+))?$")
        .unwrap()
});

/// Comparator applied to the upper bound of a version range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOp {
    /// Strict upper bound (`<`)
    Less,
    /// Inclusive upper bound (`<=`)
    LessOrEqual,
}

/// Effective Python version range derived from a PythonVersionsSpec
///
/// An inverted range (min above max) is not rejected here; it simply
/// matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonVersionBounds {
    /// Inclusive lower bound
    pub min: (u32, u32),
    /// Upper bound, compared with `max_op`
    pub max: (u32, u32),
    /// Comparator for the upper bound
    pub max_op: MaxOp,
}

/// Extract a (major, minor) Python version from a label.
///
/// Accepts `MAJOR.MINOR` exactly; otherwise the trailing digit run is
/// interpreted by length: one digit is a bare major (`'3'` -> (3, 0)), two
/// digits are single-digit major and minor (`'39'` -> (3, 9)), three digits
/// are a single-digit major and two-digit minor (`'311'` -> (3, 11)).
/// Anything else, including runs of four or more digits, yields None.
/// No guessing.
pub fn parse_python_version_label(label: &str) -> Option<(u32, u32)> {
    let s = label.trim();

    if let Some(caps) = DOTTED_VERSION_RE.captures(s) {
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        return Some((major, minor));
    }

    let digits = TRAILING_DIGITS_RE.captures(s)?.get(1)?.as_str();
    match digits.len() {
        1 => Some((digits.parse().ok()?, 0)),
        // '39' -> (3, 9); '311' -> (3, 11): first digit is the major
        2 | 3 => Some((digits[..1].parse().ok()?, digits[1..].parse().ok()?)),
        _ => None,
    }
}

/// Compute the effective version range for a PythonVersionsSpec.
///
/// The minimum falls back to `(runtime_major, 0)` when the spec omits it;
/// the runtime major is an explicit input so callers (and tests) control it.
/// An omitted maximum means "stay within the minimum's major version":
/// `< (min.major + 1, 0)`. A maximum of `"*"` is rejected. A present maximum
/// may carry a `<=` or `<` prefix; a bare label is treated as `<=`.
pub fn compute_python_version_bounds(
    spec: &PythonVersionsSpec,
    runtime_major: u32,
) -> Result<PythonVersionBounds, SpecError> {
    let min = match &spec.min {
        Some(raw) => parse_python_version_label(raw).ok_or_else(|| SpecError::InvalidMin {
            value: raw.clone(),
        })?,
        None => (runtime_major, 0),
    };

    let raw_max = spec.max.as_deref().map(str::trim).unwrap_or("");
    if raw_max.is_empty() {
        return Ok(PythonVersionBounds {
            min,
            max: (min.0 + 1, 0),
            max_op: MaxOp::Less,
        });
    }

    if raw_max == "*" {
        return Err(SpecError::UnboundedMax);
    }

    let (max_op, rhs) = if let Some(rest) = raw_max.strip_prefix("<=") {
        (MaxOp::LessOrEqual, rest.trim())
    } else if let Some(rest) = raw_max.strip_prefix('<') {
        (MaxOp::Less, rest.trim())
    } else {
        // bare number treated as '<='
        (MaxOp::LessOrEqual, raw_max)
    };

    let max = parse_python_version_label(rhs).ok_or_else(|| SpecError::InvalidMax {
        value: raw_max.to_string(),
    })?;

    Ok(PythonVersionBounds { min, max, max_op })
}

/// Test whether a concrete (major, minor) version lies within the bounds.
pub fn version_in_bounds(version: (u32, u32), bounds: &PythonVersionBounds) -> bool {
    if version < bounds.min {
        return false;
    }
    match bounds.max_op {
        MaxOp::Less => version < bounds.max,
        MaxOp::LessOrEqual => version <= bounds.max,
    }
}

/// Test whether some minor version under the given major satisfies the bounds.
pub fn major_in_bounds(major: u32, bounds: &PythonVersionBounds) -> bool {
    let (min_major, _) = bounds.min;
    if major < min_major {
        return false;
    }

    let (max_major, max_minor) = bounds.max;
    match bounds.max_op {
        MaxOp::Less => {
            if major < max_major {
                return true;
            }
            if major == max_major {
                // Some minor below max_minor must exist
                return max_minor > 0;
            }
            false
        }
        MaxOp::LessOrEqual => major <= max_major,
    }
}

/// Split a platform tag into (flavor, version, arch).
///
/// `manylinux_2_17_x86_64` -> ("manylinux", Some("2_17"), Some("x86_64")),
/// `win_amd64` -> ("win", None, Some("amd64")), `any` -> ("any", None, None).
/// Input that does not match the pattern comes back whole as the flavor.
pub fn split_platform_tag(platform: &str) -> (String, Option<String>, Option<String>) {
    let Some(caps) = PLATFORM_RE.captures(platform) else {
        return (platform.to_string(), None, None);
    };

    let flavor = caps.name("flavor").map_or("", |m| m.as_str()).to_string();
    let version = match (caps.name("major"), caps.name("minor")) {
        (Some(major), Some(minor)) => Some(format!("{}_{}", major.as_str(), minor.as_str())),
        _ => None,
    };
    let arch = caps.name("arch").map(|m| m.as_str().to_string());
    (flavor, version, arch)
}

/// Parse a glibc-like version string into (major, minor).
///
/// Dots normalize to underscores; a bare major is treated as minor 0.
pub fn parse_glibc_like_version(v: &str) -> Option<(u32, u32)> {
    let normalized = v.trim().replace('.', "_");
    let (major_s, minor_s) = match normalized.split_once('_') {
        Some((major, minor)) => (major.to_string(), minor.to_string()),
        None => (normalized, "0".to_string()),
    };
    Some((major_s.parse().ok()?, minor_s.parse().ok()?))
}
