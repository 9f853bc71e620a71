//! Wheel compatibility tags and the wheel filename grammar
//!
//! A tag is an (interpreter, abi, platform) triple naming one installability
//! target of a wheel. Wheel filenames carry compressed tag sets:
//! `{name}-{version}(-{build})?-{interp}-{abi}-{plat}.whl`, where each of the
//! three tag segments may be a `.`-joined list expanding to the cross product
//! (e.g. `py2.py3-none-any` yields two tags).

use crate::error::WheelError;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static WHEEL_STEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._]+-[A-Za-z0-9._!+]+(-[0-9][A-Za-z0-9._]*)?-[^-]+-[^-]+-[^-]+$")
        .unwrap()
});

/// One (interpreter, abi, platform) installability target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    /// Interpreter segment (e.g. `cp311`, `py3`)
    pub interpreter: String,
    /// ABI segment (e.g. `cp311`, `abi3`, `none`)
    pub abi: String,
    /// Platform segment (e.g. `manylinux_2_17_x86_64`, `any`)
    pub platform: String,
}

impl Tag {
    /// Creates a new Tag
    pub fn new(
        interpreter: impl Into<String>,
        abi: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            abi: abi.into(),
            platform: platform.into(),
        }
    }

    /// The universal tag `py3-none-any`
    pub fn universal() -> Self {
        Tag::new("py3", "none", "any")
    }

    /// Returns true for the universal tag `py3-none-any`
    pub fn is_universal(&self) -> bool {
        self.interpreter == "py3" && self.abi == "none" && self.platform == "any"
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// Parsed parts of a wheel filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWheel {
    /// Distribution name as written in the filename
    pub name: String,
    /// Version segment
    pub version: String,
    /// Optional build tag
    pub build: Option<String>,
    /// Expanded tag set
    pub tags: BTreeSet<Tag>,
}

/// Expand a compressed `interp-abi-plat` tag string into its tag set.
///
/// Each segment may itself be a `.`-joined list; the result is the cross
/// product of the three segments.
pub fn parse_tag(value: &str) -> Result<BTreeSet<Tag>, WheelError> {
    let parts: Vec<&str> = value.split('-').collect();
    if parts.len() != 3 {
        return Err(WheelError::invalid_tag(value));
    }
    expand_tag_segments(parts[0], parts[1], parts[2]).ok_or_else(|| WheelError::invalid_tag(value))
}

/// Parse a wheel filename into name, version, build tag, and tag set.
pub fn parse_wheel_filename(filename: &str) -> Result<ParsedWheel, WheelError> {
    let stem = filename
        .strip_suffix(".whl")
        .ok_or_else(|| WheelError::invalid_filename(filename))?;
    if !WHEEL_STEM_RE.is_match(stem) {
        return Err(WheelError::invalid_filename(filename));
    }

    let parts: Vec<&str> = stem.split('-').collect();
    let (name, version, build, interp, abi, plat) = match parts.len() {
        5 => (parts[0], parts[1], None, parts[2], parts[3], parts[4]),
        6 => (
            parts[0],
            parts[1],
            Some(parts[2]),
            parts[3],
            parts[4],
            parts[5],
        ),
        _ => return Err(WheelError::invalid_filename(filename)),
    };

    let tags = expand_tag_segments(interp, abi, plat)
        .ok_or_else(|| WheelError::invalid_filename(filename))?;

    Ok(ParsedWheel {
        name: name.to_string(),
        version: version.to_string(),
        build: build.map(str::to_string),
        tags,
    })
}

/// Extract just the tag set from a wheel filename.
pub fn parse_wheel_tags(filename: &str) -> Result<BTreeSet<Tag>, WheelError> {
    Ok(parse_wheel_filename(filename)?.tags)
}

/// Returns true if the wheel filename carries the universal `py3-none-any` tag.
pub fn has_universal_tag(filename: &str) -> Result<bool, WheelError> {
    Ok(parse_wheel_tags(filename)?.iter().any(Tag::is_universal))
}

/// Normalize a distribution name for comparison (PEP 503 style).
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = false;
    for ch in name.chars() {
        let mapped = match ch {
            '-' | '_' | '.' => '-',
            c => c.to_ascii_lowercase(),
        };
        if mapped == '-' {
            if !last_dash && !out.is_empty() {
                out.push('-');
            }
            last_dash = true;
        } else {
            out.push(mapped);
            last_dash = false;
        }
    }
    out.trim_end_matches('-').to_string()
}

fn expand_tag_segments(interp: &str, abi: &str, plat: &str) -> Option<BTreeSet<Tag>> {
    let mut tags = BTreeSet::new();
    for i in split_segment(interp)? {
        for a in split_segment(abi)? {
            for p in split_segment(plat)? {
                tags.insert(Tag::new(i, a, p));
            }
        }
    }
    Some(tags)
}

fn split_segment(segment: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = segment.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}
