//! Wheel artifacts and collections
//!
//! A [`WheelArtifact`] is one wheel file on disk: its parsed filename parts,
//! expanded tag set, content hash, and the `Requires-Dist` entries read from
//! the `*.dist-info/METADATA` member of the wheel zip. A [`WheelCollection`]
//! groups the artifacts staged for one bundle and feeds the tag-combination
//! engine.

use crate::compat::combos::{enumerate_valid_combos, WheelFiles};
use crate::error::WheelError;
use crate::tags::{canonicalize_name, parse_wheel_filename, Tag};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Metadata header fields copied onto the artifact
const METADATA_FIELDS: [&str; 4] = ["Author", "Summary", "Home-page", "License"];

/// Where a wheel came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelSource {
    /// Supplied from the local filesystem
    Path,
    /// Downloaded from a package index
    Index,
}

/// Why a wheel is part of the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelRole {
    /// The main subject of the build
    Primary,
    /// Required by a primary wheel
    Dependency,
}

/// One wheel file staged for bundling
#[derive(Debug, Clone)]
pub struct WheelArtifact {
    /// Location on disk
    pub path: PathBuf,
    /// Canonicalized distribution name
    pub name: String,
    /// Version segment from the filename
    pub version: String,
    /// Expanded tag set
    pub tags: BTreeSet<Tag>,
    /// Requires-Dist lines from METADATA
    pub requires: Vec<String>,
    /// Provenance
    pub source: WheelSource,
    /// Role in the bundle
    pub role: WheelRole,
    /// Content hash
    pub sha256: String,
    /// Selected METADATA header fields (lowercased keys)
    pub metadata: BTreeMap<String, String>,
}

impl WheelArtifact {
    /// Load an artifact from a wheel file: parse the filename, hash the
    /// content, and extract requirements and metadata from the archive.
    pub fn from_path(path: &Path, role: WheelRole, source: WheelSource) -> Result<Self, WheelError> {
        if !path.is_file() {
            return Err(WheelError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WheelError::invalid_filename(path.display().to_string()))?;
        let parsed = parse_wheel_filename(filename)?;

        let sha256 = hash_file(path)?;
        let (requires, metadata) = read_wheel_metadata(path, filename)?;

        Ok(Self {
            path: path.to_path_buf(),
            name: canonicalize_name(&parsed.name),
            version: parsed.version,
            tags: parsed.tags,
            requires,
            source,
            role,
            sha256,
            metadata,
        })
    }

    /// The wheel's filename.
    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Returns true if the wheel carries the universal `py3-none-any` tag.
    pub fn is_universal(&self) -> bool {
        self.tags.iter().any(Tag::is_universal)
    }
}

/// The set of wheels staged for one bundle, unique by filename
#[derive(Debug, Clone, Default)]
pub struct WheelCollection {
    wheels: Vec<WheelArtifact>,
}

impl WheelCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact unless a wheel with the same filename is present.
    pub fn add(&mut self, artifact: WheelArtifact) {
        if !self.wheels.iter().any(|w| w.filename() == artifact.filename()) {
            self.wheels.push(artifact);
        }
    }

    /// Number of staged wheels
    pub fn len(&self) -> usize {
        self.wheels.len()
    }

    /// Returns true when nothing is staged
    pub fn is_empty(&self) -> bool {
        self.wheels.is_empty()
    }

    /// Iterate over the staged wheels in staging order
    pub fn iter(&self) -> impl Iterator<Item = &WheelArtifact> {
        self.wheels.iter()
    }

    /// Wheels staged as the build subject
    pub fn primary(&self) -> Vec<&WheelArtifact> {
        self.wheels
            .iter()
            .filter(|w| w.role == WheelRole::Primary)
            .collect()
    }

    /// Wheels staged as dependencies
    pub fn dependencies(&self) -> Vec<&WheelArtifact> {
        self.wheels
            .iter()
            .filter(|w| w.role == WheelRole::Dependency)
            .collect()
    }

    /// Find a wheel by canonical name.
    pub fn find(&self, name: &str) -> Option<&WheelArtifact> {
        let canonical = canonicalize_name(name);
        self.wheels.iter().find(|w| w.name == canonical)
    }

    /// Returns true when every staged wheel is universal.
    pub fn is_fully_universal(&self) -> bool {
        self.wheels.iter().all(WheelArtifact::is_universal)
    }

    /// Wheel filenames grouped by canonical name, in staging order, as the
    /// tag-combination engine consumes them.
    pub fn wheel_files(&self) -> WheelFiles {
        let mut files: WheelFiles = BTreeMap::new();
        for wheel in &self.wheels {
            files
                .entry(wheel.name.clone())
                .or_default()
                .push(wheel.filename().to_string());
        }
        files
    }

    /// Sorted combo strings every staged wheel supports.
    pub fn supported_target_strings(&self) -> Result<Vec<String>, WheelError> {
        Ok(enumerate_valid_combos(&self.wheel_files())?
            .iter()
            .map(Tag::to_string)
            .collect())
    }
}

fn hash_file(path: &Path) -> Result<String, WheelError> {
    let mut file = File::open(path).map_err(|source| WheelError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer).map_err(|source| WheelError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Extract `Requires-Dist` lines and selected header fields from METADATA.
///
/// A wheel without a METADATA member yields empty results; a wheel that is
/// not a readable zip is an error.
fn read_wheel_metadata(
    path: &Path,
    filename: &str,
) -> Result<(Vec<String>, BTreeMap<String, String>), WheelError> {
    let file = File::open(path).map_err(|source| WheelError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| WheelError::metadata_error(filename, e.to_string()))?;

    let meta_name = (0..archive.len()).find_map(|i| {
        archive
            .by_index(i)
            .ok()
            .map(|f| f.name().to_string())
            .filter(|n| n.ends_with(".dist-info/METADATA"))
    });
    let Some(meta_name) = meta_name else {
        return Ok((Vec::new(), BTreeMap::new()));
    };

    let mut text = String::new();
    archive
        .by_name(&meta_name)
        .map_err(|e| WheelError::metadata_error(filename, e.to_string()))?
        .read_to_string(&mut text)
        .map_err(|e| WheelError::metadata_error(filename, e.to_string()))?;

    let mut requires = Vec::new();
    let mut metadata = BTreeMap::new();
    for line in text.lines() {
        // headers end at the first blank line; the body is the description
        if line.is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if key == "Requires-Dist" {
            requires.push(value.to_string());
        } else if METADATA_FIELDS.contains(&key) {
            metadata.insert(key.to_lowercase().replace('-', "_"), value.to_string());
        }
    }

    Ok((requires, metadata))
}
