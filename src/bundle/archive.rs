//! .chub archive assembly
//!
//! Archive layout:
//! - `chubconfig.toml`: the manifest
//! - `wheels/<file>.whl`: primary and dependency wheels
//! - `scripts/pre/<NN>-<name>`, `scripts/post/<NN>-<name>`: install scripts,
//!   ordinal-prefixed to preserve run order
//! - `includes/<dest>`: extra files

use crate::bundle::manifest::ChubManifest;
use crate::error::BundleError;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// Manifest member name inside the archive
pub const MANIFEST_NAME: &str = "chubconfig.toml";

/// An include entry: source file and destination inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    pub src: PathBuf,
    pub dest: String,
}

impl IncludeSpec {
    /// Parse an include argument of the form `SRC` or `SRC::DEST`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once("::") {
            Some((src, dest)) => Self {
                src: PathBuf::from(src),
                dest: dest.to_string(),
            },
            None => {
                let src = PathBuf::from(raw);
                let dest = src
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| raw.to_string());
                Self { src, dest }
            }
        }
    }
}

/// Everything needed to write one archive
#[derive(Debug)]
pub struct BundlePlan {
    pub manifest: ChubManifest,
    pub wheels: Vec<PathBuf>,
    pub pre_scripts: Vec<PathBuf>,
    pub post_scripts: Vec<PathBuf>,
    pub includes: Vec<IncludeSpec>,
}

/// Archive name for the script at `index` in its run order.
pub fn staged_script_name(index: usize, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{:02}-{}", index, name)
}

/// Write the archive; returns the output path.
pub fn write_chub(plan: &BundlePlan, out_path: &Path) -> Result<PathBuf, BundleError> {
    plan.manifest.validate()?;

    let file = File::create(out_path).map_err(|source| BundleError::Io {
        path: out_path.to_path_buf(),
        source,
    })?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let archive_err = |e: zip::result::ZipError| BundleError::Archive {
        path: out_path.to_path_buf(),
        message: e.to_string(),
    };

    // Manifest first
    writer.start_file(MANIFEST_NAME, options).map_err(archive_err)?;
    let manifest_text = plan.manifest.to_toml_string()?;
    io::Write::write_all(&mut writer, manifest_text.as_bytes()).map_err(|source| {
        BundleError::Io {
            path: out_path.to_path_buf(),
            source,
        }
    })?;

    // Wheels
    for wheel in &plan.wheels {
        let filename = wheel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        copy_into(&mut writer, wheel, &format!("wheels/{}", filename), options, out_path)?;
    }

    // Scripts, ordinal-prefixed to keep run order stable
    for (index, script) in plan.pre_scripts.iter().enumerate() {
        let dest = format!("scripts/pre/{}", staged_script_name(index, script));
        copy_into(&mut writer, script, &dest, options, out_path)?;
    }
    for (index, script) in plan.post_scripts.iter().enumerate() {
        let dest = format!("scripts/post/{}", staged_script_name(index, script));
        copy_into(&mut writer, script, &dest, options, out_path)?;
    }

    // Includes
    for include in &plan.includes {
        let dest = format!("includes/{}", include.dest);
        copy_into(&mut writer, &include.src, &dest, options, out_path)?;
    }

    writer.finish().map_err(archive_err)?;
    Ok(out_path.to_path_buf())
}

/// Read the manifest back out of an archive.
pub fn read_manifest(chub_path: &Path) -> Result<ChubManifest, BundleError> {
    let file = File::open(chub_path).map_err(|source| BundleError::Io {
        path: chub_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| BundleError::Archive {
        path: chub_path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut entry = archive.by_name(MANIFEST_NAME).map_err(|e| BundleError::Archive {
        path: chub_path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|source| BundleError::Io {
            path: chub_path.to_path_buf(),
            source,
        })?;
    ChubManifest::from_toml_str(&text)
}

fn copy_into(
    writer: &mut zip::ZipWriter<File>,
    src: &Path,
    dest: &str,
    options: SimpleFileOptions,
    out_path: &Path,
) -> Result<(), BundleError> {
    if !src.is_file() {
        return Err(BundleError::InputNotFound {
            path: src.to_path_buf(),
        });
    }
    writer
        .start_file(dest, options)
        .map_err(|e| BundleError::Archive {
            path: out_path.to_path_buf(),
            message: e.to_string(),
        })?;
    let mut file = File::open(src).map_err(|source| BundleError::Io {
        path: src.to_path_buf(),
        source,
    })?;
    io::copy(&mut file, writer).map_err(|source| BundleError::Io {
        path: src.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_archive(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn plan(dir: &Path) -> BundlePlan {
        let wheel = dir.join("demo-1.0-py3-none-any.whl");
        std::fs::write(&wheel, b"wheel bytes").unwrap();
        let pre = dir.join("setup.sh");
        std::fs::write(&pre, b"#!/bin/sh\n").unwrap();
        let extra = dir.join("notes.txt");
        std::fs::write(&extra, b"hello").unwrap();

        let mut manifest = ChubManifest::new("demo", "1.0");
        manifest
            .wheels
            .insert("demo-1.0-py3-none-any.whl".to_string(), Vec::new());
        manifest.scripts.pre = vec![staged_script_name(0, &pre)];
        manifest.includes = vec!["docs/notes.txt".to_string()];

        BundlePlan {
            manifest,
            wheels: vec![wheel],
            pre_scripts: vec![pre],
            post_scripts: Vec::new(),
            includes: vec![IncludeSpec {
                src: extra,
                dest: "docs/notes.txt".to_string(),
            }],
        }
    }

    #[test]
    fn test_include_spec_parse() {
        let spec = IncludeSpec::parse("config/app.yaml::etc/app.yaml");
        assert_eq!(spec.src, PathBuf::from("config/app.yaml"));
        assert_eq!(spec.dest, "etc/app.yaml");

        let spec = IncludeSpec::parse("README.md");
        assert_eq!(spec.src, PathBuf::from("README.md"));
        assert_eq!(spec.dest, "README.md");

        let spec = IncludeSpec::parse("docs/guide.md");
        assert_eq!(spec.dest, "guide.md");
    }

    #[test]
    fn test_staged_script_name() {
        assert_eq!(
            staged_script_name(0, Path::new("scripts/setup.sh")),
            "00-setup.sh"
        );
        assert_eq!(staged_script_name(11, Path::new("b.sh")), "11-b.sh");
    }

    #[test]
    fn test_write_chub_layout() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        let out = dir.path().join("demo-1.0.chub");

        let written = write_chub(&plan, &out).unwrap();
        assert_eq!(written, out);

        let names = list_archive(&out);
        assert_eq!(
            names,
            vec![
                "chubconfig.toml",
                "wheels/demo-1.0-py3-none-any.whl",
                "scripts/pre/00-setup.sh",
                "includes/docs/notes.txt",
            ]
        );
    }

    #[test]
    fn test_write_chub_round_trips_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        let out = dir.path().join("demo-1.0.chub");
        write_chub(&plan, &out).unwrap();

        let manifest = read_manifest(&out).unwrap();
        assert_eq!(manifest, plan.manifest);
    }

    #[test]
    fn test_write_chub_validates_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = plan(dir.path());
        plan.manifest.name = String::new();
        let out = dir.path().join("demo-1.0.chub");
        assert!(matches!(
            write_chub(&plan, &out),
            Err(BundleError::MissingField { .. })
        ));
    }

    #[test]
    fn test_write_chub_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = plan(dir.path());
        plan.wheels.push(dir.path().join("absent-1.0-py3-none-any.whl"));
        let out = dir.path().join("demo-1.0.chub");
        assert!(matches!(
            write_chub(&plan, &out),
            Err(BundleError::InputNotFound { .. })
        ));
    }
}
