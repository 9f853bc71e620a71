//! End-to-end CLI tests for chub
//!
//! These tests drive the compiled binary with assert_cmd:
//! - Help/version surface
//! - Compatibility analysis of local wheels
//! - Archive builds and dry runs
//! - Error reporting

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Write a minimal wheel zip carrying a METADATA member
fn build_wheel(dir: &Path, filename: &str, requires: &[&str]) -> PathBuf {
    let stem = filename.strip_suffix(".whl").unwrap();
    let mut parts = stem.splitn(3, '-');
    let name = parts.next().unwrap();
    let version = parts.next().unwrap();

    let path = dir.join(filename);
    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(
            format!("{}-{}.dist-info/METADATA", name, version),
            SimpleFileOptions::default(),
        )
        .unwrap();
    let mut metadata = format!("Name: {}\nVersion: {}\n", name, version);
    for req in requires {
        metadata.push_str(&format!("Requires-Dist: {}\n", req));
    }
    writer.write_all(metadata.as_bytes()).unwrap();
    writer.finish().unwrap();
    path
}

fn chub() -> Command {
    Command::cargo_bin("chub").unwrap()
}

#[test]
fn test_help_lists_options() {
    chub()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--wheel"))
        .stdout(predicate::str::contains("--analyze-compatibility"))
        .stdout(predicate::str::contains("--compat-spec"))
        .stdout(predicate::str::contains("--chubproject"));
}

#[test]
fn test_version_flag() {
    chub()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chub"));
}

#[test]
fn test_no_wheels_is_an_error() {
    chub()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no wheels specified"));
}

#[test]
fn test_analyze_universal_wheel() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);

    chub()
        .arg("--analyze-compatibility")
        .arg("-w")
        .arg(&wheel)
        .assert()
        .success()
        .stdout(predicate::str::contains("Supported targets:"))
        .stdout(predicate::str::contains("universal"))
        .stdout(predicate::str::contains("py3-none-any"));
}

#[test]
fn test_analyze_platform_specific_wheels() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_wheel(dir.path(), "app-1.0.0-py3-none-any.whl", &[]);
    let native = build_wheel(
        dir.path(),
        "native-2.0.0-cp311-cp311-manylinux_2_17_x86_64.whl",
        &[],
    );

    chub()
        .arg("--analyze-compatibility")
        .arg("-w")
        .arg(&app)
        .arg("-w")
        .arg(&native)
        .assert()
        .success()
        .stdout(predicate::str::contains("cp311-cp311-manylinux_2_17_x86_64"))
        .stdout(predicate::str::contains("accepted"));
}

#[test]
fn test_analyze_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);

    let output = chub()
        .arg("--analyze-compatibility")
        .arg("--json")
        .arg("-w")
        .arg(&wheel)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["targets"][0], "py3-none-any");
    assert_eq!(
        parsed["combos"]["py3-none-any"]["demo"],
        "demo-1.0.0-py3-none-any.whl"
    );
    assert!(parsed["spec_source"]
        .as_str()
        .unwrap()
        .starts_with("embedded:"));
}

#[test]
fn test_build_archive() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);
    let out = dir.path().join("demo-1.0.0.chub");

    chub()
        .arg("-w")
        .arg(&wheel)
        .arg("-c")
        .arg(&out)
        .arg("-e")
        .arg("demo.app:main")
        .assert()
        .success()
        .stdout(predicate::str::contains("Packaged"))
        .stdout(predicate::str::contains("demo"));

    assert!(out.is_file());

    // The archive is a zip with the manifest and the wheel inside
    let file = File::open(&out).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.contains(&"chubconfig.toml".to_string()));
    assert!(names.contains(&"wheels/demo-1.0.0-py3-none-any.whl".to_string()));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);
    let out = dir.path().join("demo-1.0.0.chub");

    chub()
        .arg("-n")
        .arg("-w")
        .arg(&wheel)
        .arg("-c")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("no archive written"));

    assert!(!out.exists());
}

#[test]
fn test_no_common_target_fails() {
    let dir = tempfile::tempdir().unwrap();
    let a = build_wheel(dir.path(), "a-1.0-cp310-cp310-linux_x86_64.whl", &[]);
    let b = build_wheel(dir.path(), "b-1.0-cp311-cp311-win_amd64.whl", &[]);

    chub()
        .arg("-w")
        .arg(&a)
        .arg("-w")
        .arg(&b)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no common compatibility target"));
}

#[test]
fn test_quiet_build_prints_only_path() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);
    let out = dir.path().join("demo-1.0.0.chub");

    let output = chub()
        .arg("-q")
        .arg("-w")
        .arg(&wheel)
        .arg("-c")
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.trim(), out.display().to_string());
}

#[test]
fn test_chubproject_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);
    let project_path = dir.path().join("chubproject.toml");
    let out = dir.path().join("demo-1.0.0.chub");

    // Save the effective options, then rebuild from the saved file alone
    chub()
        .arg("--analyze-compatibility")
        .arg("-w")
        .arg(&wheel)
        .arg("--chubproject-save")
        .arg(&project_path)
        .assert()
        .success();
    assert!(project_path.is_file());

    chub()
        .arg("--chubproject")
        .arg(&project_path)
        .arg("-c")
        .arg(&out)
        .assert()
        .success();
    assert!(out.is_file());
}

#[test]
fn test_bad_compat_spec_file() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = build_wheel(dir.path(), "demo-1.0.0-py3-none-any.whl", &[]);

    chub()
        .arg("--analyze-compatibility")
        .arg("-w")
        .arg(&wheel)
        .arg("--compat-spec")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("compatibility spec file not found"));
}

#[test]
fn test_invalid_merge_strategy_rejected() {
    chub()
        .arg("--compat-merge")
        .arg("replace")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid merge strategy"));
}
