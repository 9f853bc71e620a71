//! Transitive wheel resolution for a project
//!
//! Seeds a stack from the user-supplied specs, resolves each through the
//! ordered resolver list, then walks every staged wheel's Requires-Dist
//! entries depth-first. Each distribution is resolved once (first resolution
//! wins; no version solving); user-supplied roots are marked primary and
//! discovered wheels are marked dependencies. Requirement lines carrying
//! environment markers are skipped.

use crate::error::ResolveError;
use crate::resolve::{resolve_spec, WheelResolver};
use crate::tags::canonicalize_name;
use crate::wheel::{WheelArtifact, WheelRole, WheelSource};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static REQUIREMENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)").unwrap());

/// Extract the canonical distribution name from a Requires-Dist line.
///
/// Lines with environment markers (`; python_version >= ...`, `; extra == ...`)
/// yield None: marker-conditional dependencies are not bundled.
pub fn parse_requirement_name(line: &str) -> Option<String> {
    if line.contains(';') {
        return None;
    }
    let caps = REQUIREMENT_NAME_RE.captures(line)?;
    Some(canonicalize_name(caps.get(1)?.as_str()))
}

/// Resolve the project's wheels and their transitive dependencies into
/// staged artifacts, in resolution order.
pub async fn resolve_project_wheels(
    specs: &[String],
    dest_dir: &Path,
    resolvers: &[Box<dyn WheelResolver>],
) -> Result<Vec<WheelArtifact>, ResolveError> {
    // Stack of (wheel path, primary root, provenance)
    let mut stack: Vec<(PathBuf, bool, WheelSource)> = Vec::new();

    for spec in specs {
        let (path, source) = resolve_spec(spec, dest_dir, resolvers).await?;
        stack.push((path, true, source));
    }

    let mut artifacts: Vec<WheelArtifact> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    while let Some((path, is_primary, source)) = stack.pop() {
        let role = if is_primary {
            WheelRole::Primary
        } else {
            WheelRole::Dependency
        };
        let artifact = WheelArtifact::from_path(&path, role, source)?;

        if let Some(existing) = artifacts.iter_mut().find(|a| a.name == artifact.name) {
            // Anything ever seen as a primary stays a primary
            if is_primary && existing.role != WheelRole::Primary {
                existing.role = WheelRole::Primary;
            }
            continue;
        }

        seen.insert(artifact.name.clone());
        let requires = artifact.requires.clone();
        artifacts.push(artifact);

        for line in requires {
            let Some(dep_name) = parse_requirement_name(&line) else {
                continue;
            };
            if seen.contains(&dep_name) {
                continue;
            }

            let (dep_path, dep_source) = resolve_spec(&line, dest_dir, resolvers).await?;
            stack.push((dep_path, false, dep_source));
        }
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::parse_wheel_filename;
    use async_trait::async_trait;
    use std::fs::File;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Test resolver serving wheels from a fixture directory by name
    struct DirResolver {
        dir: PathBuf,
    }

    #[async_trait]
    impl WheelResolver for DirResolver {
        fn name(&self) -> &'static str {
            "test-dir"
        }

        fn can_handle(&self, _spec: &str) -> bool {
            true
        }

        fn source(&self) -> WheelSource {
            WheelSource::Index
        }

        async fn resolve(&self, spec: &str, _dest_dir: &Path) -> Result<PathBuf, ResolveError> {
            let wanted = parse_requirement_name(spec)
                .or_else(|| Some(canonicalize_name(spec)))
                .unwrap();
            for entry in std::fs::read_dir(&self.dir).unwrap() {
                let path = entry.unwrap().path();
                let filename = path.file_name().unwrap().to_str().unwrap();
                if let Ok(parsed) = parse_wheel_filename(filename) {
                    if canonicalize_name(&parsed.name) == wanted {
                        return Ok(path);
                    }
                }
            }
            Err(ResolveError::resolution_failed(spec, self.name(), "not in fixture dir"))
        }
    }

    fn build_wheel(dir: &Path, filename: &str, requires: &[&str]) -> PathBuf {
        let parsed = parse_wheel_filename(filename).unwrap();
        let path = dir.join(filename);
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(
                format!("{}-{}.dist-info/METADATA", parsed.name, parsed.version),
                SimpleFileOptions::default(),
            )
            .unwrap();
        let mut metadata = format!("Name: {}\nVersion: {}\n", parsed.name, parsed.version);
        for req in requires {
            metadata.push_str(&format!("Requires-Dist: {}\n", req));
        }
        writer.write_all(metadata.as_bytes()).unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_parse_requirement_name() {
        assert_eq!(parse_requirement_name("requests>=2.28"), Some("requests".to_string()));
        assert_eq!(parse_requirement_name("My_Pkg"), Some("my-pkg".to_string()));
        assert_eq!(
            parse_requirement_name("uvicorn[standard]==0.23"),
            Some("uvicorn".to_string())
        );
        // marker-conditional deps are skipped
        assert_eq!(parse_requirement_name("tomli>=1.1 ; python_version < '3.11'"), None);
        assert_eq!(parse_requirement_name("pytest ; extra == 'test'"), None);
        assert_eq!(parse_requirement_name(""), None);
    }

    #[tokio::test]
    async fn test_resolve_project_wheels_traversal() {
        let fixtures = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();

        build_wheel(
            fixtures.path(),
            "app-1.0.0-py3-none-any.whl",
            &["libone>=1.0", "libtwo"],
        );
        build_wheel(fixtures.path(), "libone-1.2.0-py3-none-any.whl", &["libtwo"]);
        build_wheel(fixtures.path(), "libtwo-0.5.0-py3-none-any.whl", &[]);

        let resolvers: Vec<Box<dyn WheelResolver>> = vec![Box::new(DirResolver {
            dir: fixtures.path().to_path_buf(),
        })];

        let artifacts =
            resolve_project_wheels(&["app".to_string()], staging.path(), &resolvers)
                .await
                .unwrap();

        assert_eq!(artifacts.len(), 3);
        let app = artifacts.iter().find(|a| a.name == "app").unwrap();
        assert_eq!(app.role, WheelRole::Primary);
        let libone = artifacts.iter().find(|a| a.name == "libone").unwrap();
        assert_eq!(libone.role, WheelRole::Dependency);
        assert!(artifacts.iter().any(|a| a.name == "libtwo"));
    }

    #[tokio::test]
    async fn test_resolve_project_wheels_dedupes_shared_dependency() {
        let fixtures = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();

        build_wheel(fixtures.path(), "first-1.0-py3-none-any.whl", &["shared"]);
        build_wheel(fixtures.path(), "second-1.0-py3-none-any.whl", &["shared"]);
        build_wheel(fixtures.path(), "shared-2.0-py3-none-any.whl", &[]);

        let resolvers: Vec<Box<dyn WheelResolver>> = vec![Box::new(DirResolver {
            dir: fixtures.path().to_path_buf(),
        })];

        let artifacts = resolve_project_wheels(
            &["first".to_string(), "second".to_string()],
            staging.path(),
            &resolvers,
        )
        .await
        .unwrap();

        assert_eq!(artifacts.len(), 3);
        assert_eq!(
            artifacts.iter().filter(|a| a.name == "shared").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_resolve_project_wheels_primary_role_wins() {
        let fixtures = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();

        build_wheel(fixtures.path(), "app-1.0-py3-none-any.whl", &["lib"]);
        build_wheel(fixtures.path(), "lib-1.0-py3-none-any.whl", &[]);

        let resolvers: Vec<Box<dyn WheelResolver>> = vec![Box::new(DirResolver {
            dir: fixtures.path().to_path_buf(),
        })];

        // lib is both a root and a dependency of app
        let artifacts = resolve_project_wheels(
            &["app".to_string(), "lib".to_string()],
            staging.path(),
            &resolvers,
        )
        .await
        .unwrap();

        let lib = artifacts.iter().find(|a| a.name == "lib").unwrap();
        assert_eq!(lib.role, WheelRole::Primary);
    }

    #[tokio::test]
    async fn test_resolve_project_wheels_propagates_failures() {
        let fixtures = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();

        build_wheel(fixtures.path(), "app-1.0-py3-none-any.whl", &["missing-dep"]);

        let resolvers: Vec<Box<dyn WheelResolver>> = vec![Box::new(DirResolver {
            dir: fixtures.path().to_path_buf(),
        })];

        let err = resolve_project_wheels(&["app".to_string()], staging.path(), &resolvers)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ResolutionFailed { .. }));
    }
}
