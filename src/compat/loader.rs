//! Layered compatibility spec loading
//!
//! The effective spec is built from up to three sources, lowest precedence
//! first: the embedded default document, an optional user file (combined with
//! the strategy the caller picked), and optional inline overrides (always
//! combined with override semantics, always last). The resolved spec records
//! the provenance of every layer in `source_description`.

use crate::compat::spec::{CompatibilitySpec, CompatibilitySpecLayer, MergeStrategy};
use crate::error::SpecError;
use std::fs;
use std::path::Path;

/// Resource path of the embedded default document, for provenance strings
pub const DEFAULT_SPEC_PATH: &str = "compat/default_spec.toml";

static DEFAULT_SPEC_TEXT: &str = include_str!("default_spec.toml");

/// Provenance label for inline overrides sourced from chubproject.toml
const INLINE_SOURCE: &str = "chubproject";

/// Parse the embedded default spec layer.
pub fn load_default_spec_layer() -> Result<CompatibilitySpecLayer, SpecError> {
    parse_spec_layer(DEFAULT_SPEC_TEXT, &format!("embedded:{}", DEFAULT_SPEC_PATH))
}

/// Load a spec layer from a user-supplied TOML file.
pub fn load_file_spec_layer(path: &Path) -> Result<CompatibilitySpecLayer, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| SpecError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_spec_layer(&text, &path.display().to_string())
}

/// Build the effective compatibility spec from the layered sources.
pub fn load_effective_spec(
    user_spec_path: Option<&Path>,
    strategy: MergeStrategy,
    inline_overrides: Option<CompatibilitySpecLayer>,
) -> Result<CompatibilitySpec, SpecError> {
    // 1) start from the embedded defaults
    let mut merged = load_default_spec_layer()?;
    let mut source_parts = vec![format!("embedded:{}", DEFAULT_SPEC_PATH)];

    // 2) overlay the user file, if present
    if let Some(path) = user_spec_path {
        let file_layer = load_file_spec_layer(path)?;
        merged = merged.combined_with(file_layer, strategy);
        source_parts.push(format!("file:{} ({})", path.display(), strategy));
    }

    // 3) inline overrides last, always with override semantics
    if let Some(inline) = inline_overrides {
        merged = merged.combined_with(inline, MergeStrategy::Override);
        source_parts.push(format!("inline:{}", INLINE_SOURCE));
    }

    Ok(CompatibilitySpec::from_layer(merged, source_parts.join(" + ")))
}

fn parse_spec_layer(text: &str, origin: &str) -> Result<CompatibilitySpecLayer, SpecError> {
    toml::from_str(text).map_err(|err| SpecError::ParseError {
        origin: origin.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_spec(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_embedded_default_parses() {
        let layer = load_default_spec_layer().unwrap();
        let py = layer.python_versions.as_ref().unwrap();
        assert_eq!(py.min.as_deref(), Some("3.9"));
        assert!(layer.platform_values.is_some());
    }

    #[test]
    fn test_defaults_only_provenance() {
        let spec = load_effective_spec(None, MergeStrategy::Merge, None).unwrap();
        assert_eq!(
            spec.source_description,
            format!("embedded:{}", DEFAULT_SPEC_PATH)
        );
        assert!(spec.platform_values.contains_key("linux"));
        assert!(spec.abi_values.include_stable);
    }

    #[test]
    fn test_file_layer_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(
            &dir,
            "compat.toml",
            r#"
[PythonVersions]
excludes = ["cp39"]
"#,
        );
        let spec = load_effective_spec(Some(&path), MergeStrategy::Merge, None).unwrap();
        // base min survives, file excludes appended
        assert_eq!(spec.python_versions.min.as_deref(), Some("3.9"));
        assert_eq!(spec.python_versions.excludes, vec!["cp39"]);
        assert!(spec
            .source_description
            .ends_with(&format!("file:{} (merge)", path.display())));
    }

    #[test]
    fn test_file_layer_override_replaces_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(
            &dir,
            "compat.toml",
            r#"
[PlatformValues.windows]
specific = ["win_amd64"]
"#,
        );
        let spec = load_effective_spec(Some(&path), MergeStrategy::Override, None).unwrap();
        let windows = &spec.platform_values["windows"];
        assert_eq!(windows.specific, vec!["win_amd64"]);
        assert!(spec.source_description.contains("(override)"));
    }

    #[test]
    fn test_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = load_effective_spec(Some(&missing), MergeStrategy::Merge, None).unwrap_err();
        assert!(matches!(err, SpecError::FileNotFound { .. }));
    }

    #[test]
    fn test_unparsable_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(&dir, "broken.toml", "PythonVersions = 3\n");
        let err = load_effective_spec(Some(&path), MergeStrategy::Merge, None).unwrap_err();
        assert!(matches!(err, SpecError::ParseError { .. }));
    }

    #[test]
    fn test_inline_overrides_always_override_and_come_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(
            &dir,
            "compat.toml",
            r#"
[PythonVersions]
min = "3.10"
excludes = ["cp310"]
"#,
        );

        let inline: CompatibilitySpecLayer = toml::from_str(
            r#"
[PythonVersions]
excludes = ["cp313"]
"#,
        )
        .unwrap();

        let spec =
            load_effective_spec(Some(&path), MergeStrategy::Merge, Some(inline)).unwrap();
        // inline layer uses override semantics even under a merge file layer
        assert_eq!(spec.python_versions.excludes, vec!["cp313"]);
        assert_eq!(spec.python_versions.min.as_deref(), Some("3.10"));
        assert_eq!(
            spec.source_description,
            format!(
                "embedded:{} + file:{} (merge) + inline:chubproject",
                DEFAULT_SPEC_PATH,
                path.display()
            )
        );
    }

    #[test]
    fn test_effective_spec_drives_evaluator() {
        use crate::compat::evaluator::CompatibilityEvaluator;

        let spec = load_effective_spec(None, MergeStrategy::Merge, None).unwrap();
        let eval = CompatibilityEvaluator::new(spec).unwrap();
        assert!(eval.accept_tag(&crate::tags::Tag::universal()));
        assert!(eval.accept_tag(&crate::tags::Tag::new(
            "cp311",
            "cp311",
            "manylinux_2_17_x86_64"
        )));
        assert!(!eval.accept_tag(&crate::tags::Tag::new("cp38", "cp38", "win_amd64")));
    }
}
