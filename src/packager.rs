//! Packaging orchestrator
//!
//! This module provides:
//! - Workflow coordination: configure → resolve → analyze → bundle
//! - CLI-over-chubproject option merging
//! - Dry-run and analyze-only modes

use crate::bundle::{
    staged_script_name, write_chub, BundlePlan, ChubManifest, IncludeSpec,
};
use crate::cli::CliArgs;
use crate::compat::spec::CompatibilitySpecLayer;
use crate::compat::{
    aggregate_tag_components, compute_per_combo_wheel_map, load_effective_spec,
    resolve_compatibility_targets, CompatibilityEvaluator, MergeStrategy,
};
use crate::error::{AppError, BundleError, ProjectError, ResolveError};
use crate::output::{AnalysisReport, BuildReport};
use crate::progress::Progress;
use crate::project::{ChubProject, CompatibilityOptions};
use crate::resolve::{default_resolvers, resolve_project_wheels, HttpClient};
use crate::wheel::WheelCollection;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Effective packaging options: chubproject values with CLI overrides applied
///
/// Scalars: a CLI value wins over the file value. Lists: a non-empty CLI list
/// replaces the file list. Metadata entries: CLI entries are upserted into
/// the file map.
#[derive(Debug, Clone, Default)]
pub struct EffectiveOptions {
    pub wheels: Vec<String>,
    pub chub: Option<PathBuf>,
    pub entrypoint: Option<String>,
    pub entrypoint_args: Vec<String>,
    pub includes: Vec<String>,
    pub pre_scripts: Vec<String>,
    pub post_scripts: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub target: Option<String>,
    pub targets: Vec<String>,
    pub compat_spec: Option<PathBuf>,
    pub merge_strategy: MergeStrategy,
    pub inline_spec: Option<CompatibilitySpecLayer>,
    pub index_url: String,
}

impl EffectiveOptions {
    /// Merge CLI arguments over optional chubproject values.
    pub fn merge(args: &CliArgs, project: Option<ChubProject>) -> Self {
        let project = project.unwrap_or_default();

        fn pick(cli: &[String], file: Vec<String>) -> Vec<String> {
            if cli.is_empty() {
                file
            } else {
                cli.to_vec()
            }
        }

        let mut metadata = project.metadata;
        for (key, value) in &args.metadata_entries {
            metadata.insert(key.clone(), value.clone());
        }

        Self {
            wheels: pick(&args.wheels, project.wheels),
            chub: args.chub.clone().or(project.chub),
            entrypoint: args.entrypoint.clone().or(project.entrypoint),
            entrypoint_args: pick(&args.entrypoint_args, project.entrypoint_args),
            includes: pick(&args.includes, project.includes),
            pre_scripts: pick(&args.pre_scripts, project.pre_scripts),
            post_scripts: pick(&args.post_scripts, project.post_scripts),
            metadata,
            target: args.target.clone().or(project.compatibility.target),
            targets: pick(&args.targets, project.compatibility.targets),
            compat_spec: args
                .compat_spec
                .clone()
                .or(project.compatibility.spec_file),
            merge_strategy: args
                .compat_merge
                .or(project.compatibility.merge_strategy)
                .unwrap_or_default(),
            inline_spec: project.compatibility.spec,
            index_url: args.index_url.clone(),
        }
    }

    /// Project view of the effective options, for --chubproject-save.
    pub fn to_project(&self) -> ChubProject {
        ChubProject {
            wheels: self.wheels.clone(),
            chub: self.chub.clone(),
            entrypoint: self.entrypoint.clone(),
            entrypoint_args: self.entrypoint_args.clone(),
            includes: self.includes.clone(),
            pre_scripts: self.pre_scripts.clone(),
            post_scripts: self.post_scripts.clone(),
            metadata: self.metadata.clone(),
            compatibility: CompatibilityOptions {
                target: self.target.clone(),
                targets: self.targets.clone(),
                spec_file: self.compat_spec.clone(),
                merge_strategy: Some(self.merge_strategy),
                spec: self.inline_spec.clone(),
            },
        }
    }
}

/// Outcome of one packager run
#[derive(Debug)]
pub struct PackageOutcome {
    /// Compatibility analysis, always computed
    pub analysis: AnalysisReport,
    /// Build result, absent in analyze-only mode
    pub build: Option<BuildReport>,
}

/// Orchestrator for the packaging workflow
pub struct Packager {
    options: EffectiveOptions,
    analyze_only: bool,
    dry_run: bool,
    quiet: bool,
}

impl Packager {
    /// Create a packager from CLI arguments, loading and saving the
    /// chubproject as requested.
    pub fn new(args: CliArgs) -> Result<Self, AppError> {
        let project = match &args.chubproject {
            Some(path) => Some(ChubProject::load(path, &args.table)?),
            None => None,
        };
        let options = EffectiveOptions::merge(&args, project);

        if let Some(save_path) = &args.chubproject_save {
            options.to_project().save(save_path, &args.table, false)?;
        }

        Ok(Self {
            options,
            analyze_only: args.analyze_compatibility,
            dry_run: args.dry_run,
            quiet: args.quiet,
        })
    }

    /// Run the packaging workflow.
    pub async fn run(&self) -> Result<PackageOutcome, AppError> {
        if self.options.wheels.is_empty() {
            return Err(ProjectError::NoWheels.into());
        }

        let mut progress = Progress::new(!self.quiet);

        // Stage wheels and their transitive dependencies
        progress.spinner("Resolving wheels...");
        let staging = tempfile::tempdir().map_err(|source| ResolveError::Io {
            path: PathBuf::from("<staging>"),
            source,
        })?;
        let client = HttpClient::new()?;
        let resolvers = default_resolvers(client, self.options.index_url.clone());
        let artifacts =
            resolve_project_wheels(&self.options.wheels, staging.path(), &resolvers).await;
        progress.finish_and_clear();
        let artifacts = artifacts?;

        let mut collection = WheelCollection::new();
        for artifact in artifacts {
            collection.add(artifact);
        }

        // Compatibility analysis
        progress.spinner("Computing compatibility...");
        let analysis = self.analyze(&collection);
        progress.finish_and_clear();
        let analysis = analysis?;

        if self.analyze_only {
            return Ok(PackageOutcome {
                analysis,
                build: None,
            });
        }

        if analysis.targets.is_empty() {
            return Err(BundleError::NoCommonTarget.into());
        }

        let build = self.bundle(&collection, &analysis)?;
        Ok(PackageOutcome {
            analysis,
            build: Some(build),
        })
    }

    fn analyze(&self, collection: &WheelCollection) -> Result<AnalysisReport, AppError> {
        let wheel_files = collection.wheel_files();

        let combos = compute_per_combo_wheel_map(&wheel_files)?;
        let targets = resolve_compatibility_targets(
            &wheel_files,
            self.options.target.as_deref(),
            &self.options.targets,
        )?;
        let (interpreters, abis, platforms) = aggregate_tag_components(&wheel_files)?;

        let spec = load_effective_spec(
            self.options.compat_spec.as_deref(),
            self.options.merge_strategy,
            self.options.inline_spec.clone(),
        )?;
        let evaluator = CompatibilityEvaluator::new(spec)?;
        let spec_source = evaluator.spec().source_description.clone();

        let mut evaluations = BTreeMap::new();
        for combo in combos.keys() {
            evaluations.insert(combo.clone(), evaluator.evaluate_compatibility(combo)?);
        }

        Ok(AnalysisReport {
            targets,
            combos,
            evaluations,
            interpreters,
            abis,
            platforms,
            spec_source,
        })
    }

    fn bundle(
        &self,
        collection: &WheelCollection,
        analysis: &AnalysisReport,
    ) -> Result<BuildReport, AppError> {
        let primaries = collection.primary();
        let Some(first) = primaries.first() else {
            return Err(ProjectError::NoWheels.into());
        };

        let mut manifest = ChubManifest::new(first.name.clone(), first.version.clone());
        manifest.entrypoint = self.options.entrypoint.clone();
        manifest.entrypoint_args = self.options.entrypoint_args.clone();
        manifest.metadata = self.options.metadata.clone();

        let dependency_files: Vec<String> = collection
            .dependencies()
            .iter()
            .map(|w| w.filename().to_string())
            .collect();
        for primary in &primaries {
            manifest
                .wheels
                .insert(primary.filename().to_string(), dependency_files.clone());
        }

        let includes: Vec<IncludeSpec> = self
            .options
            .includes
            .iter()
            .map(|raw| IncludeSpec::parse(raw))
            .collect();
        manifest.includes = includes.iter().map(|i| i.dest.clone()).collect();

        let pre_scripts: Vec<PathBuf> =
            self.options.pre_scripts.iter().map(PathBuf::from).collect();
        let post_scripts: Vec<PathBuf> =
            self.options.post_scripts.iter().map(PathBuf::from).collect();
        manifest.scripts.pre = pre_scripts
            .iter()
            .enumerate()
            .map(|(i, p)| staged_script_name(i, p))
            .collect();
        manifest.scripts.post = post_scripts
            .iter()
            .enumerate()
            .map(|(i, p)| staged_script_name(i, p))
            .collect();

        manifest.compatibility.targets = analysis.targets.clone();
        manifest.compatibility.wheel_map = analysis.combos.clone();

        for wheel in collection.iter() {
            manifest
                .hashes
                .insert(wheel.filename().to_string(), wheel.sha256.clone());
        }

        let output = self.options.chub.clone().unwrap_or_else(|| {
            PathBuf::from(format!("{}-{}.chub", manifest.name, manifest.version))
        });

        let report = BuildReport {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            output: output.clone(),
            wheel_count: collection.len(),
            targets: analysis.targets.clone(),
            dry_run: self.dry_run,
        };

        if self.dry_run {
            // Validate without writing anything
            manifest.validate()?;
            return Ok(report);
        }

        let plan = BundlePlan {
            manifest,
            wheels: collection.iter().map(|w| w.path.clone()).collect(),
            pre_scripts,
            post_scripts,
            includes,
        };
        write_chub(&plan, &output)?;

        Ok(report)
    }
}

/// Read the manifest of an existing archive (used by the analyze tooling
/// and tests to verify produced bundles).
pub fn inspect_chub(path: &Path) -> Result<ChubManifest, AppError> {
    Ok(crate::bundle::read_manifest(path)?)
}
