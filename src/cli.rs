//! CLI argument parsing module for chub

use crate::compat::spec::MergeStrategy;
use crate::project::DEFAULT_TABLE;
use crate::resolve::DEFAULT_INDEX_URL;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Parse a metadata entry of the form KEY=VALUE
fn parse_metadata_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("invalid metadata entry '{}': expected KEY=VALUE", s)),
    }
}

/// Parse a merge strategy name
fn parse_merge_strategy(s: &str) -> Result<MergeStrategy, String> {
    s.parse()
}

/// Package a Python wheel and its dependencies into a .chub archive
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chub",
    version,
    about = "Package a Python wheel and its dependencies into a .chub archive"
)]
pub struct CliArgs {
    /// Wheel specs: local .whl paths or pip-style requirements (repeatable)
    #[arg(short = 'w', long = "wheel", action = ArgAction::Append, value_name = "WHEEL|SPEC")]
    pub wheels: Vec<String>,

    /// Output .chub path (defaults to <name>-<version>.chub)
    #[arg(short = 'c', long = "chub", value_name = "PATH")]
    pub chub: Option<PathBuf>,

    /// Entrypoint 'module:function' to run after install
    #[arg(short = 'e', long)]
    pub entrypoint: Option<String>,

    /// Default arguments to pass to the entrypoint when the chub is invoked
    #[arg(
        long = "entrypoint-args",
        num_args = 0..,
        allow_hyphen_values = true,
        value_name = "ARG"
    )]
    pub entrypoint_args: Vec<String>,

    /// Extra files to include (dest is relative to the install dir)
    #[arg(short = 'i', long = "include", action = ArgAction::Append, value_name = "FILE[::DEST]")]
    pub includes: Vec<String>,

    /// Pre-install scripts to include and run, in order
    #[arg(short = 'p', long = "pre-script", action = ArgAction::Append, value_name = "SCRIPT")]
    pub pre_scripts: Vec<String>,

    /// Post-install scripts to include and run, in order
    #[arg(short = 'o', long = "post-script", action = ArgAction::Append, value_name = "SCRIPT")]
    pub post_scripts: Vec<String>,

    /// Extra metadata entries to embed in the manifest
    #[arg(
        short = 'm',
        long = "metadata-entry",
        action = ArgAction::Append,
        value_parser = parse_metadata_entry,
        value_name = "KEY=VALUE"
    )]
    pub metadata_entries: Vec<(String, String)>,

    /// Read options from a chubproject.toml
    #[arg(long, value_name = "PATH")]
    pub chubproject: Option<PathBuf>,

    /// Write the effective options to a chubproject.toml
    #[arg(long = "chubproject-save", value_name = "PATH")]
    pub chubproject_save: Option<PathBuf>,

    /// Options table in the project file
    #[arg(short = 't', long, default_value = DEFAULT_TABLE, value_name = "TABLE")]
    pub table: String,

    /// Analyze target compatibility and exit without building
    #[arg(long)]
    pub analyze_compatibility: bool,

    /// Compatibility spec file layered over the embedded default
    #[arg(long = "compat-spec", value_name = "PATH")]
    pub compat_spec: Option<PathBuf>,

    /// Strategy for combining the spec file: 'override' or 'merge'
    #[arg(long = "compat-merge", value_parser = parse_merge_strategy, value_name = "STRATEGY")]
    pub compat_merge: Option<MergeStrategy>,

    /// Single explicit compatibility target (e.g. 'universal')
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Explicit compatibility targets (repeatable)
    #[arg(long = "targets", action = ArgAction::Append, value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Package index base URL
    #[arg(long = "index-url", default_value = DEFAULT_INDEX_URL, value_name = "URL")]
    pub index_url: String,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Dry run mode - plan and analyze without writing the archive
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}
