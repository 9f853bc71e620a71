//! Output formatting for analysis and build results
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Minimal output
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Detailed output with additional information
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Whether this is a dry-run
    pub dry_run: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            dry_run: false,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, verbose: bool, quiet: bool, dry_run: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            dry_run,
        }
    }
}

/// Result of a compatibility analysis
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Resolved target strings (`universal` or combo strings)
    pub targets: Vec<String>,
    /// Combo string -> dependency name -> selected wheel filename
    pub combos: BTreeMap<String, BTreeMap<String, String>>,
    /// Combo string -> accepted by the compatibility spec
    pub evaluations: BTreeMap<String, bool>,
    /// Distinct interpreters seen across all wheels
    pub interpreters: Vec<String>,
    /// Distinct ABIs seen across all wheels
    pub abis: Vec<String>,
    /// Distinct platforms seen across all wheels
    pub platforms: Vec<String>,
    /// Provenance of the layered compatibility spec
    pub spec_source: String,
}

impl AnalysisReport {
    /// True when the bundle collapses to the single universal target.
    pub fn is_universal(&self) -> bool {
        matches!(
            self.targets.as_slice(),
            [only] if only.as_str() == "universal" || only.as_str() == "py3-none-any"
        )
    }
}

/// Result of a bundle build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Primary distribution name
    pub name: String,
    /// Primary distribution version
    pub version: String,
    /// Archive output path
    pub output: PathBuf,
    /// Number of bundled wheels
    pub wheel_count: usize,
    /// Recorded compatibility targets
    pub targets: Vec<String>,
    /// Whether the archive was actually written
    pub dry_run: bool,
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write a compatibility analysis report
    fn format_analysis(&self, report: &AnalysisReport, writer: &mut dyn Write)
        -> std::io::Result<()>;

    /// Format and write a build report
    fn format_build(&self, report: &BuildReport, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::new(config.verbosity, config.dry_run)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}
