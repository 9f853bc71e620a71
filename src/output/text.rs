//! Human-readable text output

use crate::output::{AnalysisReport, BuildReport, OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for terminal display
pub struct TextFormatter {
    verbosity: Verbosity,
    dry_run: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self { verbosity, dry_run }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_analysis(
        &self,
        report: &AnalysisReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            for target in &report.targets {
                writeln!(writer, "{}", target)?;
            }
            return Ok(());
        }

        writeln!(writer, "{}", "Supported targets:".bold())?;

        if report.targets.is_empty() {
            writeln!(writer, " - {}", "No supported targets found!".red())?;
        } else if report.is_universal() {
            writeln!(writer, " - {} (py3-none-any)", "universal".green())?;
        } else {
            for target in &report.targets {
                match report.evaluations.get(target) {
                    Some(true) => {
                        writeln!(writer, " - {} ({})", target, "accepted".green())?;
                    }
                    Some(false) => {
                        writeln!(writer, " - {} ({})", target, "rejected by spec".yellow())?;
                    }
                    None => writeln!(writer, " - {}", target)?,
                }
            }
        }

        if self.verbosity == Verbosity::Verbose {
            if !report.combos.is_empty() {
                writeln!(writer)?;
                writeln!(writer, "{}", "Wheel selection:".bold())?;
                for (combo, wheel_map) in &report.combos {
                    writeln!(writer, "  {}:", combo)?;
                    for (dep, wheel) in wheel_map {
                        writeln!(writer, "    {} -> {}", dep, wheel)?;
                    }
                }
            }

            writeln!(writer)?;
            writeln!(writer, "Interpreters: {}", report.interpreters.join(", "))?;
            writeln!(writer, "ABIs:         {}", report.abis.join(", "))?;
            writeln!(writer, "Platforms:    {}", report.platforms.join(", "))?;
            writeln!(writer, "Spec:         {}", report.spec_source)?;
        }

        Ok(())
    }

    fn format_build(&self, report: &BuildReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            if !report.dry_run {
                writeln!(writer, "{}", report.output.display())?;
            }
            return Ok(());
        }

        if report.dry_run || self.dry_run {
            writeln!(
                writer,
                "{} {} {} ({} wheels, no archive written)",
                "Dry run:".yellow().bold(),
                report.name,
                report.version,
                report.wheel_count
            )?;
        } else {
            writeln!(
                writer,
                "{} {} {} -> {} ({} wheels)",
                "Packaged".green().bold(),
                report.name,
                report.version,
                report.output.display(),
                report.wheel_count
            )?;
        }

        writeln!(writer, "Targets: {}", report.targets.join(", "))?;
        Ok(())
    }
}
