//! JSON output for machine processing

use crate::output::{AnalysisReport, BuildReport, OutputFormatter};
use std::io::Write;

/// JSON formatter
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }

    fn write_json<T: serde::Serialize>(
        &self,
        value: &T,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_analysis(
        &self,
        report: &AnalysisReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_json(report, writer)
    }

    fn format_build(&self, report: &BuildReport, writer: &mut dyn Write) -> std::io::Result<()> {
        self.write_json(report, writer)
    }
}
