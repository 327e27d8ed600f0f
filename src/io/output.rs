//! Report rendering: JSON for machines, colored text for terminals.

use crate::core::{AnalysisReport, Finding, Severity};
use colored::*;
use std::io::Write;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

impl OutputFormat {
    /// Parse a format name from configuration; unknown names are rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(OutputFormat::Json),
            "terminal" | "text" => Some(OutputFormat::Terminal),
            _ => None,
        }
    }
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()>;
}

pub fn create_writer<W: Write + 'static>(format: OutputFormat, writer: W) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_finding(&mut self, finding: &Finding) -> anyhow::Result<()> {
        let severity = match finding.severity {
            Severity::High => finding.severity.to_string().red().bold(),
            Severity::Medium => finding.severity.to_string().yellow(),
            Severity::Low => finding.severity.to_string().normal(),
        };
        writeln!(
            self.writer,
            "  [{severity}] {} {}:{}",
            finding.kind.to_string().cyan(),
            finding.file.display(),
            finding.line
        )?;
        writeln!(self.writer, "      {}", finding.message)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Declump Analysis".bold())?;
        writeln!(
            self.writer,
            "  root: {}  files: {}  classes: {}",
            report.root.display(),
            report.files_scanned,
            report.classes_indexed
        )?;
        writeln!(self.writer)?;

        if report.findings.is_empty() {
            writeln!(self.writer, "{}", "No data clumps found.".green())?;
            return Ok(());
        }
        for finding in &report.findings {
            self.write_finding(finding)?;
        }
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}",
            format!("{} finding(s)", report.findings.len()).bold()
        )?;
        Ok(())
    }
}
