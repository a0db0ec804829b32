//! Aggregated check results and their text, JSON and YAML renderings.

use super::{Inconsistency, InconsistencyKind, Severity};
use crate::adapters::ContactFormat;
use crate::types::PplError;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Result<Self, PplError> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(PplError::ConfigError(format!(
                "unknown report format '{other}' (expected text, json or yaml)"
            ))),
        }
    }
}

/// Result of [`super::ConsistencyChecker::check_all`].
#[derive(Debug, Clone)]
pub struct ConsistencyReport {
    pub inconsistencies: Vec<Inconsistency>,
    pub total_contacts_graph: usize,
    pub total_files_vcf: usize,
    pub total_files_markdown: usize,
    pub total_files_yaml: usize,
    pub checked_at: DateTime<Local>,
}

#[derive(Serialize)]
struct ReportDocument<'r> {
    is_consistent: bool,
    total_contacts_graph: usize,
    total_files_vcf: usize,
    total_files_markdown: usize,
    total_files_yaml: usize,
    inconsistencies: &'r [Inconsistency],
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    checked_at: String,
}

impl ConsistencyReport {
    #[must_use]
    pub fn new(total_contacts_graph: usize) -> Self {
        Self {
            inconsistencies: Vec::new(),
            total_contacts_graph,
            total_files_vcf: 0,
            total_files_markdown: 0,
            total_files_yaml: 0,
            checked_at: Local::now(),
        }
    }

    pub(super) fn add_files(&mut self, format: ContactFormat, count: usize) {
        match format {
            ContactFormat::Vcard => self.total_files_vcf += count,
            ContactFormat::Markdown => self.total_files_markdown += count,
            ContactFormat::Yaml => self.total_files_yaml += count,
        }
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    fn count(&self, severity: Severity) -> usize {
        self.inconsistencies
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    #[must_use]
    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, PplError> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => serde_json::to_string_pretty(&self.document())
                .map_err(|e| PplError::SerializationError(e.to_string())),
            ReportFormat::Yaml => serde_yaml::to_string(&self.document())
                .map_err(|e| PplError::SerializationError(e.to_string())),
        }
    }

    fn document(&self) -> ReportDocument<'_> {
        ReportDocument {
            is_consistent: self.is_consistent(),
            total_contacts_graph: self.total_contacts_graph,
            total_files_vcf: self.total_files_vcf,
            total_files_markdown: self.total_files_markdown,
            total_files_yaml: self.total_files_yaml,
            inconsistencies: &self.inconsistencies,
            error_count: self.error_count(),
            warning_count: self.warning_count(),
            info_count: self.info_count(),
            checked_at: self.checked_at.to_rfc3339(),
        }
    }

    fn render_text(&self) -> String {
        let mut lines = vec![
            "Consistency Check Report".to_string(),
            "=".repeat(80),
            String::new(),
        ];

        if self.is_consistent() {
            lines.push("Status: CONSISTENT".to_string());
        } else {
            lines.push(format!(
                "Status: INCONSISTENT ({} issue(s) found)",
                self.inconsistencies.len()
            ));
            lines.push(format!("  Errors: {}", self.error_count()));
            lines.push(format!("  Warnings: {}", self.warning_count()));
            if self.info_count() > 0 {
                lines.push(format!("  Info: {}", self.info_count()));
            }
        }
        lines.push(String::new());

        lines.push("Summary:".to_string());
        lines.push(format!("  Total contacts in graph: {}", self.total_contacts_graph));
        for (label, count) in [
            ("VCF", self.total_files_vcf),
            ("Markdown", self.total_files_markdown),
            ("YAML", self.total_files_yaml),
        ] {
            if count > 0 {
                lines.push(format!("  Total {label} files: {count}"));
            }
        }

        if !self.is_consistent() {
            lines.push(String::new());
            lines.push("Issues:".to_string());
            for (i, issue) in self.inconsistencies.iter().enumerate() {
                lines.push(format!("{}. {issue}", i + 1));
            }
            lines.push(String::new());
            lines.push("Recommendations:".to_string());
            lines.extend(self.recommendations());
        }

        lines.push(String::new());
        lines.push(format!(
            "Checked at: {}",
            self.checked_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.join("\n")
    }

    fn has(&self, kind: InconsistencyKind, source: &str) -> bool {
        self.inconsistencies
            .iter()
            .any(|i| i.kind == kind && i.source == source)
    }

    fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for format in ContactFormat::ALL {
            if self.has(InconsistencyKind::Missing, format.folder_source()) {
                out.push(format!(
                    "- Export graph to {} folder to add missing contacts",
                    format.label()
                ));
            }
        }
        for format in ContactFormat::ALL {
            if self.has(InconsistencyKind::Orphaned, format.folder_source()) {
                out.push(format!(
                    "- Import {} folder to add orphaned contacts to graph",
                    format.label()
                ));
            }
        }
        if self
            .inconsistencies
            .iter()
            .any(|i| i.kind == InconsistencyKind::Outdated)
        {
            out.push("- Review REV timestamps to determine which version is correct".to_string());
            out.push("- Export graph with --force to update outdated files".to_string());
        }
        if self
            .inconsistencies
            .iter()
            .any(|i| i.kind == InconsistencyKind::Error)
        {
            out.push("- Fix or remove files that fail to parse".to_string());
        }
        out
    }
}
