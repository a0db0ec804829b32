//! # Consistency Engine
//!
//! Compares the graph against per-contact folders and reports drift.
//!
//! For each folder:
//!
//! | Finding | Kind | Severity |
//! |---------|------|----------|
//! | folder does not exist | `missing` | error |
//! | file cannot be parsed | `error` | error |
//! | contact in graph, not in folder | `missing` | warning |
//! | contact in folder, not in graph | `orphaned` | warning |
//! | both present, revisions differ | `outdated` | warning |
//! | Markdown file without front matter | `inconsistent` | info |
//! | Markdown wiki links with no `RELATED` front matter | `inconsistent` | info |
//!
//! The engine only reads. Fixing drift is an import or export.

mod report;

pub use report::{ConsistencyReport, ReportFormat};

use crate::adapters::markdown::MarkdownDocument;
use crate::adapters::{ContactFormat, bulk_import, list_files};
use crate::contact::Contact;
use crate::graph::GraphStore;
use crate::types::PplError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// `source` of per-file Markdown front matter findings.
pub const MARKDOWN_FILE_SOURCE: &str = "markdown_file";

const REV_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// FINDINGS
// =============================================================================

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InconsistencyKind {
    Missing,
    Orphaned,
    Outdated,
    Inconsistent,
    Error,
}

impl InconsistencyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Orphaned => "orphaned",
            Self::Outdated => "outdated",
            Self::Inconsistent => "inconsistent",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inconsistency {
    #[serde(rename = "type")]
    pub kind: InconsistencyKind,
    /// Where it was found: `vcf_folder`, `markdown_folder`, `yaml_folder`, `markdown_file`.
    pub source: String,
    /// Affected UID or file name.
    pub target: Option<String>,
    pub details: String,
    pub severity: Severity,
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str().to_uppercase(), self.details)
    }
}

// =============================================================================
// CHECKER
// =============================================================================

/// A folder to check and the format of its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSpec {
    pub format: ContactFormat,
    pub path: PathBuf,
}

impl FolderSpec {
    pub fn new(format: ContactFormat, path: impl Into<PathBuf>) -> Self {
        Self {
            format,
            path: path.into(),
        }
    }
}

/// Read-only consistency checks of one graph against folders.
#[derive(Debug)]
pub struct ConsistencyChecker<'g, G: GraphStore> {
    graph: &'g G,
}

impl<'g, G: GraphStore> ConsistencyChecker<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    /// Check one folder.
    #[must_use]
    pub fn check(&self, folder: &FolderSpec) -> Vec<Inconsistency> {
        let format = folder.format;
        let source = format.folder_source();
        let label = format.label();

        if !folder.path.is_dir() {
            return vec![Inconsistency {
                kind: InconsistencyKind::Missing,
                source: source.to_string(),
                target: None,
                details: format!("{label} folder not found: {}", folder.path.display()),
                severity: Severity::Error,
            }];
        }

        let import = match bulk_import(&folder.path, format) {
            Ok(import) => import,
            Err(err) => {
                return vec![Inconsistency {
                    kind: InconsistencyKind::Error,
                    source: source.to_string(),
                    target: None,
                    details: format!("Failed to load {label} files: {err}"),
                    severity: Severity::Error,
                }];
            }
        };

        let mut found: Vec<Inconsistency> = import
            .failures
            .iter()
            .map(|failure| parse_failure(source, failure))
            .collect();

        let in_folder: BTreeMap<&str, &Contact> = import
            .contacts
            .iter()
            .filter_map(|c| Some((c.uid()?, c)))
            .collect();
        let in_graph: BTreeMap<&str, &Contact> = self
            .graph
            .all_entities()
            .into_iter()
            .filter_map(|c| Some((c.uid()?, c)))
            .collect();

        for (uid, contact) in &in_graph {
            if !in_folder.contains_key(uid) {
                found.push(Inconsistency {
                    kind: InconsistencyKind::Missing,
                    source: source.to_string(),
                    target: Some((*uid).to_string()),
                    details: format!(
                        "Contact \"{}\" ({uid}) exists in graph but not in {label} folder",
                        contact.fn_name
                    ),
                    severity: Severity::Warning,
                });
            }
        }

        for (uid, contact) in &in_folder {
            if !in_graph.contains_key(uid) {
                found.push(Inconsistency {
                    kind: InconsistencyKind::Orphaned,
                    source: source.to_string(),
                    target: Some((*uid).to_string()),
                    details: format!(
                        "{label} file for \"{}\" ({uid}) exists but contact not in graph",
                        contact.fn_name
                    ),
                    severity: Severity::Warning,
                });
            }
        }

        for (uid, stored) in &in_graph {
            let Some(file) = in_folder.get(uid) else { continue };
            if let (Some(file_rev), Some(graph_rev)) = (file.rev, stored.rev) {
                if file_rev != graph_rev {
                    found.push(Inconsistency {
                        kind: InconsistencyKind::Outdated,
                        source: source.to_string(),
                        target: Some((*uid).to_string()),
                        details: format!(
                            "Contact \"{}\" has REV {} in {label} but {} in graph",
                            stored.fn_name,
                            file_rev.format(REV_DISPLAY_FORMAT),
                            graph_rev.format(REV_DISPLAY_FORMAT)
                        ),
                        severity: Severity::Warning,
                    });
                }
            }
        }

        if format == ContactFormat::Markdown {
            found.extend(check_front_matter(&folder.path));
        }

        tracing::debug!(folder = %folder.path.display(), format = format.name(), findings = found.len(), "folder checked");
        found
    }

    /// Check every folder and aggregate a report.
    #[must_use]
    pub fn check_all(&self, folders: &[FolderSpec]) -> ConsistencyReport {
        let mut report = ConsistencyReport::new(self.graph.len());
        for folder in folders {
            report.inconsistencies.extend(self.check(folder));
            if let Ok(files) = list_files(&folder.path, folder.format) {
                report.add_files(folder.format, files.len());
            }
        }
        tracing::info!(
            issues = report.inconsistencies.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "consistency check finished"
        );
        report
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn parse_failure(source: &str, failure: &PplError) -> Inconsistency {
    let (target, message) = match failure {
        PplError::Adapter { path, message } => (file_name(path), message.clone()),
        other => (String::new(), other.to_string()),
    };
    Inconsistency {
        kind: InconsistencyKind::Error,
        source: source.to_string(),
        details: format!("Failed to parse \"{target}\": {message}"),
        target: (!target.is_empty()).then_some(target),
        severity: Severity::Error,
    }
}

/// Per-file front matter checks for a Markdown folder.
fn check_front_matter(folder: &Path) -> Vec<Inconsistency> {
    let Ok(files) = list_files(folder, ContactFormat::Markdown) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for path in files {
        // unreadable files are already reported by the import
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let name = file_name(&path);
        let doc = MarkdownDocument::parse(&text);
        let details = if doc.front_matter.is_none() {
            format!("File \"{name}\" has no YAML front matter")
        } else if doc.has_wiki_links() && !doc.front_matter_has_related() {
            format!("File \"{name}\" has wiki-links in Related section but no RELATED in front matter")
        } else {
            continue;
        };
        found.push(Inconsistency {
            kind: InconsistencyKind::Inconsistent,
            source: MARKDOWN_FILE_SOURCE.to_string(),
            target: Some(name),
            details,
            severity: Severity::Info,
        });
    }
    found
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bulk_export;
    use crate::graph::ContactGraph;
    use crate::revision::parse_revision;
    use tempfile::TempDir;

    fn contact(name: &str, uid: &str, rev: &str) -> Contact {
        let mut c = Contact::new(name).expect("contact").with_uid(uid);
        c.rev = parse_revision(rev);
        c
    }

    fn graph_of(contacts: &[Contact]) -> ContactGraph {
        let mut graph = ContactGraph::new();
        for c in contacts {
            graph.add(c.clone()).expect("add");
        }
        graph
    }

    #[test]
    fn missing_folder_is_one_error() {
        let dir = TempDir::new().expect("tempdir");
        let graph = ContactGraph::new();
        let found = ConsistencyChecker::new(&graph)
            .check(&FolderSpec::new(ContactFormat::Vcard, dir.path().join("absent")));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, InconsistencyKind::Missing);
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[0].target, None);
        assert!(found[0].details.starts_with("VCF folder not found: "));
    }

    #[test]
    fn synced_folder_has_no_findings() {
        let dir = TempDir::new().expect("tempdir");
        let contacts = [contact("Alice", "a", "2024-01-01T00:00:00Z")];
        bulk_export(&contacts, dir.path(), ContactFormat::Yaml, false).expect("export");
        let graph = graph_of(&contacts);
        let found = ConsistencyChecker::new(&graph).check(&FolderSpec::new(ContactFormat::Yaml, dir.path()));
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn missing_orphaned_and_outdated() {
        let dir = TempDir::new().expect("tempdir");
        bulk_export(
            &[
                contact("Alice", "a", "2024-01-01T00:00:00Z"),
                contact("Carol", "c", "2024-01-01T00:00:00Z"),
            ],
            dir.path(),
            ContactFormat::Vcard,
            false,
        )
        .expect("export");
        let graph = graph_of(&[
            contact("Alice", "a", "2024-02-01T00:00:00Z"),
            contact("Bob", "b", "2024-01-01T00:00:00Z"),
        ]);

        let found = ConsistencyChecker::new(&graph).check(&FolderSpec::new(ContactFormat::Vcard, dir.path()));
        let kinds: Vec<_> = found.iter().map(|i| (i.kind, i.target.as_deref())).collect();
        assert_eq!(
            kinds,
            vec![
                (InconsistencyKind::Missing, Some("b")),
                (InconsistencyKind::Orphaned, Some("c")),
                (InconsistencyKind::Outdated, Some("a")),
            ]
        );
        assert_eq!(
            found[2].details,
            "Contact \"Alice\" has REV 2024-01-01 00:00:00 in VCF but 2024-02-01 00:00:00 in graph"
        );
        assert!(found.iter().all(|i| i.source == "vcf_folder"));
    }

    #[test]
    fn unparseable_file_is_an_error_finding() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("bad.yaml"), "- not\n- a contact\n").expect("write");
        let graph = ContactGraph::new();
        let found = ConsistencyChecker::new(&graph).check(&FolderSpec::new(ContactFormat::Yaml, dir.path()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, InconsistencyKind::Error);
        assert_eq!(found[0].target.as_deref(), Some("bad.yaml"));
        assert!(found[0].details.starts_with("Failed to parse \"bad.yaml\""));
    }

    #[test]
    fn markdown_front_matter_findings_are_info() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("Bare.md"), "# Bare\n").expect("write");
        std::fs::write(
            dir.path().join("Linked.md"),
            "---\nFN: Linked\n---\n# Linked\n\n## Related\n- friend [[Bare]]\n",
        )
        .expect("write");
        let graph = ContactGraph::new();
        let found = ConsistencyChecker::new(&graph)
            .check(&FolderSpec::new(ContactFormat::Markdown, dir.path()));
        let lint: Vec<_> = found
            .iter()
            .filter(|i| i.source == MARKDOWN_FILE_SOURCE)
            .collect();
        assert_eq!(lint.len(), 2);
        assert!(lint.iter().all(|i| i.severity == Severity::Info));
        assert_eq!(lint[0].details, "File \"Bare.md\" has no YAML front matter");
        assert_eq!(
            lint[1].details,
            "File \"Linked.md\" has wiki-links in Related section but no RELATED in front matter"
        );
    }

    #[test]
    fn check_all_counts_files_per_format() {
        let vcf = TempDir::new().expect("tempdir");
        let md = TempDir::new().expect("tempdir");
        let contacts = [contact("Alice", "a", "2024-01-01T00:00:00Z")];
        bulk_export(&contacts, vcf.path(), ContactFormat::Vcard, false).expect("export");
        bulk_export(&contacts, md.path(), ContactFormat::Markdown, false).expect("export");
        let graph = graph_of(&contacts);

        let report = ConsistencyChecker::new(&graph).check_all(&[
            FolderSpec::new(ContactFormat::Vcard, vcf.path()),
            FolderSpec::new(ContactFormat::Markdown, md.path()),
        ]);
        assert!(report.is_consistent(), "{:?}", report.inconsistencies);
        assert_eq!(report.total_contacts_graph, 1);
        assert_eq!(report.total_files_vcf, 1);
        assert_eq!(report.total_files_markdown, 1);
        assert_eq!(report.total_files_yaml, 0);
    }
}
