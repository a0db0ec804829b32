//! CLI command implementations.
//!
//! Each `cmd_*` function loads the graph it needs, does its work through
//! ppl-core, prints a human or JSON summary, and returns the summary so
//! callers (and tests) can inspect it.

use ppl_core::{
    ConsistencyChecker, ConsistencyReport, Contact, ContactFormat, ContactGraph, ExportSummary,
    FilterContext, FilterPipeline, FolderSpec, GraphFormat, GraphStore, MergeAction, PipelineMode,
    PplError, ReportFormat, bulk_export, bulk_import, resolve_text_references,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// SHARED STATE
// =============================================================================

/// How results are printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Output {
    fn print_json<T: Serialize>(value: &T) -> Result<(), PplError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| PplError::SerializationError(e.to_string()))?;
        println!("{text}");
        Ok(())
    }
}

/// The graph file a command works on.
#[derive(Debug, Clone)]
pub struct GraphFile {
    pub path: PathBuf,
    /// Codec override; `None` picks by extension.
    pub format: Option<GraphFormat>,
}

impl GraphFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Load an existing graph. A missing file is an error.
    pub fn load(&self) -> Result<ContactGraph, PplError> {
        ContactGraph::load(&self.path, self.format)
    }

    /// Load the graph, or start an empty one if the file does not exist yet.
    ///
    /// A file that exists but cannot be read is still an error, so a later
    /// save never replaces data that failed to load.
    pub fn load_or_create(&self) -> Result<ContactGraph, PplError> {
        if self.path.exists() {
            return self.load();
        }
        tracing::info!(path = %self.path.display(), "graph file not found, starting empty graph");
        Ok(ContactGraph::new())
    }

    pub fn save(&self, graph: &ContactGraph) -> Result<(), PplError> {
        graph.save(&self.path, self.format)
    }
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Counts from merging a folder into the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub files: usize,
    pub failed: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub edges: usize,
}

/// Import a folder into `graph`: parse, curate, merge, then link references.
fn merge_folder(
    graph: &mut ContactGraph,
    folder: &Path,
    format: ContactFormat,
) -> Result<ImportSummary, PplError> {
    let import = bulk_import(folder, format)?;
    let mut summary = ImportSummary {
        files: import.files,
        failed: import.failures.len(),
        ..ImportSummary::default()
    };

    let context = FilterContext::new(PipelineMode::Import);
    let mut contacts = FilterPipeline::standard(PipelineMode::Import).run_batch(import.contacts, &context);
    // uids assigned by the pipeline make more wiki links resolvable
    resolve_text_references(&mut contacts);

    for contact in contacts {
        match graph.merge(contact)?.action {
            MergeAction::Added => summary.added += 1,
            MergeAction::Updated => summary.updated += 1,
            MergeAction::Skipped => summary.skipped += 1,
        }
    }
    summary.edges = graph.resolve_related();
    Ok(summary)
}

/// Import a folder of contact files into the graph file.
pub fn cmd_import(
    graph_file: &GraphFile,
    folder: &Path,
    format: ContactFormat,
    output: Output,
) -> Result<ImportSummary, PplError> {
    tracing::info!("Importing {} files from {:?}", format, folder);

    let mut graph = graph_file.load_or_create()?;
    let summary = merge_folder(&mut graph, folder, format)?;
    graph_file.save(&graph)?;

    if output.json {
        Output::print_json(&serde_json::json!({
            "graph": graph_file.path.to_string_lossy(),
            "format": format.name(),
            "summary": summary,
            "total_contacts": graph.len(),
        }))?;
    } else if !output.quiet {
        println!(
            "Imported {} contacts to {} (added: {}, updated: {}, skipped: {})",
            summary.added + summary.updated + summary.skipped,
            graph_file.path.display(),
            summary.added,
            summary.updated,
            summary.skipped
        );
        if summary.failed > 0 {
            println!("{} of {} files could not be read", summary.failed, summary.files);
        }
        if output.verbose {
            println!("Edges linked:   {}", summary.edges);
            println!("Total contacts: {}", graph.len());
        }
    }

    Ok(summary)
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// The graph's contacts as they should be written to files.
///
/// Edges are projected back into each contact's `RELATED` list and the
/// export pipeline runs over the result.
fn contacts_for_export(mut graph: ContactGraph) -> Vec<Contact> {
    let projected = graph.project_related();
    tracing::debug!(projected, "edges projected into RELATED");
    let contacts = graph.all_entities().into_iter().cloned().collect();
    FilterPipeline::standard(PipelineMode::Export)
        .run_batch(contacts, &FilterContext::new(PipelineMode::Export))
}

fn print_export(
    summary: ExportSummary,
    folder: &Path,
    format: ContactFormat,
    output: Output,
) -> Result<(), PplError> {
    if output.json {
        Output::print_json(&serde_json::json!({
            "folder": folder.to_string_lossy(),
            "format": format.name(),
            "written": summary.written,
            "skipped": summary.skipped,
        }))?;
    } else if !output.quiet {
        println!(
            "Exported to {} (written: {}, skipped: {})",
            folder.display(),
            summary.written,
            summary.skipped
        );
    }
    Ok(())
}

/// Write every graph contact to `folder`.
pub fn cmd_export(
    graph_file: &GraphFile,
    folder: &Path,
    format: ContactFormat,
    force: bool,
    output: Output,
) -> Result<ExportSummary, PplError> {
    let graph = graph_file.load()?;
    if output.verbose {
        println!(
            "Exporting {} contacts to {} in {} format...",
            graph.len(),
            folder.display(),
            format
        );
        if force {
            println!("Force mode enabled - all files will be written");
        }
    }

    let contacts = contacts_for_export(graph);
    let summary = bulk_export(&contacts, folder, format, force)?;
    print_export(summary, folder, format, output)?;
    Ok(summary)
}

// =============================================================================
// LIST & SEARCH COMMANDS
// =============================================================================

fn contact_json(contact: &Contact) -> serde_json::Value {
    serde_json::json!({
        "uid": contact.uid(),
        "fn": contact.fn_name,
        "email": contact.email,
        "tel": contact.tel,
        "org": contact.org,
        "related": contact.related.len(),
    })
}

fn print_contact(contact: &Contact, full: bool) {
    println!("  {}", contact.fn_name);
    if full && let Some(uid) = contact.uid() {
        println!("    UID: {uid}");
    }
    if !contact.email.is_empty() {
        println!("    Email: {}", contact.email.join(", "));
    }
    if full && !contact.tel.is_empty() {
        println!("    Phone: {}", contact.tel.join(", "));
    }
    if !contact.org.is_empty() {
        println!("    Org: {}", contact.org.join(", "));
    }
    if full && !contact.related.is_empty() {
        println!("    Relationships: {}", contact.related.len());
    }
    println!();
}

/// List every contact in the graph. Returns the number listed.
pub fn cmd_list(graph_file: &GraphFile, output: Output) -> Result<usize, PplError> {
    let graph = graph_file.load()?;
    let contacts = graph.all_entities();

    if output.json {
        let items: Vec<_> = contacts.iter().map(|c| contact_json(c)).collect();
        Output::print_json(&items)?;
    } else if contacts.is_empty() {
        println!("No contacts found");
    } else {
        println!("Found {} contacts:\n", contacts.len());
        for contact in &contacts {
            print_contact(contact, true);
        }
    }

    Ok(contacts.len())
}

/// Case-insensitive search over name, nickname, email and organization.
///
/// Returns the uids of the matches.
pub fn cmd_search(
    graph_file: &GraphFile,
    query: &str,
    output: Output,
) -> Result<Vec<String>, PplError> {
    let graph = graph_file.load()?;
    let matches = graph.search(query);

    if output.json {
        let items: Vec<_> = matches.iter().map(|c| contact_json(c)).collect();
        Output::print_json(&serde_json::json!({
            "query": query,
            "matches": items,
        }))?;
    } else if matches.is_empty() {
        println!("No contacts found matching '{query}'");
    } else {
        println!("Found {} contact(s) matching '{}':\n", matches.len(), query);
        for contact in &matches {
            print_contact(contact, false);
        }
    }

    Ok(matches
        .iter()
        .filter_map(|c| c.uid().map(str::to_string))
        .collect())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Import `source` into the graph file, then export the whole graph to `target`.
pub fn cmd_convert(
    graph_file: &GraphFile,
    source: &Path,
    source_format: ContactFormat,
    target: &Path,
    target_format: ContactFormat,
    output: Output,
) -> Result<(ImportSummary, ExportSummary), PplError> {
    tracing::info!("Converting {} to {}", source_format, target_format);

    let mut graph = graph_file.load_or_create()?;
    let imported = merge_folder(&mut graph, source, source_format)?;
    graph_file.save(&graph)?;
    if output.verbose {
        println!("Graph saved to {}", graph_file.path.display());
        println!(
            "Added: {}, Updated: {}, Skipped: {}",
            imported.added, imported.updated, imported.skipped
        );
    }

    let total = graph.len();
    let contacts = contacts_for_export(graph);
    let exported = bulk_export(&contacts, target, target_format, false)?;

    if output.json {
        Output::print_json(&serde_json::json!({
            "source_format": source_format.name(),
            "target_format": target_format.name(),
            "import": imported,
            "written": exported.written,
            "skipped": exported.skipped,
        }))?;
    } else if !output.quiet {
        println!("Converted {total} contacts from {source_format} to {target_format}");
        println!(
            "Export: Written: {}, Skipped: {}",
            exported.written, exported.skipped
        );
    }

    Ok((imported, exported))
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Check the graph against `folders` and print the report.
pub fn cmd_check(
    graph_file: &GraphFile,
    folders: &[FolderSpec],
    format: ReportFormat,
) -> Result<ConsistencyReport, PplError> {
    if folders.is_empty() {
        return Err(PplError::ConfigError(
            "no folders to check (pass --vcard, --markdown or --yaml, or set [folders] in ppl.toml)"
                .to_string(),
        ));
    }

    let graph = graph_file.load()?;
    let report = ConsistencyChecker::new(&graph).check_all(folders);
    println!("{}", report.render(format)?);

    if !report.is_consistent() {
        tracing::warn!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "graph and folders are inconsistent"
        );
    }
    Ok(report)
}
