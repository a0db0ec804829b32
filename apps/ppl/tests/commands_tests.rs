//! Integration tests for the ppl commands.
//!
//! Drives the `cmd_*` functions against temporary folders and graph files.

#![allow(clippy::unwrap_used, clippy::panic)]

use ppl::cli::{
    GraphFile, Output, cmd_check, cmd_convert, cmd_export, cmd_import, cmd_list, cmd_search,
};
use ppl_core::{
    ContactFormat, ContactGraph, FolderSpec, GraphFormat, GraphStore, InconsistencyKind, PplError,
    ReportFormat,
};
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

const QUIET: Output = Output {
    json: false,
    verbose: false,
    quiet: true,
};

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).expect("write fixture");
}

/// A Markdown folder with Jane (married to Tom) and Tom, neither with a uid.
fn markdown_folder() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "Jane.md",
        "# Jane\n\nMet at the conference.\n\n## Related\n- husband [[Tom]]\n",
    );
    write(dir.path(), "Tom.md", "# Tom\n");
    dir
}

fn vcard_folder() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "alex.vcf",
        "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:alex\r\nFN:Alex Doe\r\nEMAIL:alex@acme.example\r\nORG:Acme\r\nREV:20240101T000000Z\r\nRELATED;TYPE=friend:urn:uuid:blair\r\nEND:VCARD\r\n",
    );
    write(
        dir.path(),
        "blair.vcf",
        "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:blair\r\nFN:Blair\r\nREV:20240101T000000Z\r\nEND:VCARD\r\n",
    );
    dir
}

fn load(graph: &GraphFile) -> ContactGraph {
    graph.load().expect("load graph")
}

// =============================================================================
// IMPORT
// =============================================================================

#[test]
fn import_creates_graph_and_links_wiki_references() {
    let src = markdown_folder();
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));

    let summary = cmd_import(&graph, src.path(), ContactFormat::Markdown, QUIET).expect("import");
    assert_eq!(summary.files, 2);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.edges, 1);

    let stored = load(&graph);
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.edge_count(), 1);
    let jane = stored
        .all_entities()
        .into_iter()
        .find(|c| c.fn_name == "Jane")
        .expect("jane");
    assert!(jane.uid().is_some_and(|uid| uid.starts_with("urn:uuid:")));
    assert_eq!(jane.gender.as_deref(), Some("M"));
    assert!(jane.related[0].uri().is_some());
}

#[test]
fn import_merges_into_existing_graph() {
    let src = vcard_folder();
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.graphml"));

    let first = cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).expect("import");
    assert_eq!((first.added, first.updated, first.skipped), (2, 0, 0));
    assert_eq!(first.edges, 1);

    // Equal revisions merge again; nothing is added
    let second = cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).expect("import");
    assert_eq!((second.added, second.updated, second.skipped), (0, 2, 0));
    assert_eq!(load(&graph).len(), 2);
}

#[test]
fn import_tolerates_broken_files() {
    let src = vcard_folder();
    write(src.path(), "broken.vcf", "BEGIN:VCARD\r\nVERSION:4.0\r\n");
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));

    let summary = cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).expect("import");
    assert_eq!(summary.files, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.added, 2);
}

#[test]
fn import_from_missing_folder_fails() {
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));
    let err = cmd_import(&graph, &work.path().join("nope"), ContactFormat::Yaml, QUIET)
        .expect_err("missing folder");
    assert!(matches!(err, PplError::FileNotFound(_)));
    assert!(!graph.path.exists());
}

#[test]
fn corrupt_graph_is_not_overwritten() {
    let src = vcard_folder();
    let work = TempDir::new().expect("tempdir");
    let path = work.path().join("contacts.json");
    std::fs::write(&path, "{ not json").expect("write");
    let graph = GraphFile::new(&path);

    assert!(cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).is_err());
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "{ not json");
}

// =============================================================================
// EXPORT
// =============================================================================

#[test]
fn export_skips_unchanged_files_unless_forced() {
    let src = vcard_folder();
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));
    cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).expect("import");

    let out = work.path().join("yaml");
    let first = cmd_export(&graph, &out, ContactFormat::Yaml, false, QUIET).expect("export");
    assert_eq!((first.written, first.skipped), (2, 0));
    assert!(out.join("Alex Doe.yaml").is_file());

    let again = cmd_export(&graph, &out, ContactFormat::Yaml, false, QUIET).expect("export");
    assert_eq!((again.written, again.skipped), (0, 2));

    let forced = cmd_export(&graph, &out, ContactFormat::Yaml, true, QUIET).expect("export");
    assert_eq!((forced.written, forced.skipped), (2, 0));
}

#[test]
fn export_projects_edges_into_related() {
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile {
        path: work.path().join("contacts.xml"),
        format: Some(GraphFormat::GraphMl),
    };
    let mut stored = ContactGraph::new();
    stored
        .add(ppl_core::Contact::new("Ann").expect("contact").with_uid("ann"))
        .expect("add");
    stored
        .add(ppl_core::Contact::new("Ben").expect("contact").with_uid("ben"))
        .expect("add");
    stored
        .add_edge(ppl_core::Relationship::new("ann", "ben", &["child"]))
        .expect("edge");
    graph.save(&stored).expect("save");

    let out = work.path().join("vcf");
    cmd_export(&graph, &out, ContactFormat::Vcard, false, QUIET).expect("export");
    let ann = std::fs::read_to_string(out.join("Ann.vcf")).expect("read");
    assert!(ann.contains("RELATED;TYPE=child:urn:uuid:ben"), "{ann}");
}

#[test]
fn export_requires_existing_graph() {
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("missing.json"));
    let err = cmd_export(&graph, work.path(), ContactFormat::Vcard, false, QUIET)
        .expect_err("no graph");
    assert!(matches!(err, PplError::FileNotFound(_)));
}

// =============================================================================
// LIST / SEARCH
// =============================================================================

#[test]
fn list_and_search_read_the_graph() {
    let src = vcard_folder();
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));
    cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).expect("import");

    assert_eq!(cmd_list(&graph, QUIET).expect("list"), 2);
    assert_eq!(cmd_search(&graph, "ACME", QUIET).expect("search"), vec!["alex"]);
    assert_eq!(cmd_search(&graph, "blair", QUIET).expect("search"), vec!["blair"]);
    assert!(cmd_search(&graph, "nobody", QUIET).expect("search").is_empty());
}

// =============================================================================
// CONVERT & CHECK
// =============================================================================

#[test]
fn convert_then_check_is_consistent() {
    let src = markdown_folder();
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));
    let out = work.path().join("vcf");

    let (imported, exported) = cmd_convert(
        &graph,
        src.path(),
        ContactFormat::Markdown,
        &out,
        ContactFormat::Vcard,
        QUIET,
    )
    .expect("convert");
    assert_eq!(imported.added, 2);
    assert_eq!(exported.written, 2);

    let report = cmd_check(
        &graph,
        &[FolderSpec::new(ContactFormat::Vcard, &out)],
        ReportFormat::Json,
    )
    .expect("check");
    assert!(report.is_consistent(), "{:?}", report.inconsistencies);
    assert_eq!(report.total_files_vcf, 2);
}

#[test]
fn check_reports_drift() {
    let src = vcard_folder();
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));
    cmd_import(&graph, src.path(), ContactFormat::Vcard, QUIET).expect("import");
    std::fs::remove_file(src.path().join("blair.vcf")).expect("remove");
    let markdown = TempDir::new().expect("tempdir");

    let report = cmd_check(
        &graph,
        &[
            FolderSpec::new(ContactFormat::Vcard, src.path()),
            FolderSpec::new(ContactFormat::Markdown, markdown.path()),
        ],
        ReportFormat::Text,
    )
    .expect("check");
    assert!(!report.is_consistent());
    let missing: Vec<_> = report
        .inconsistencies
        .iter()
        .filter(|i| i.kind == InconsistencyKind::Missing)
        .map(|i| (i.source.as_str(), i.target.as_deref()))
        .collect();
    assert!(missing.contains(&("vcf_folder", Some("blair"))));
    assert!(missing.contains(&("markdown_folder", Some("alex"))));
    assert_eq!(missing.len(), 3);
}

#[test]
fn check_without_folders_is_a_config_error() {
    let work = TempDir::new().expect("tempdir");
    let graph = GraphFile::new(work.path().join("contacts.json"));
    let err = cmd_check(&graph, &[], ReportFormat::Text).expect_err("no folders");
    assert!(matches!(err, PplError::ConfigError(_)));
}
