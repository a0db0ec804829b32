//! # ppl-core
//!
//! The contact graph engine for ppl.
//!
//! A contact is a vCard 4.0 entity identified by its UID. Contacts live in
//! a [`ContactGraph`] whose edges are typed relationships, and the same
//! contacts are mirrored as per-contact files (vCard, YAML, Markdown) in
//! user folders.
//!
//! ## Pieces
//!
//! - `contact` → model and lossless merge ([`Contact::merge_from`])
//! - `graph` → the [`GraphStore`] trait and its in-memory implementation
//! - `formats` → whole-graph persistence (GraphML, JSON graph)
//! - `adapters` → per-contact formats and folder bulk I/O
//! - `consistency` → drift detection between the graph and folders
//! - `pipeline` → curation stages applied on import/export
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network dependencies
//! - Deterministic: `BTreeMap` ordering everywhere output is produced
//! - Single writer: one caller owns the graph for one operation

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod consistency;
pub mod contact;
pub mod formats;
pub mod graph;
pub mod pipeline;
pub mod primitives;
pub mod relationship;
pub mod revision;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use contact::{Contact, Geo, ListProperty, MapProperty, Related, TextProperty, uid_to_uri};
pub use revision::{Revision, compare_revision, format_revision, parse_revision};
pub use types::PplError;

// =============================================================================
// RE-EXPORTS: Graph
// =============================================================================

pub use graph::{ContactGraph, GraphStore, MergeAction, MergeOutcome};
pub use relationship::{EdgeView, Relationship};

// =============================================================================
// RE-EXPORTS: Formats & Adapters
// =============================================================================

pub use adapters::{
    ContactFormat, ExportSummary, FolderImport, FormatAdapter, MarkdownAdapter, VcardAdapter,
    YamlAdapter, bulk_export, bulk_import, list_files, resolve_text_references,
};
pub use formats::{GraphFormat, load_graph, save_graph};

// =============================================================================
// RE-EXPORTS: Consistency & Pipeline
// =============================================================================

pub use consistency::{
    ConsistencyChecker, ConsistencyReport, FolderSpec, Inconsistency, InconsistencyKind,
    ReportFormat, Severity,
};
pub use pipeline::{Filter, FilterContext, FilterPipeline, PipelineMode};
