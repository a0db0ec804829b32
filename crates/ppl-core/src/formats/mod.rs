//! # Graph Formats
//!
//! Whole-graph serialization. Two codecs share one attribute model:
//!
//! - [`graphml`]: attributed XML graph (`.graphml`, the default)
//! - [`json_graph`]: graphology-style JSON (`.json`)
//!
//! `save_graph` / `load_graph` are the only functions here that touch the
//! file system; each writes or reads one whole file.

pub mod attributes;
pub mod graphml;
pub mod json_graph;

pub use graphml::{graph_from_graphml, graph_to_graphml};
pub use json_graph::{graph_from_json, graph_to_json};

use crate::graph::{ContactGraph, GraphStore};
use crate::primitives::MAX_GRAPH_FILE_SIZE;
use crate::types::{PplError, io_error};
use std::path::Path;

/// Serialization codec for a whole graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    GraphMl,
}

impl GraphFormat {
    /// Pick the codec from a file extension: `.json` is JSON, anything else GraphML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::GraphMl,
        }
    }

    /// Parse a user-supplied format name.
    pub fn from_name(name: &str) -> Result<Self, PplError> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "graphml" | "xml" => Ok(Self::GraphMl),
            other => Err(PplError::ConfigError(format!(
                "unknown graph format '{other}' (expected json or graphml)"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::GraphMl => "graphml",
        }
    }

    pub fn encode(self, graph: &ContactGraph) -> Result<String, PplError> {
        match self {
            Self::Json => graph_to_json(graph),
            Self::GraphMl => graph_to_graphml(graph),
        }
    }

    pub fn decode(self, text: &str) -> Result<ContactGraph, PplError> {
        match self {
            Self::Json => graph_from_json(text),
            Self::GraphMl => graph_from_graphml(text),
        }
    }
}

/// Write `graph` to `path`, creating parent directories as needed.
///
/// The codec is `format` when given, otherwise chosen by extension.
pub fn save_graph(
    graph: &ContactGraph,
    path: &Path,
    format: Option<GraphFormat>,
) -> Result<(), PplError> {
    let format = format.unwrap_or_else(|| GraphFormat::from_path(path));
    let text = format.encode(graph)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
    }
    std::fs::write(path, text).map_err(|e| io_error(path, &e))?;
    tracing::debug!(path = %path.display(), format = format.as_str(), contacts = graph.len(), "graph saved");
    Ok(())
}

/// Read a graph from `path`.
///
/// Returns `PplError::FileNotFound` if the file does not exist.
pub fn load_graph(path: &Path, format: Option<GraphFormat>) -> Result<ContactGraph, PplError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, &e))?;
    if metadata.len() > MAX_GRAPH_FILE_SIZE {
        return Err(PplError::DeserializationError(format!(
            "{} exceeds maximum graph size ({} bytes)",
            path.display(),
            MAX_GRAPH_FILE_SIZE
        )));
    }
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
    let format = format.unwrap_or_else(|| GraphFormat::from_path(path));
    format.decode(&text)
}

impl ContactGraph {
    /// Persist this graph. See [`save_graph`].
    pub fn save(&self, path: &Path, format: Option<GraphFormat>) -> Result<(), PplError> {
        save_graph(self, path, format)
    }

    /// Load a graph from disk. See [`load_graph`].
    pub fn load(path: &Path, format: Option<GraphFormat>) -> Result<Self, PplError> {
        load_graph(path, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;
    use tempfile::TempDir;

    #[test]
    fn format_follows_extension() {
        assert_eq!(GraphFormat::from_path(Path::new("a/b.json")), GraphFormat::Json);
        assert_eq!(GraphFormat::from_path(Path::new("a/b.JSON")), GraphFormat::Json);
        assert_eq!(GraphFormat::from_path(Path::new("a/b.graphml")), GraphFormat::GraphMl);
        assert_eq!(GraphFormat::from_path(Path::new("graph")), GraphFormat::GraphMl);
    }

    #[test]
    fn format_names_parse() {
        assert_eq!(GraphFormat::from_name("JSON").expect("json"), GraphFormat::Json);
        assert!(GraphFormat::from_name("csv").is_err());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/deeper/graph.json");
        let mut graph = ContactGraph::new();
        graph
            .add(Contact::new("Alice").expect("contact").with_uid("a"))
            .expect("add");
        save_graph(&graph, &path, None).expect("save");
        let loaded = load_graph(&path, None).expect("load");
        assert_eq!(loaded.get("a").expect("alice").fn_name, "Alice");
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("graph.data");
        let graph = ContactGraph::new();
        save_graph(&graph, &path, Some(GraphFormat::Json)).expect("save");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.trim_start().starts_with('{'));
        assert!(load_graph(&path, Some(GraphFormat::Json)).is_ok());
    }

    #[test]
    fn loading_missing_file_is_file_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_graph(&dir.path().join("nope.graphml"), None).expect_err("missing");
        assert!(matches!(err, PplError::FileNotFound(_)));
    }
}
