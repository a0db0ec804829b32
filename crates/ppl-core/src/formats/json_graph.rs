//! # JSON Graph Format
//!
//! graphology-style serialization:
//!
//! ```json
//! {
//!   "attributes": { "name": "ppl" },
//!   "options": { "allowSelfLoops": true, "multi": false, "type": "directed" },
//!   "nodes": [ { "key": "<uid>", "attributes": { "FN": "...", "EMAIL": [...] } } ],
//!   "edges": [ { "key": "a->b", "source": "a", "target": "b",
//!                "attributes": { "types": [...], "directional": true, "metadata": {} } } ]
//! }
//! ```
//!
//! Node attribute values are native JSON; see [`super::attributes`].

use super::attributes::{ContactBuilder, contact_to_fields};
use crate::graph::{ContactGraph, GraphStore};
use crate::primitives::DEFAULT_GRAPH_NAME;
use crate::relationship::Relationship;
use crate::types::PplError;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

// =============================================================================
// DOCUMENT MODEL
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct JsonGraphDocument {
    #[serde(default)]
    attributes: GraphAttributes,
    #[serde(default)]
    options: GraphOptions,
    #[serde(default)]
    nodes: Vec<JsonNode>,
    #[serde(default)]
    edges: Vec<JsonEdge>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphOptions {
    allow_self_loops: bool,
    multi: bool,
    #[serde(rename = "type")]
    kind: String,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            allow_self_loops: true,
            multi: false,
            kind: "directed".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonNode {
    key: String,
    #[serde(default)]
    attributes: JsonMap<String, JsonValue>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    source: String,
    target: String,
    #[serde(default)]
    attributes: EdgeAttributes,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeAttributes {
    #[serde(default)]
    types: Vec<String>,
    #[serde(default = "default_directional")]
    directional: bool,
    #[serde(default)]
    metadata: BTreeMap<String, JsonValue>,
}

impl Default for EdgeAttributes {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            directional: default_directional(),
            metadata: BTreeMap::new(),
        }
    }
}

fn default_directional() -> bool {
    true
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Serialize a graph to pretty-printed JSON.
pub fn graph_to_json(graph: &ContactGraph) -> Result<String, PplError> {
    let mut nodes = Vec::with_capacity(graph.len());
    for contact in graph.all_entities() {
        let key = contact.require_uid("be saved")?.to_string();
        let mut attributes = JsonMap::new();
        for (name, value) in contact_to_fields(contact) {
            attributes.insert(name.to_string(), value.to_json()?);
        }
        nodes.push(JsonNode { key, attributes });
    }

    let edges = graph
        .all_edges()
        .into_iter()
        .map(|view| {
            let r = view.relationship;
            JsonEdge {
                key: Some(format!("{}->{}", r.source_id, r.target_id)),
                source: r.source_id.clone(),
                target: r.target_id.clone(),
                attributes: EdgeAttributes {
                    types: r.types.clone(),
                    directional: r.directional,
                    metadata: r.metadata.clone(),
                },
            }
        })
        .collect();

    let document = JsonGraphDocument {
        attributes: GraphAttributes {
            name: Some(graph.name().unwrap_or(DEFAULT_GRAPH_NAME).to_string()),
        },
        options: GraphOptions::default(),
        nodes,
        edges,
    };
    serde_json::to_string_pretty(&document).map_err(|e| PplError::SerializationError(e.to_string()))
}

/// Parse a JSON graph document.
///
/// Undecodable node attributes are degraded (see [`ContactBuilder`]).
/// Edges whose endpoints are missing are skipped with a warning.
pub fn graph_from_json(text: &str) -> Result<ContactGraph, PplError> {
    let document: JsonGraphDocument =
        serde_json::from_str(text).map_err(|e| PplError::DeserializationError(e.to_string()))?;

    let mut graph = ContactGraph::new();
    if let Some(name) = document.attributes.name {
        graph.set_name(name);
    }

    for node in document.nodes {
        let mut builder = ContactBuilder::for_node(node.key)?;
        for (name, value) in node.attributes {
            builder.apply_json(&name, value);
        }
        graph.add(builder.finish()?)?;
    }

    for edge in document.edges {
        let relationship = Relationship {
            source_id: edge.source,
            target_id: edge.target,
            types: edge.attributes.types,
            directional: edge.attributes.directional,
            metadata: edge.attributes.metadata,
        };
        if let Err(err) = graph.add_edge(relationship) {
            tracing::warn!(error = %err, "skipping edge");
        }
    }
    Ok(graph)
}
