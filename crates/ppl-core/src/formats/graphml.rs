//! # GraphML Format
//!
//! Attributed XML graph serialization, readable by NetworkX and Gephi.
//!
//! Every node and edge attribute is declared once as a `<key>` and stored as
//! a string `<data>` element. Contact text fields are written raw; lists,
//! maps, `GEO` and `RELATED` are JSON text. Edges carry `types`,
//! `directional` and `metadata`, all JSON text.

use super::attributes::{ContactBuilder, contact_to_fields};
use crate::graph::{ContactGraph, GraphStore};
use crate::relationship::Relationship;
use crate::types::PplError;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const EDGE_ATTRIBUTES: [&str; 3] = ["types", "directional", "metadata"];

// =============================================================================
// WRITER
// =============================================================================

/// Serialize a graph to GraphML text.
pub fn graph_to_graphml(graph: &ContactGraph) -> Result<String, PplError> {
    // Encode every node first so the key table lists only names in use.
    let mut nodes = Vec::with_capacity(graph.len());
    let mut node_keys: Vec<&'static str> = Vec::new();
    for contact in graph.all_entities() {
        let uid = contact.require_uid("be saved")?.to_string();
        let mut data = Vec::new();
        for (name, value) in contact_to_fields(contact) {
            if !node_keys.contains(&name) {
                node_keys.push(name);
            }
            data.push((name, value.to_attribute_string()?));
        }
        nodes.push((uid, data));
    }
    let key_id: BTreeMap<&str, String> = node_keys
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, format!("d{i}")))
        .collect();
    let edge_key_id: BTreeMap<&str, String> = EDGE_ATTRIBUTES
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, format!("d{}", node_keys.len() + i)))
        .collect();

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_write)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("graphml").with_attributes([("xmlns", GRAPHML_NS)]),
        ))
        .map_err(xml_write)?;

    for name in &node_keys {
        write_key(&mut writer, &key_id[name], "node", name)?;
    }
    for name in EDGE_ATTRIBUTES {
        write_key(&mut writer, &edge_key_id[name], "edge", name)?;
    }

    let mut graph_start = BytesStart::new("graph");
    graph_start.push_attribute(("edgedefault", "directed"));
    if let Some(name) = graph.name() {
        graph_start.push_attribute(("id", name));
    }
    writer.write_event(Event::Start(graph_start)).map_err(xml_write)?;

    for (uid, data) in &nodes {
        writer
            .write_event(Event::Start(
                BytesStart::new("node").with_attributes([("id", uid.as_str())]),
            ))
            .map_err(xml_write)?;
        for (name, raw) in data {
            write_data(&mut writer, &key_id[name], raw)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("node")))
            .map_err(xml_write)?;
    }

    for view in graph.all_edges() {
        let r = view.relationship;
        writer
            .write_event(Event::Start(BytesStart::new("edge").with_attributes([
                ("source", r.source_id.as_str()),
                ("target", r.target_id.as_str()),
            ])))
            .map_err(xml_write)?;
        let encoded = [
            serde_json::to_string(&r.types),
            serde_json::to_string(&r.directional),
            serde_json::to_string(&r.metadata),
        ];
        for (name, raw) in EDGE_ATTRIBUTES.iter().zip(encoded) {
            let raw = raw.map_err(|e| PplError::SerializationError(e.to_string()))?;
            write_data(&mut writer, &edge_key_id[name], &raw)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("edge")))
            .map_err(xml_write)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("graph")))
        .map_err(xml_write)?;
    writer
        .write_event(Event::End(BytesEnd::new("graphml")))
        .map_err(xml_write)?;

    String::from_utf8(writer.into_inner()).map_err(|e| PplError::SerializationError(e.to_string()))
}

fn write_key(
    writer: &mut Writer<Vec<u8>>,
    id: &str,
    domain: &str,
    name: &str,
) -> Result<(), PplError> {
    writer
        .write_event(Event::Empty(BytesStart::new("key").with_attributes([
            ("id", id),
            ("for", domain),
            ("attr.name", name),
            ("attr.type", "string"),
        ])))
        .map_err(xml_write)
}

fn write_data(writer: &mut Writer<Vec<u8>>, key: &str, raw: &str) -> Result<(), PplError> {
    writer
        .write_event(Event::Start(
            BytesStart::new("data").with_attributes([("key", key)]),
        ))
        .map_err(xml_write)?;
    writer
        .write_event(Event::Text(BytesText::new(raw)))
        .map_err(xml_write)?;
    writer
        .write_event(Event::End(BytesEnd::new("data")))
        .map_err(xml_write)
}

fn xml_write(err: quick_xml::Error) -> PplError {
    PplError::SerializationError(format!("GraphML write failed: {err}"))
}

fn xml_read(err: impl std::fmt::Display) -> PplError {
    PplError::DeserializationError(format!("GraphML parse failed: {err}"))
}

// =============================================================================
// READER
// =============================================================================

/// Element currently receiving `<data>` children.
enum Owner {
    None,
    Node(ContactBuilder),
    Edge(EdgeDraft),
}

struct EdgeDraft {
    source: String,
    target: String,
    data: BTreeMap<String, String>,
}

/// Parse GraphML text into a graph.
///
/// Undecodable node attributes are degraded (see [`ContactBuilder`]).
/// Edges whose endpoints are missing or whose attributes do not decode are
/// skipped with a warning.
pub fn graph_from_graphml(text: &str) -> Result<ContactGraph, PplError> {
    let mut reader = Reader::from_str(text);
    let mut graph = ContactGraph::new();
    let mut keys: BTreeMap<String, String> = BTreeMap::new();
    let mut edges: Vec<EdgeDraft> = Vec::new();
    let mut owner = Owner::None;
    // key id of the open <data> element and its accumulated text
    let mut data: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(xml_read)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"key" => {
                let attrs = attributes(&e)?;
                if let (Some(id), Some(name)) = (attrs.get("id"), attrs.get("attr.name")) {
                    keys.insert(id.clone(), name.clone());
                }
            }
            Event::Start(e) if e.name().as_ref() == b"graph" => {
                if let Some(id) = attributes(&e)?.remove("id") {
                    graph.set_name(id);
                }
            }
            Event::Start(e) if e.name().as_ref() == b"node" => {
                let id = attributes(&e)?
                    .remove("id")
                    .ok_or_else(|| xml_read("node without id"))?;
                owner = Owner::Node(ContactBuilder::for_node(id)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"node" => {
                let id = attributes(&e)?
                    .remove("id")
                    .ok_or_else(|| xml_read("node without id"))?;
                graph.add(ContactBuilder::for_node(id)?.finish()?)?;
            }
            Event::Start(e) if e.name().as_ref() == b"edge" => {
                owner = Owner::Edge(edge_draft(&e)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"edge" => {
                edges.push(edge_draft(&e)?);
            }
            Event::Start(e) if e.name().as_ref() == b"data" => {
                let key = attributes(&e)?.remove("key").unwrap_or_default();
                data = Some((key, String::new()));
            }
            Event::Empty(e) if e.name().as_ref() == b"data" => {
                let key = attributes(&e)?.remove("key").unwrap_or_default();
                apply_data(&mut owner, &keys, &key, "");
            }
            Event::Text(t) => {
                if let Some((_, buf)) = data.as_mut() {
                    buf.push_str(&t.unescape().map_err(xml_read)?);
                }
            }
            Event::CData(t) => {
                if let Some((_, buf)) = data.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"data" => {
                    if let Some((key, raw)) = data.take() {
                        apply_data(&mut owner, &keys, &key, &raw);
                    }
                }
                b"node" => {
                    if let Owner::Node(builder) = std::mem::replace(&mut owner, Owner::None) {
                        graph.add(builder.finish()?)?;
                    }
                }
                b"edge" => {
                    if let Owner::Edge(draft) = std::mem::replace(&mut owner, Owner::None) {
                        edges.push(draft);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    for draft in edges {
        match edge_from_draft(draft) {
            Ok(relationship) => {
                if let Err(err) = graph.add_edge(relationship) {
                    tracing::warn!(error = %err, "skipping edge");
                }
            }
            Err(err) => tracing::warn!(error = %err, "skipping undecodable edge"),
        }
    }
    Ok(graph)
}

fn edge_draft(e: &BytesStart<'_>) -> Result<EdgeDraft, PplError> {
    let mut attrs = attributes(e)?;
    match (attrs.remove("source"), attrs.remove("target")) {
        (Some(source), Some(target)) => Ok(EdgeDraft {
            source,
            target,
            data: BTreeMap::new(),
        }),
        _ => Err(xml_read("edge without source or target")),
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<BTreeMap<String, String>, PplError> {
    let mut out = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_read)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_read)?.into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn apply_data(owner: &mut Owner, keys: &BTreeMap<String, String>, key: &str, raw: &str) {
    // undeclared keys keep their id as attribute name
    let name = keys.get(key).map_or(key, String::as_str);
    match owner {
        Owner::Node(builder) => builder.apply_attribute_string(name, raw),
        Owner::Edge(draft) => {
            draft.data.insert(name.to_string(), raw.to_string());
        }
        Owner::None => {}
    }
}

fn edge_from_draft(draft: EdgeDraft) -> Result<Relationship, PplError> {
    let field = |name: &str| -> Result<Option<JsonValue>, PplError> {
        draft
            .data
            .get(name)
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| PplError::Decode {
                    attribute: name.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    };
    fn decode<T: DeserializeOwned>(name: &str, value: JsonValue) -> Result<T, PplError> {
        serde_json::from_value(value).map_err(|e| PplError::Decode {
            attribute: name.to_string(),
            message: e.to_string(),
        })
    }

    let types: Vec<String> = match field("types")? {
        Some(v) => decode("types", v)?,
        None => Vec::new(),
    };
    let directional: bool = match field("directional")? {
        Some(v) => decode("directional", v)?,
        None => true,
    };
    let metadata: BTreeMap<String, JsonValue> = match field("metadata")? {
        Some(v) => decode("metadata", v)?,
        None => BTreeMap::new(),
    };
    Ok(Relationship {
        source_id: draft.source,
        target_id: draft.target,
        types,
        directional,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;

    fn two_people() -> ContactGraph {
        let mut graph = ContactGraph::new();
        let mut alice = Contact::new("Alice & Co <ltd>").expect("contact").with_uid("a");
        alice.note = Some("  padded\nmultiline  ".into());
        alice.email.push("a@x".into());
        graph.add(alice).expect("add");
        graph
            .add(Contact::new("Bob").expect("contact").with_uid("b"))
            .expect("add");
        graph
            .add_edge(Relationship::new("a", "b", &["parent"]))
            .expect("edge");
        graph
    }

    #[test]
    fn writes_keys_nodes_and_edges() {
        let xml = graph_to_graphml(&two_people()).expect("encode");
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"attr.name="FN""#));
        assert!(xml.contains(r#"for="edge" attr.name="types""#));
        assert!(xml.contains(r#"<node id="a">"#));
        assert!(xml.contains(r#"<edge source="a" target="b">"#));
        assert!(xml.contains("Alice &amp; Co &lt;ltd&gt;"));
        // lists are JSON text
        assert!(xml.contains("[&quot;a@x&quot;]"));
    }

    #[test]
    fn text_survives_escaping_and_whitespace() {
        let graph = graph_from_graphml(&graph_to_graphml(&two_people()).expect("encode"))
            .expect("decode");
        let alice = graph.get("a").expect("alice");
        assert_eq!(alice.fn_name, "Alice & Co <ltd>");
        assert_eq!(alice.note.as_deref(), Some("  padded\nmultiline  "));
        assert_eq!(alice.email, vec!["a@x"]);
        let edges = graph.edges_from("a");
        assert_eq!(edges.len(), 1);
        assert!(edges[0].relationship.directional);
    }

    #[test]
    fn reads_foreign_graphml() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="FN" attr.type="string"/>
  <key id="d1" for="node" attr.name="EMAIL" attr.type="string"/>
  <key id="d2" for="node" attr.name="label" attr.type="string"/>
  <graph edgedefault="directed">
    <node id="n1"><data key="d0">Jane</data><data key="d1">jane@x.org</data><data key="d2">JD</data></node>
    <node id="n2"/>
    <edge source="n1" target="n2"/>
    <edge source="n1" target="missing"/>
  </graph>
</graphml>"#;
        let graph = graph_from_graphml(xml).expect("decode");
        let jane = graph.get("n1").expect("jane");
        assert_eq!(jane.email, vec!["jane@x.org"]);
        assert_eq!(jane.x_properties["label"], "JD");
        assert_eq!(graph.get("n2").expect("n2").fn_name, "n2");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn edge_attributes_decode_to_their_own_types() {
        let xml = r#"<graphml>
  <key id="e0" for="edge" attr.name="types"/>
  <key id="e1" for="edge" attr.name="directional"/>
  <key id="e2" for="edge" attr.name="metadata"/>
  <graph edgedefault="directed">
    <node id="a"/><node id="b"/>
    <edge source="a" target="b">
      <data key="e0">["friend"]</data>
      <data key="e1">false</data>
      <data key="e2">{"since":"2001"}</data>
    </edge>
  </graph>
</graphml>"#;
        let graph = graph_from_graphml(xml).expect("decode");
        let edges = graph.edges_from("a");
        assert_eq!(edges.len(), 1);
        let r = edges[0].relationship;
        assert_eq!(r.types, vec!["friend"]);
        assert!(!r.directional);
        assert_eq!(r.metadata["since"], "2001");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(graph_from_graphml("<graphml><graph><node id=\"a\"></graph>").is_err());
    }
}
