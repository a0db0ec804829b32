//! # Node Attributes
//!
//! Flattening of a contact into named attributes, shared by both graph codecs.
//!
//! Each attribute is keyed by its vCard property name and carries a
//! [`FieldValue`]. GraphML stores every value as a string (text fields raw,
//! everything else JSON-encoded); the JSON graph format stores native JSON.
//!
//! Decoding is tolerant: a value that fails to decode is logged and kept in
//! degraded form instead of aborting the load.

use crate::contact::{Contact, Geo, ListProperty, MapProperty, Related, TextProperty};
use crate::revision::{Revision, format_revision, parse_revision};
use crate::types::PplError;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

// =============================================================================
// PROPERTY KINDS
// =============================================================================

/// Shape of a node attribute, decided by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Fn,
    Version,
    Uid,
    Rev,
    Text(TextProperty),
    Geo,
    List(ListProperty),
    Related,
    Map(MapProperty),
    Unknown,
}

impl AttributeKind {
    #[must_use]
    pub fn of(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "FN" => Self::Fn,
            "VERSION" => Self::Version,
            "UID" => Self::Uid,
            "REV" => Self::Rev,
            "GEO" => Self::Geo,
            "RELATED" => Self::Related,
            other => TextProperty::from_name(other)
                .map(Self::Text)
                .or_else(|| ListProperty::from_name(other).map(Self::List))
                .or_else(|| MapProperty::from_name(other).map(Self::Map))
                .unwrap_or(Self::Unknown),
        }
    }

    /// Whether GraphML stores this attribute as raw text.
    #[must_use]
    pub const fn is_raw_text(self) -> bool {
        matches!(
            self,
            Self::Fn | Self::Version | Self::Uid | Self::Rev | Self::Text(_) | Self::Unknown
        )
    }
}

// =============================================================================
// FIELD VALUES
// =============================================================================

/// A decoded attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Rev(Revision),
    Geo(Geo),
    List(Vec<String>),
    Related(Vec<Related>),
    Map(BTreeMap<String, JsonValue>),
}

impl FieldValue {
    /// Native JSON form (JSON graph codec).
    pub fn to_json(&self) -> Result<JsonValue, PplError> {
        let value = match self {
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Rev(r) => JsonValue::String(format_revision(r)),
            Self::Geo(g) => serde_json::to_value(g).map_err(ser)?,
            Self::List(l) => serde_json::to_value(l).map_err(ser)?,
            Self::Related(r) => serde_json::to_value(r).map_err(ser)?,
            Self::Map(m) => serde_json::to_value(m).map_err(ser)?,
        };
        Ok(value)
    }

    /// String form (GraphML codec): text raw, everything else JSON text.
    pub fn to_attribute_string(&self) -> Result<String, PplError> {
        match self {
            Self::Text(s) => Ok(s.clone()),
            Self::Rev(r) => Ok(format_revision(r)),
            other => serde_json::to_string(&other.to_json()?).map_err(ser),
        }
    }

    /// Decode a GraphML attribute string.
    pub fn from_attribute_string(kind: AttributeKind, name: &str, raw: &str) -> Result<Self, PplError> {
        if kind.is_raw_text() {
            return Self::from_json(kind, name, JsonValue::String(raw.to_string()));
        }
        let json: JsonValue = serde_json::from_str(raw).map_err(|e| decode(name, e))?;
        Self::from_json(kind, name, json)
    }

    /// Decode a native JSON attribute value.
    pub fn from_json(kind: AttributeKind, name: &str, value: JsonValue) -> Result<Self, PplError> {
        match kind {
            AttributeKind::Fn
            | AttributeKind::Version
            | AttributeKind::Uid
            | AttributeKind::Text(_)
            | AttributeKind::Unknown => match value {
                JsonValue::String(s) => Ok(Self::Text(s)),
                JsonValue::Null => Err(decode(name, "null value")),
                other => Ok(Self::Text(other.to_string())),
            },
            AttributeKind::Rev => value
                .as_str()
                .and_then(parse_revision)
                .map(Self::Rev)
                .ok_or_else(|| decode(name, format!("not a timestamp: {value}"))),
            AttributeKind::Geo => serde_json::from_value(value)
                .map(Self::Geo)
                .map_err(|e| decode(name, e)),
            AttributeKind::List(_) => match value {
                // a lone scalar is a one-element list
                JsonValue::String(s) => Ok(Self::List(vec![s])),
                JsonValue::Number(n) => Ok(Self::List(vec![n.to_string()])),
                JsonValue::Bool(b) => Ok(Self::List(vec![b.to_string()])),
                JsonValue::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        JsonValue::String(s) => Ok(s),
                        JsonValue::Number(n) => Ok(n.to_string()),
                        JsonValue::Bool(b) => Ok(b.to_string()),
                        other => Err(decode(name, format!("unexpected list element {other}"))),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::List),
                other => Err(decode(name, format!("expected a list, got {other}"))),
            },
            AttributeKind::Related => serde_json::from_value(value)
                .map(Self::Related)
                .map_err(|e| decode(name, e)),
            AttributeKind::Map(_) => serde_json::from_value(value)
                .map(Self::Map)
                .map_err(|e| decode(name, e)),
        }
    }
}

fn ser(err: serde_json::Error) -> PplError {
    PplError::SerializationError(err.to_string())
}

fn decode(name: &str, err: impl std::fmt::Display) -> PplError {
    PplError::Decode {
        attribute: name.to_string(),
        message: err.to_string(),
    }
}

// =============================================================================
// CONTACT <-> ATTRIBUTES
// =============================================================================

/// Flatten a contact into `(name, value)` pairs. Empty fields are omitted.
#[must_use]
pub fn contact_to_fields(contact: &Contact) -> Vec<(&'static str, FieldValue)> {
    let mut fields = vec![
        ("FN", FieldValue::Text(contact.fn_name.clone())),
        ("VERSION", FieldValue::Text(contact.version.clone())),
    ];
    if let Some(uid) = contact.uid() {
        fields.push(("UID", FieldValue::Text(uid.to_string())));
    }
    if let Some(rev) = contact.rev {
        fields.push(("REV", FieldValue::Rev(rev)));
    }
    for prop in TextProperty::ALL {
        if let Some(value) = contact.text(prop) {
            fields.push((prop.name(), FieldValue::Text(value.to_string())));
        }
    }
    if let Some(geo) = contact.geo {
        fields.push(("GEO", FieldValue::Geo(geo)));
    }
    for prop in ListProperty::ALL {
        let list = contact.list(prop);
        if !list.is_empty() {
            fields.push((prop.name(), FieldValue::List(list.to_vec())));
        }
    }
    if !contact.related.is_empty() {
        fields.push(("RELATED", FieldValue::Related(contact.related.clone())));
    }
    for prop in MapProperty::ALL {
        let map = contact.map(prop);
        if !map.is_empty() {
            fields.push((prop.name(), FieldValue::Map(map.clone())));
        }
    }
    fields
}

/// Accumulates decoded attributes into a contact.
///
/// `FN` may arrive after other attributes, so fields are staged on a
/// placeholder and the contact is finalized in [`ContactBuilder::finish`].
#[derive(Debug)]
pub struct ContactBuilder {
    /// Graph node id, when building a stored node.
    node_id: Option<String>,
    fn_name: Option<String>,
    contact: Contact,
}

impl ContactBuilder {
    /// Builder for a graph node; the node id is the default UID.
    pub fn for_node(node_id: impl Into<String>) -> Result<Self, PplError> {
        let node_id = node_id.into();
        Ok(Self {
            contact: Contact::new("placeholder")?.with_uid(node_id.clone()),
            node_id: Some(node_id),
            fn_name: None,
        })
    }

    /// Builder for a standalone record (YAML document, front matter).
    pub fn detached() -> Result<Self, PplError> {
        Ok(Self {
            contact: Contact::new("placeholder")?,
            node_id: None,
            fn_name: None,
        })
    }

    fn origin(&self) -> &str {
        self.node_id.as_deref().unwrap_or("<record>")
    }

    /// Decode and apply a GraphML attribute string.
    pub fn apply_attribute_string(&mut self, name: &str, raw: &str) {
        let kind = AttributeKind::of(name);
        let decoded = FieldValue::from_attribute_string(kind, name, raw);
        self.apply_decoded(kind, name, decoded, JsonValue::String(raw.to_string()));
    }

    /// Decode and apply a native JSON attribute.
    pub fn apply_json(&mut self, name: &str, value: JsonValue) {
        let kind = AttributeKind::of(name);
        let decoded = FieldValue::from_json(kind, name, value.clone());
        self.apply_decoded(kind, name, decoded, value);
    }

    fn apply_decoded(
        &mut self,
        kind: AttributeKind,
        name: &str,
        decoded: Result<FieldValue, PplError>,
        raw: JsonValue,
    ) {
        match decoded {
            Ok(value) => self.apply(kind, name, value),
            Err(err) => {
                tracing::warn!(origin = self.origin(), attribute = name, error = %err, "degrading undecodable attribute");
                match (kind, raw) {
                    (AttributeKind::List(prop), JsonValue::String(s)) => {
                        *self.contact.list_mut(prop) = vec![s];
                    }
                    (_, JsonValue::Null) => {}
                    (_, raw) => {
                        self.contact.x_properties.insert(name.to_string(), raw);
                    }
                }
            }
        }
    }

    fn apply(&mut self, kind: AttributeKind, name: &str, value: FieldValue) {
        let c = &mut self.contact;
        match (kind, value) {
            (AttributeKind::Fn, FieldValue::Text(s)) => self.fn_name = Some(s),
            (AttributeKind::Version, FieldValue::Text(s)) => c.version = s,
            (AttributeKind::Uid, FieldValue::Text(s)) => c.uid = Some(s),
            (AttributeKind::Rev, FieldValue::Rev(r)) => c.rev = Some(r),
            (AttributeKind::Text(prop), FieldValue::Text(s)) => *c.text_mut(prop) = Some(s),
            (AttributeKind::Geo, FieldValue::Geo(g)) => c.geo = Some(g),
            (AttributeKind::List(prop), FieldValue::List(l)) => *c.list_mut(prop) = l,
            (AttributeKind::Related, FieldValue::Related(r)) => c.related = r,
            (AttributeKind::Map(prop), FieldValue::Map(m)) => c.map_mut(prop).extend(m),
            (_, FieldValue::Text(s)) => {
                c.x_properties.insert(name.to_string(), JsonValue::String(s));
            }
            (_, other) => {
                let origin = self.node_id.as_deref().unwrap_or("<record>");
                tracing::warn!(origin, attribute = name, value = ?other, "attribute shape mismatch");
            }
        }
    }

    /// Finish the contact.
    ///
    /// A graph node without `FN` falls back to its id; a detached record
    /// without `FN` is an error.
    pub fn finish(mut self) -> Result<Contact, PplError> {
        let fn_name = match (self.fn_name.take().filter(|s| !s.trim().is_empty()), &self.node_id) {
            (Some(name), _) => name,
            (None, Some(node_id)) if !node_id.trim().is_empty() => {
                tracing::warn!(node = %node_id, "node has no FN, using node id");
                node_id.clone()
            }
            _ => {
                return Err(PplError::DeserializationError(
                    "FN (formatted name) is required".to_string(),
                ));
            }
        };
        self.contact.fn_name = fn_name;
        Ok(self.contact)
    }

    /// Set `GEO` directly (adapters carry it in non-JSON forms).
    pub fn set_geo(&mut self, geo: Geo) {
        self.contact.geo = Some(geo);
    }

    /// Keep an undecodable value under `X-PROPERTIES`.
    pub fn keep_raw(&mut self, name: &str, raw: JsonValue) {
        self.contact.x_properties.insert(name.to_string(), raw);
    }
}

// =============================================================================
// TESTS
// =============================================================================
