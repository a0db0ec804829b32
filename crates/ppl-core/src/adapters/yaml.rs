//! # YAML Adapter
//!
//! One contact per document, keyed by uppercase vCard property names:
//!
//! ```yaml
//! FN: Jane Doe
//! VERSION: '4.0'
//! UID: urn:uuid:...
//! EMAIL:
//! - jane@example.com
//! GEO: 37.38,-122.08
//! RELATED:
//! - uri: urn:uuid:...
//!   type: [friend]
//! ```
//!
//! The same mapping is the front matter of the Markdown adapter.

use super::FormatAdapter;
use crate::contact::{Contact, Geo};
use crate::formats::attributes::{AttributeKind, ContactBuilder, FieldValue, contact_to_fields};
use crate::types::PplError;
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};

/// YAML format adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlAdapter;

impl FormatAdapter for YamlAdapter {
    fn import_one(&self, text: &str) -> Result<Contact, PplError> {
        let value: YamlValue =
            serde_yaml::from_str(text).map_err(|e| PplError::DeserializationError(e.to_string()))?;
        contact_from_yaml(value)
    }

    fn export_one(&self, contact: &Contact) -> Result<String, PplError> {
        let mapping = contact_to_yaml(contact)?;
        serde_yaml::to_string(&mapping).map_err(|e| PplError::SerializationError(e.to_string()))
    }
}

/// Build the YAML mapping for a contact.
pub fn contact_to_yaml(contact: &Contact) -> Result<Mapping, PplError> {
    let mut mapping = Mapping::new();
    for (name, value) in contact_to_fields(contact) {
        let yaml = match value {
            FieldValue::Geo(geo) => YamlValue::String(geo.to_string()),
            other => serde_yaml::to_value(other.to_json()?)
                .map_err(|e| PplError::SerializationError(e.to_string()))?,
        };
        mapping.insert(YamlValue::String(name.to_string()), yaml);
    }
    Ok(mapping)
}

/// Read a contact from a parsed YAML document.
///
/// Keys are case-insensitive. A document that is not a mapping, or that
/// has no `FN`, is a `DeserializationError`.
pub fn contact_from_yaml(value: YamlValue) -> Result<Contact, PplError> {
    let YamlValue::Mapping(mapping) = value else {
        return Err(PplError::DeserializationError(
            "expected a mapping of contact properties".to_string(),
        ));
    };
    let mut builder = ContactBuilder::detached()?;
    for (key, value) in mapping {
        let Some(name) = scalar_text(&key) else {
            tracing::warn!(key = ?key, "skipping non-scalar key");
            continue;
        };
        let name = name.to_ascii_uppercase();
        let json = match serde_json::to_value(&value) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(attribute = %name, error = %err, "skipping value with no JSON form");
                continue;
            }
        };
        let kind = AttributeKind::of(&name);
        match (kind, json) {
            (AttributeKind::Geo, JsonValue::String(raw)) => match Geo::parse(&raw) {
                Some(geo) => builder.set_geo(geo),
                None => {
                    tracing::warn!(value = %raw, "unparseable GEO");
                    builder.keep_raw(&name, JsonValue::String(raw));
                }
            },
            (_, json) => builder.apply_json(&name, json),
        }
    }
    builder.finish()
}

fn scalar_text(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
