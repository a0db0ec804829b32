//! # Relationships
//!
//! Graph edges between contacts, and their projection to and from the
//! `RELATED` references embedded in each contact.

use crate::contact::{Contact, Related, uid_to_uri};
use crate::primitives::is_directional_type;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A directed edge `source -> target`.
///
/// Endpoints are contact UIDs; the graph owns the contacts themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    /// Relationship types, in the order they were declared.
    pub types: Vec<String>,
    /// Whether the relationship implies a direction (parent, spouse, ...).
    pub directional: bool,
    /// Open edge metadata.
    pub metadata: BTreeMap<String, JsonValue>,
}

impl Relationship {
    /// New edge; `directional` is derived from `types`.
    #[must_use]
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, types: &[&str]) -> Self {
        let types: Vec<String> = types.iter().map(|t| (*t).to_string()).collect();
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            directional: types.iter().any(|t| is_directional_type(t)),
            types,
            metadata: BTreeMap::new(),
        }
    }

    /// Build the edge a `RELATED` reference describes.
    ///
    /// The edge is directional when any of the reference's types is.
    #[must_use]
    pub fn from_related(
        source_id: impl Into<String>,
        related: &Related,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            types: related.types.clone(),
            directional: related.types.iter().any(|t| is_directional_type(t)),
            metadata: BTreeMap::new(),
        }
    }

    /// Render this edge as a `RELATED` reference pointing at `target`.
    ///
    /// Targets without a UID degrade to a text-only reference carrying `FN`.
    #[must_use]
    pub fn to_related(&self, target: &Contact) -> Related {
        match target.uid() {
            Some(uid) => Related {
                uri: Some(uid_to_uri(uid)),
                types: self.types.clone(),
                text_value: None,
                pref: None,
            },
            None => Related {
                uri: None,
                types: self.types.clone(),
                text_value: Some(target.fn_name.clone()),
                pref: None,
            },
        }
    }
}

/// An edge together with the contacts at both ends.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'g> {
    pub source: &'g Contact,
    pub target: &'g Contact,
    pub relationship: &'g Relationship,
}
