//! # Contact Graph
//!
//! In-memory directed graph of contacts keyed by UID.
//!
//! This module implements the `GraphStore` trait.
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::contact::Contact;
use crate::relationship::{EdgeView, Relationship};
use crate::types::PplError;
use std::cmp::Ordering;
use std::collections::BTreeMap;

// =============================================================================
// MERGE OUTCOME
// =============================================================================

/// What [`GraphStore::merge`] did with the incoming contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// The UID was new; the contact was inserted.
    Added,
    /// The stored contact absorbed the incoming one.
    Updated,
    /// The stored contact is strictly newer; nothing changed.
    Skipped,
}

impl MergeAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of a graph-level merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub changed: bool,
    pub action: MergeAction,
}

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// Core contact graph operations.
///
/// Every contact in a store has a non-empty, unique UID, and every edge
/// connects two stored contacts.
pub trait GraphStore {
    /// Insert a new contact. Fails if it has no UID or the UID is taken.
    fn add(&mut self, contact: Contact) -> Result<(), PplError>;

    /// Replace a stored contact wholesale (no merge).
    fn update(&mut self, contact: Contact) -> Result<(), PplError>;

    /// Insert or merge a contact, skipping it if the stored one is newer.
    fn merge(&mut self, contact: Contact) -> Result<MergeOutcome, PplError>;

    /// Lookup a contact by UID.
    fn get(&self, uid: &str) -> Option<&Contact>;

    /// Remove a contact and every edge touching it.
    fn remove(&mut self, uid: &str) -> Option<Contact>;

    /// Insert or replace the edge `source -> target`.
    fn add_edge(&mut self, relationship: Relationship) -> Result<(), PplError>;

    /// Outgoing edges of a contact, with both endpoints resolved.
    fn edges_from(&self, uid: &str) -> Vec<EdgeView<'_>>;

    /// All contacts, ordered by UID.
    fn all_entities(&self) -> Vec<&Contact>;

    /// All edges, ordered by `(source, target)`.
    fn all_edges(&self) -> Vec<EdgeView<'_>>;

    /// Number of contacts.
    fn len(&self) -> usize;

    /// Whether the store holds no contacts.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// CONTACT GRAPH
// =============================================================================

/// The in-memory contact graph.
#[derive(Debug, Clone, Default)]
pub struct ContactGraph {
    /// Graph name, persisted by the JSON codec.
    name: Option<String>,

    /// Contact storage: uid -> contact
    contacts: BTreeMap<String, Contact>,

    /// Adjacency list: source uid -> (target uid -> edge)
    edges: BTreeMap<String, BTreeMap<String, Relationship>>,
}

impl ContactGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Whether the edge `source -> target` exists.
    #[must_use]
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .get(source)
            .is_some_and(|out| out.contains_key(target))
    }

    /// Turn embedded `RELATED` references into edges.
    ///
    /// References whose URI names a stored contact become edges; the rest
    /// stay embedded only. An existing edge to the same target keeps its
    /// metadata and directional flag and gains any new types.
    /// Returns the number of references resolved.
    pub fn resolve_related(&mut self) -> usize {
        let mut pending = Vec::new();
        for (uid, contact) in &self.contacts {
            for related in &contact.related {
                // uids may themselves be URNs, so try the full URI first
                let target = related
                    .uri()
                    .filter(|uri| self.contacts.contains_key(*uri))
                    .or_else(|| related.target_uid());
                match target {
                    Some(target) if self.contacts.contains_key(target) => {
                        pending.push(Relationship::from_related(uid.clone(), related, target));
                    }
                    Some(target) => {
                        tracing::debug!(source = %uid, target_uid = target, "RELATED target not in graph");
                    }
                    None => {}
                }
            }
        }
        let count = pending.len();
        for relationship in pending {
            self.absorb_edge(relationship);
        }
        count
    }

    /// Write every edge back into its source contact as a `RELATED` reference.
    ///
    /// Edges whose target URI is already referenced are left alone.
    /// Returns the number of references added.
    pub fn project_related(&mut self) -> usize {
        let mut pending = Vec::new();
        for view in self.all_edges() {
            let related = view.relationship.to_related(view.target);
            let known = view
                .source
                .related
                .iter()
                .any(|r| r.uri().is_some() && r.uri() == related.uri());
            if !known {
                pending.push((view.relationship.source_id.clone(), related));
            }
        }
        let count = pending.len();
        for (uid, related) in pending {
            if let Some(contact) = self.contacts.get_mut(&uid) {
                contact.related.push(related);
            }
        }
        count
    }

    /// Case-insensitive search over FN, nicknames, email and organization.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Contact> {
        let needle = query.to_lowercase();
        self.contacts
            .values()
            .filter(|c| {
                std::iter::once(&c.fn_name)
                    .chain(&c.nickname)
                    .chain(&c.email)
                    .chain(&c.org)
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn insert_edge(&mut self, relationship: Relationship) {
        self.edges
            .entry(relationship.source_id.clone())
            .or_default()
            .insert(relationship.target_id.clone(), relationship);
    }

    fn absorb_edge(&mut self, relationship: Relationship) {
        let out = self.edges.entry(relationship.source_id.clone()).or_default();
        match out.get_mut(&relationship.target_id) {
            Some(existing) => {
                for kind in relationship.types {
                    if !existing.types.contains(&kind) {
                        existing.types.push(kind);
                    }
                }
            }
            None => {
                out.insert(relationship.target_id.clone(), relationship);
            }
        }
    }

    fn view<'g>(&'g self, relationship: &'g Relationship) -> Option<EdgeView<'g>> {
        Some(EdgeView {
            source: self.contacts.get(&relationship.source_id)?,
            target: self.contacts.get(&relationship.target_id)?,
            relationship,
        })
    }
}

impl GraphStore for ContactGraph {
    fn add(&mut self, contact: Contact) -> Result<(), PplError> {
        let uid = contact.require_uid("be added to graph")?.to_string();
        if self.contacts.contains_key(&uid) {
            return Err(PplError::DuplicateEntity(uid));
        }
        self.contacts.insert(uid, contact);
        Ok(())
    }

    fn update(&mut self, contact: Contact) -> Result<(), PplError> {
        let uid = contact.require_uid("be updated")?.to_string();
        match self.contacts.get_mut(&uid) {
            Some(slot) => {
                *slot = contact;
                Ok(())
            }
            None => Err(PplError::NotFound(uid)),
        }
    }

    fn merge(&mut self, contact: Contact) -> Result<MergeOutcome, PplError> {
        let uid = contact.require_uid("be merged")?.to_string();
        let Some(existing) = self.contacts.get_mut(&uid) else {
            self.contacts.insert(uid, contact);
            return Ok(MergeOutcome {
                changed: true,
                action: MergeAction::Added,
            });
        };

        if existing.compare_rev(&contact) == Ordering::Greater {
            tracing::debug!(uid = %uid, "stored contact is newer, skipping merge");
            return Ok(MergeOutcome {
                changed: false,
                action: MergeAction::Skipped,
            });
        }

        existing.merge_from(&contact, true);
        Ok(MergeOutcome {
            changed: true,
            action: MergeAction::Updated,
        })
    }

    fn get(&self, uid: &str) -> Option<&Contact> {
        self.contacts.get(uid)
    }

    fn remove(&mut self, uid: &str) -> Option<Contact> {
        let removed = self.contacts.remove(uid)?;
        self.edges.remove(uid);
        for out in self.edges.values_mut() {
            out.remove(uid);
        }
        self.edges.retain(|_, out| !out.is_empty());
        Some(removed)
    }

    fn add_edge(&mut self, relationship: Relationship) -> Result<(), PplError> {
        if !self.contacts.contains_key(&relationship.source_id)
            || !self.contacts.contains_key(&relationship.target_id)
        {
            return Err(PplError::InvalidEdge {
                source_id: relationship.source_id,
                target_id: relationship.target_id,
            });
        }
        self.insert_edge(relationship);
        Ok(())
    }

    fn edges_from(&self, uid: &str) -> Vec<EdgeView<'_>> {
        self.edges
            .get(uid)
            .map(|out| out.values().filter_map(|r| self.view(r)).collect())
            .unwrap_or_default()
    }

    fn all_entities(&self) -> Vec<&Contact> {
        self.contacts.values().collect()
    }

    fn all_edges(&self) -> Vec<EdgeView<'_>> {
        self.edges
            .values()
            .flat_map(BTreeMap::values)
            .filter_map(|r| self.view(r))
            .collect()
    }

    fn len(&self) -> usize {
        self.contacts.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
