//! # Primitives
//!
//! Fixed vocabulary and constants shared by the model, codecs and adapters.

/// vCard version written by every adapter.
pub const VCARD_VERSION: &str = "4.0";

/// Prefix used when a UID is turned into a RELATED URI.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// Relationship types that make an edge directional.
///
/// Any other type (friend, colleague, ...) yields a non-directional edge.
pub const DIRECTIONAL_TYPES: &[&str] = &[
    "child",
    "parent",
    "sibling",
    "spouse",
    "muse",
    "crush",
    "date",
    "sweetheart",
];

/// RELATED TYPE values listed by RFC 6350. The vocabulary stays open.
pub const KNOWN_RELATED_TYPES: &[&str] = &[
    "contact",
    "acquaintance",
    "friend",
    "met",
    "co-worker",
    "colleague",
    "co-resident",
    "neighbor",
    "child",
    "parent",
    "sibling",
    "spouse",
    "kin",
    "muse",
    "crush",
    "date",
    "sweetheart",
    "me",
    "agent",
    "emergency",
];

/// Graph name written into the JSON graph `attributes` block when none is set.
pub const DEFAULT_GRAPH_NAME: &str = "ppl";

/// Maximum size of a single contact file accepted by bulk import (8 MB).
pub const MAX_CONTACT_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Maximum size of a graph file accepted by `load` (500 MB).
pub const MAX_GRAPH_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// vCard lines are folded at this many octets.
pub const VCARD_FOLD_WIDTH: usize = 75;

/// Whether `kind` (case-insensitive) is in [`DIRECTIONAL_TYPES`].
#[must_use]
pub fn is_directional_type(kind: &str) -> bool {
    DIRECTIONAL_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(kind))
}
