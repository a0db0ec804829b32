//! # Contact Model
//!
//! A contact is a vCard 4.0 entity: one person or organization.
//!
//! - `uid` identifies the contact inside the graph (required there, optional elsewhere)
//! - `fn_name` (`FN`) is the only field that must always be present
//! - `rev` is the freshness signal used by [`Contact::merge_from`]
//!
//! Field access by vCard property name goes through the tables in
//! [`properties`], which every adapter and both graph codecs share.

mod merge;
pub mod properties;

pub use properties::{ListProperty, MapProperty, TextProperty};

use crate::primitives::{URN_UUID_PREFIX, VCARD_VERSION};
use crate::revision::{Revision, compare_revision};
use crate::types::PplError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;

// =============================================================================
// GEO
// =============================================================================

/// Geographic position as `(latitude, longitude)`.
///
/// Serializes as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geo(pub f64, pub f64);

impl Geo {
    /// Parse `lat,lon`, optionally prefixed with `geo:`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("geo:").unwrap_or(raw);
        let (lat, lon) = raw.split_once(',')?;
        // geo: URIs may carry ";u=..." uncertainty parameters
        let lon = lon.split(';').next().unwrap_or(lon);
        Some(Self(lat.trim().parse().ok()?, lon.trim().parse().ok()?))
    }

    /// `geo:lat,lon` URI form used by vCard.
    #[must_use]
    pub fn to_uri(&self) -> String {
        format!("geo:{},{}", self.0, self.1)
    }
}

impl std::fmt::Display for Geo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

// =============================================================================
// RELATED
// =============================================================================

/// A vCard `RELATED` reference: the embedded form of an outgoing edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Related {
    /// Target reference, usually `urn:uuid:<uid>`. `None` for text-only references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Relationship type labels (friend, parent, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,

    /// Free-text label, used when the target is not resolved to a URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,

    /// Preference rank (1 = most preferred).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pref: Option<u8>,
}

impl Related {
    /// Reference to another contact by URI.
    #[must_use]
    pub fn to_uri(uri: impl Into<String>, types: &[&str]) -> Self {
        let uri = uri.into();
        Self {
            uri: (!uri.is_empty()).then_some(uri),
            types: types.iter().map(|t| (*t).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Text-only reference.
    #[must_use]
    pub fn to_text(text: impl Into<String>, types: &[&str]) -> Self {
        Self {
            text_value: Some(text.into()),
            types: types.iter().map(|t| (*t).to_string()).collect(),
            ..Self::default()
        }
    }

    /// The URI, when present and non-empty.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref().filter(|u| !u.is_empty())
    }

    /// The UID this reference points at, stripping a `urn:uuid:` prefix.
    #[must_use]
    pub fn target_uid(&self) -> Option<&str> {
        self.uri().map(|u| u.strip_prefix(URN_UUID_PREFIX).unwrap_or(u))
    }
}

/// Turn a UID into the URI form used by `RELATED`.
///
/// UIDs already in URI form (`urn:...`, `http...`) are kept as they are.
#[must_use]
pub fn uid_to_uri(uid: &str) -> String {
    if uid.starts_with("urn:") || uid.starts_with("http://") || uid.starts_with("https://") {
        uid.to_string()
    } else {
        format!("{URN_UUID_PREFIX}{uid}")
    }
}

// =============================================================================
// CONTACT
// =============================================================================

/// A contact entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Formatted name (`FN`). Never empty.
    pub fn_name: String,
    /// vCard version (`VERSION`).
    pub version: String,
    /// Unique identifier (`UID`).
    pub uid: Option<String>,
    /// Revision timestamp (`REV`).
    pub rev: Option<Revision>,

    // Scalar text properties
    pub n: Option<String>,
    pub photo: Option<String>,
    pub bday: Option<String>,
    pub anniversary: Option<String>,
    pub gender: Option<String>,
    pub tz: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub logo: Option<String>,
    pub note: Option<String>,
    pub prodid: Option<String>,
    pub sound: Option<String>,
    pub fburl: Option<String>,
    pub caladruri: Option<String>,
    pub caluri: Option<String>,

    /// Geographic position (`GEO`).
    pub geo: Option<Geo>,

    // Collection properties
    pub nickname: Vec<String>,
    pub email: Vec<String>,
    pub tel: Vec<String>,
    pub impp: Vec<String>,
    pub lang: Vec<String>,
    pub adr: Vec<String>,
    pub org: Vec<String>,
    pub member: Vec<String>,
    pub categories: Vec<String>,
    pub url: Vec<String>,
    pub key: Vec<String>,

    /// Relationship references (`RELATED`).
    pub related: Vec<Related>,

    /// Vendor extensions (`X-*`), keyed by full property name.
    pub x_properties: BTreeMap<String, JsonValue>,
    /// Client PID map (`CLIENTPIDMAP`).
    pub clientpidmap: BTreeMap<String, JsonValue>,
}

impl Contact {
    /// Create a contact with only a formatted name.
    ///
    /// Returns `PplError::InvalidEntity` if the name is blank.
    pub fn new(fn_name: impl Into<String>) -> Result<Self, PplError> {
        let fn_name = fn_name.into();
        if fn_name.trim().is_empty() {
            return Err(PplError::InvalidEntity(
                "FN (formatted name) is required".to_string(),
            ));
        }
        Ok(Self {
            fn_name,
            version: VCARD_VERSION.to_string(),
            uid: None,
            rev: None,
            n: None,
            photo: None,
            bday: None,
            anniversary: None,
            gender: None,
            tz: None,
            title: None,
            role: None,
            logo: None,
            note: None,
            prodid: None,
            sound: None,
            fburl: None,
            caladruri: None,
            caluri: None,
            geo: None,
            nickname: Vec::new(),
            email: Vec::new(),
            tel: Vec::new(),
            impp: Vec::new(),
            lang: Vec::new(),
            adr: Vec::new(),
            org: Vec::new(),
            member: Vec::new(),
            categories: Vec::new(),
            url: Vec::new(),
            key: Vec::new(),
            related: Vec::new(),
            x_properties: BTreeMap::new(),
            clientpidmap: BTreeMap::new(),
        })
    }

    /// Builder: set the UID.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Builder: set the revision.
    #[must_use]
    pub fn with_rev(mut self, rev: Revision) -> Self {
        self.rev = Some(rev);
        self
    }

    /// The UID if present and non-empty.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref().filter(|u| !u.is_empty())
    }

    /// The UID, or `InvalidEntity` naming the operation that needed it.
    pub fn require_uid(&self, operation: &str) -> Result<&str, PplError> {
        self.uid().ok_or_else(|| {
            PplError::InvalidEntity(format!(
                "Contact \"{}\" must have a UID to {}",
                self.fn_name, operation
            ))
        })
    }

    /// The `RELATED` URI other contacts use to point at this one.
    #[must_use]
    pub fn related_uri(&self) -> Option<String> {
        self.uid().map(uid_to_uri)
    }

    /// Compare revisions: `Less` if `self` is older than `other`.
    #[must_use]
    pub fn compare_rev(&self, other: &Contact) -> Ordering {
        compare_revision(self.rev.as_ref(), other.rev.as_ref())
    }

    /// File stem used by folder exports: FN with path separators replaced.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.fn_name.replace(['/', '\\'], "_")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_rejected() {
        assert!(matches!(
            Contact::new("  "),
            Err(PplError::InvalidEntity(_))
        ));
    }

    #[test]
    fn new_contact_defaults() {
        let c = Contact::new("Jane Doe").expect("contact");
        assert_eq!(c.version, "4.0");
        assert!(c.uid().is_none());
        assert!(c.email.is_empty());
    }

    #[test]
    fn require_uid_names_operation() {
        let c = Contact::new("Eve").expect("contact");
        let err = c.require_uid("be merged").expect_err("no uid");
        assert!(err.to_string().contains("must have a UID to be merged"));
    }

    #[test]
    fn empty_uid_counts_as_missing() {
        let c = Contact::new("Eve").expect("contact").with_uid("");
        assert!(c.uid().is_none());
    }

    #[test]
    fn uid_to_uri_keeps_existing_urns() {
        assert_eq!(uid_to_uri("bob"), "urn:uuid:bob");
        assert_eq!(uid_to_uri("urn:uuid:bob"), "urn:uuid:bob");
    }

    #[test]
    fn related_target_uid_strips_prefix() {
        let r = Related::to_uri("urn:uuid:bob-uid", &["friend"]);
        assert_eq!(r.target_uid(), Some("bob-uid"));
        assert!(Related::to_uri("", &[]).uri().is_none());
    }

    #[test]
    fn geo_parses_uri_and_plain() {
        assert_eq!(Geo::parse("geo:37.386,-122.082"), Some(Geo(37.386, -122.082)));
        assert_eq!(Geo::parse("34.05, -118.24"), Some(Geo(34.05, -118.24)));
        assert_eq!(Geo::parse("geo:1.5,2.5;u=10"), Some(Geo(1.5, 2.5)));
        assert_eq!(Geo::parse("nowhere"), None);
    }

    #[test]
    fn file_stem_replaces_separators() {
        let c = Contact::new("A/B\\C").expect("contact");
        assert_eq!(c.file_stem(), "A_B_C");
    }
}
