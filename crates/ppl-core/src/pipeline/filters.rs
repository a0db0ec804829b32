//! Built-in curation stages.

use super::{FilterContext, PipelineMode};
use crate::contact::Contact;
use crate::primitives::URN_UUID_PREFIX;
use crate::types::PplError;

/// Relationship types that imply the contact is female.
pub const FEMALE_TERMS: &[&str] = &[
    "mother",
    "mom",
    "daughter",
    "sister",
    "wife",
    "girlfriend",
    "grandmother",
    "grandma",
    "aunt",
    "niece",
];

/// Relationship types that imply the contact is male.
pub const MALE_TERMS: &[&str] = &[
    "father",
    "dad",
    "son",
    "brother",
    "husband",
    "boyfriend",
    "grandfather",
    "grandpa",
    "uncle",
    "nephew",
];

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Give contacts without a UID a fresh `urn:uuid:` one.
    ///
    /// Fails on an existing `urn:uuid:` UID that does not hold a UUID.
    UidAssignment,
    /// Set `GENDER` from gendered relationship types when it is unset.
    GenderInference,
}

impl Filter {
    /// Lower runs first.
    #[must_use]
    pub const fn priority(self) -> u32 {
        match self {
            Self::UidAssignment => 10,
            Self::GenderInference => 50,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UidAssignment => "UID Assignment",
            Self::GenderInference => "Gender Inference",
        }
    }

    #[must_use]
    pub fn should_run(self, context: &FilterContext) -> bool {
        match self {
            Self::UidAssignment => true,
            Self::GenderInference => {
                matches!(context.mode, PipelineMode::Import | PipelineMode::Curation)
            }
        }
    }

    pub fn apply(self, contact: &mut Contact, _context: &FilterContext) -> Result<(), PplError> {
        match self {
            Self::UidAssignment => assign_uid(contact),
            Self::GenderInference => {
                infer_gender(contact);
                Ok(())
            }
        }
    }
}

fn assign_uid(contact: &mut Contact) -> Result<(), PplError> {
    if let Some(uid) = contact.uid() {
        if let Some(raw) = uid.strip_prefix(URN_UUID_PREFIX) {
            uuid::Uuid::parse_str(raw).map_err(|e| {
                PplError::InvalidEntity(format!("UID '{uid}' is not a UUID URN: {e}"))
            })?;
        }
        return Ok(());
    }
    let uid = format!("{URN_UUID_PREFIX}{}", uuid::Uuid::new_v4());
    tracing::info!(contact = %contact.fn_name, uid = %uid, "assigned UID");
    contact.uid = Some(uid);
    Ok(())
}

fn infer_gender(contact: &mut Contact) {
    if contact.gender.as_deref().is_some_and(|g| !g.is_empty()) {
        return;
    }
    let mut inferred: Option<&'static str> = None;
    for kind in contact.related.iter().flat_map(|r| &r.types) {
        let kind = kind.to_lowercase();
        let signal = if FEMALE_TERMS.contains(&kind.as_str()) {
            "F"
        } else if MALE_TERMS.contains(&kind.as_str()) {
            "M"
        } else {
            continue;
        };
        if let Some(previous) = inferred.filter(|p| *p != signal) {
            tracing::warn!(contact = %contact.fn_name, previous, now = signal, "conflicting gender signals");
        }
        inferred = Some(signal);
    }
    if let Some(gender) = inferred {
        tracing::info!(contact = %contact.fn_name, gender, "inferred gender");
        contact.gender = Some(gender.to_string());
    }
}
