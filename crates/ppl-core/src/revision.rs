//! # Revision Timestamps
//!
//! `REV` values decide merge conflicts. They are held as UTC instants and
//! compared with [`compare_revision`], where an absent revision sorts before
//! every present one.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// A revision timestamp.
pub type Revision = DateTime<Utc>;

/// Compare two optional revisions.
///
/// Both absent → `Equal`; only `a` absent → `Less`; only `b` absent → `Greater`.
#[must_use]
pub fn compare_revision(a: Option<&Revision>, b: Option<&Revision>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// The later of two optional revisions (absent is the minimum).
#[must_use]
pub fn max_revision(a: Option<Revision>, b: Option<Revision>) -> Option<Revision> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Render a revision as RFC 3339 with a `Z` suffix.
#[must_use]
pub fn format_revision(rev: &Revision) -> String {
    rev.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a revision written by any adapter or by hand.
///
/// Accepted shapes: RFC 3339 (`2024-06-01T10:00:00Z`, offsets allowed),
/// naive ISO (`2024-06-01T10:00:00`, read as UTC), vCard basic format
/// (`20240601T100000Z`) and plain dates (`2024-06-01`, midnight UTC).
#[must_use]
pub fn parse_revision(raw: &str) -> Option<Revision> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.trim_end_matches('Z');
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y%m%dT%H%M%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(naive, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}
