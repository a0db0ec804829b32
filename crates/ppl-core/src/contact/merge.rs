//! Lossless contact merge.

use super::{Contact, ListProperty, MapProperty, TextProperty};
use crate::revision::max_revision;
use std::cmp::Ordering;

impl Contact {
    /// Merge `other` into `self` without losing information.
    ///
    /// Scalars are adopted when missing and replaced only when `other` is
    /// strictly newer and `prefer_newer` is set. Lists are unioned in order.
    /// `RELATED` entries are deduplicated by URI alone; entries without a URI
    /// are appended unless an identical entry is already present. Extension
    /// maps follow the scalar rule key by key.
    /// The revision always ends up as the later of the two.
    pub fn merge_from(&mut self, other: &Contact, prefer_newer: bool) -> &mut Self {
        let other_is_newer = prefer_newer && self.compare_rev(other) == Ordering::Less;

        for prop in TextProperty::ALL {
            if let Some(theirs) = other.text(prop) {
                let ours = self.text_mut(prop);
                if ours.is_none() || other_is_newer {
                    *ours = Some(theirs.to_string());
                }
            }
        }

        if let Some(geo) = other.geo
            && (self.geo.is_none() || other_is_newer)
        {
            self.geo = Some(geo);
        }

        for prop in ListProperty::ALL {
            for value in other.list(prop) {
                self.push_unique(prop, value.as_str());
            }
        }

        for rel in &other.related {
            let duplicate = match rel.uri() {
                Some(uri) => self.related.iter().any(|own| own.uri() == Some(uri)),
                None => self.related.contains(rel),
            };
            if !duplicate {
                self.related.push(rel.clone());
            }
        }

        for prop in MapProperty::ALL {
            for (key, value) in other.map(prop) {
                let ours = self.map_mut(prop);
                if other_is_newer || !ours.contains_key(key) {
                    ours.insert(key.clone(), value.clone());
                }
            }
        }

        self.rev = max_revision(self.rev, other.rev);
        self
    }
}
