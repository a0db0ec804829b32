//! # Property Tables
//!
//! Fixed mapping from vCard property names to contact fields.
//!
//! Adapters and graph codecs iterate these tables instead of naming every
//! field by hand, so a field added here is picked up everywhere.

use super::Contact;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

// =============================================================================
// TEXT PROPERTIES
// =============================================================================

/// Scalar text properties (at most one value per contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextProperty {
    N,
    Photo,
    Bday,
    Anniversary,
    Gender,
    Tz,
    Title,
    Role,
    Logo,
    Note,
    Prodid,
    Sound,
    Fburl,
    Caladruri,
    Caluri,
}

impl TextProperty {
    pub const ALL: [Self; 15] = [
        Self::N,
        Self::Photo,
        Self::Bday,
        Self::Anniversary,
        Self::Gender,
        Self::Tz,
        Self::Title,
        Self::Role,
        Self::Logo,
        Self::Note,
        Self::Prodid,
        Self::Sound,
        Self::Fburl,
        Self::Caladruri,
        Self::Caluri,
    ];

    /// vCard property name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::Photo => "PHOTO",
            Self::Bday => "BDAY",
            Self::Anniversary => "ANNIVERSARY",
            Self::Gender => "GENDER",
            Self::Tz => "TZ",
            Self::Title => "TITLE",
            Self::Role => "ROLE",
            Self::Logo => "LOGO",
            Self::Note => "NOTE",
            Self::Prodid => "PRODID",
            Self::Sound => "SOUND",
            Self::Fburl => "FBURL",
            Self::Caladruri => "CALADRURI",
            Self::Caluri => "CALURI",
        }
    }

    /// Look up by vCard property name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// LIST PROPERTIES
// =============================================================================

/// Multi-valued properties (ordered, duplicate-free after merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListProperty {
    Nickname,
    Email,
    Tel,
    Impp,
    Lang,
    Adr,
    Org,
    Member,
    Categories,
    Url,
    Key,
}

impl ListProperty {
    pub const ALL: [Self; 11] = [
        Self::Nickname,
        Self::Email,
        Self::Tel,
        Self::Impp,
        Self::Lang,
        Self::Adr,
        Self::Org,
        Self::Member,
        Self::Categories,
        Self::Url,
        Self::Key,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nickname => "NICKNAME",
            Self::Email => "EMAIL",
            Self::Tel => "TEL",
            Self::Impp => "IMPP",
            Self::Lang => "LANG",
            Self::Adr => "ADR",
            Self::Org => "ORG",
            Self::Member => "MEMBER",
            Self::Categories => "CATEGORIES",
            Self::Url => "URL",
            Self::Key => "KEY",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// MAP PROPERTIES
// =============================================================================

/// Open extension maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapProperty {
    XProperties,
    ClientPidMap,
}

impl MapProperty {
    pub const ALL: [Self; 2] = [Self::XProperties, Self::ClientPidMap];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::XProperties => "X-PROPERTIES",
            Self::ClientPidMap => "CLIENTPIDMAP",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// FIELD ACCESS
// =============================================================================

impl Contact {
    #[must_use]
    pub fn text(&self, prop: TextProperty) -> Option<&str> {
        let field = match prop {
            TextProperty::N => &self.n,
            TextProperty::Photo => &self.photo,
            TextProperty::Bday => &self.bday,
            TextProperty::Anniversary => &self.anniversary,
            TextProperty::Gender => &self.gender,
            TextProperty::Tz => &self.tz,
            TextProperty::Title => &self.title,
            TextProperty::Role => &self.role,
            TextProperty::Logo => &self.logo,
            TextProperty::Note => &self.note,
            TextProperty::Prodid => &self.prodid,
            TextProperty::Sound => &self.sound,
            TextProperty::Fburl => &self.fburl,
            TextProperty::Caladruri => &self.caladruri,
            TextProperty::Caluri => &self.caluri,
        };
        field.as_deref()
    }

    pub fn text_mut(&mut self, prop: TextProperty) -> &mut Option<String> {
        match prop {
            TextProperty::N => &mut self.n,
            TextProperty::Photo => &mut self.photo,
            TextProperty::Bday => &mut self.bday,
            TextProperty::Anniversary => &mut self.anniversary,
            TextProperty::Gender => &mut self.gender,
            TextProperty::Tz => &mut self.tz,
            TextProperty::Title => &mut self.title,
            TextProperty::Role => &mut self.role,
            TextProperty::Logo => &mut self.logo,
            TextProperty::Note => &mut self.note,
            TextProperty::Prodid => &mut self.prodid,
            TextProperty::Sound => &mut self.sound,
            TextProperty::Fburl => &mut self.fburl,
            TextProperty::Caladruri => &mut self.caladruri,
            TextProperty::Caluri => &mut self.caluri,
        }
    }

    #[must_use]
    pub fn list(&self, prop: ListProperty) -> &[String] {
        match prop {
            ListProperty::Nickname => &self.nickname,
            ListProperty::Email => &self.email,
            ListProperty::Tel => &self.tel,
            ListProperty::Impp => &self.impp,
            ListProperty::Lang => &self.lang,
            ListProperty::Adr => &self.adr,
            ListProperty::Org => &self.org,
            ListProperty::Member => &self.member,
            ListProperty::Categories => &self.categories,
            ListProperty::Url => &self.url,
            ListProperty::Key => &self.key,
        }
    }

    pub fn list_mut(&mut self, prop: ListProperty) -> &mut Vec<String> {
        match prop {
            ListProperty::Nickname => &mut self.nickname,
            ListProperty::Email => &mut self.email,
            ListProperty::Tel => &mut self.tel,
            ListProperty::Impp => &mut self.impp,
            ListProperty::Lang => &mut self.lang,
            ListProperty::Adr => &mut self.adr,
            ListProperty::Org => &mut self.org,
            ListProperty::Member => &mut self.member,
            ListProperty::Categories => &mut self.categories,
            ListProperty::Url => &mut self.url,
            ListProperty::Key => &mut self.key,
        }
    }

    #[must_use]
    pub fn map(&self, prop: MapProperty) -> &BTreeMap<String, JsonValue> {
        match prop {
            MapProperty::XProperties => &self.x_properties,
            MapProperty::ClientPidMap => &self.clientpidmap,
        }
    }

    pub fn map_mut(&mut self, prop: MapProperty) -> &mut BTreeMap<String, JsonValue> {
        match prop {
            MapProperty::XProperties => &mut self.x_properties,
            MapProperty::ClientPidMap => &mut self.clientpidmap,
        }
    }

    /// Append `value` to a list property unless already present.
    pub fn push_unique(&mut self, prop: ListProperty, value: impl Into<String>) {
        let value = value.into();
        let list = self.list_mut(prop);
        if !list.contains(&value) {
            list.push(value);
        }
    }
}
