//! # vCard 4.0 Adapter
//!
//! Line-oriented reader and writer for RFC 6350 cards.
//!
//! ## Reading
//!
//! - Folded lines (continuation starting with space or tab) are unfolded.
//! - `group.` prefixes are ignored; property names are case-insensitive.
//! - `NICKNAME` and `CATEGORIES` split on unescaped commas.
//! - `RELATED;VALUE=text` becomes a text-only reference.
//! - Unknown properties are kept under `X-PROPERTIES`.
//!
//! ## Writing
//!
//! Lines end in CRLF and fold at 75 octets. Only the first card of a
//! multi-card file is read.

use super::FormatAdapter;
use crate::contact::{Contact, Geo, ListProperty, Related, TextProperty};
use crate::primitives::VCARD_FOLD_WIDTH;
use crate::revision::{format_revision, parse_revision};
use crate::types::PplError;
use serde_json::Value as JsonValue;

/// vCard 4.0 format adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct VcardAdapter;

impl FormatAdapter for VcardAdapter {
    fn import_one(&self, text: &str) -> Result<Contact, PplError> {
        parse_vcard(text)
    }

    fn export_one(&self, contact: &Contact) -> Result<String, PplError> {
        Ok(render_vcard(contact))
    }
}

// =============================================================================
// ESCAPING
// =============================================================================

/// How a property value is escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    /// Free text: backslash, newline, comma and semicolon.
    Text,
    /// Compound values (`N`, `ADR`, ...): `;` separates components and stays bare.
    Structured,
    /// URIs and identifiers: backslash and newline only.
    Uri,
}

fn escape_for(name: &str) -> Escape {
    match name {
        "N" | "ADR" | "ORG" | "GENDER" | "CLIENTPIDMAP" => Escape::Structured,
        "UID" | "PHOTO" | "LOGO" | "SOUND" | "URL" | "KEY" | "FBURL" | "CALURI"
        | "CALADRURI" | "IMPP" | "MEMBER" | "EMAIL" | "TEL" | "TZ" | "GEO" | "RELATED"
        | "SOURCE" => Escape::Uri,
        _ => Escape::Text,
    }
}

fn escape(value: &str, mode: Escape) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            ',' if mode != Escape::Uri => out.push_str("\\,"),
            ';' if mode == Escape::Text => out.push_str("\\;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str, mode: Escape) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n' | 'N') => out.push('\n'),
            Some(',') if mode != Escape::Uri => out.push(','),
            Some(';') if mode == Escape::Text => out.push(';'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split on commas not preceded by a backslash, then unescape each part.
fn split_text_list(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            current.push('\\');
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == ',' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    if escaped {
        current.push('\\');
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| unescape(p.trim(), Escape::Text))
        .filter(|p| !p.is_empty())
        .collect()
}

// =============================================================================
// READER
// =============================================================================

/// One unfolded content line.
#[derive(Debug)]
struct ContentLine {
    name: String,
    params: Vec<(String, Vec<String>)>,
    value: String,
}

impl ContentLine {
    fn param(&self, key: &str) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }
}

fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match raw.strip_prefix([' ', '\t']) {
            Some(rest) if !lines.is_empty() => {
                if let Some(last) = lines.last_mut() {
                    last.push_str(rest);
                }
            }
            _ => {
                if !raw.trim().is_empty() {
                    lines.push(raw.to_string());
                }
            }
        }
    }
    lines
}

/// Split `s` on `sep` outside double quotes.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&s[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_line(line: &str) -> Option<ContentLine> {
    let mut in_quotes = false;
    let colon = line.char_indices().find_map(|(i, ch)| match ch {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        ':' if !in_quotes => Some(i),
        _ => None,
    })?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next()?.trim();
    // drop a group prefix ("item1.EMAIL")
    let name = name.rsplit('.').next().unwrap_or(name).to_ascii_uppercase();
    let params = parts
        .filter_map(|p| {
            let (key, values) = p.split_once('=')?;
            let values = split_unquoted(values, ',')
                .into_iter()
                .map(|v| v.trim().trim_matches('"').to_string())
                .filter(|v| !v.is_empty())
                .collect();
            Some((key.trim().to_ascii_uppercase(), values))
        })
        .collect();
    Some(ContentLine {
        name,
        params,
        value: value.to_string(),
    })
}

/// Parse the first card in `text`.
pub fn parse_vcard(text: &str) -> Result<Contact, PplError> {
    let lines = unfold(text);
    let begin = lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case("BEGIN:VCARD"))
        .ok_or_else(|| PplError::DeserializationError("missing BEGIN:VCARD".to_string()))?;

    let mut fn_name: Option<String> = None;
    let mut version: Option<String> = None;
    let mut parsed: Vec<ContentLine> = Vec::new();
    let mut closed = false;
    for line in &lines[begin + 1..] {
        if line.trim().eq_ignore_ascii_case("END:VCARD") {
            closed = true;
            break;
        }
        let Some(content) = parse_line(line) else {
            tracing::warn!(line = %line, "skipping malformed vCard line");
            continue;
        };
        match content.name.as_str() {
            "FN" if fn_name.is_none() => fn_name = Some(unescape(&content.value, Escape::Text)),
            "VERSION" => version = Some(content.value.trim().to_string()),
            _ => parsed.push(content),
        }
    }
    if !closed {
        return Err(PplError::DeserializationError(
            "missing END:VCARD".to_string(),
        ));
    }

    let fn_name = fn_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| PplError::DeserializationError("missing FN".to_string()))?;
    let mut contact = Contact::new(fn_name)?;
    if let Some(version) = version {
        contact.version = version;
    }
    for line in parsed {
        apply_line(&mut contact, line);
    }
    Ok(contact)
}

fn apply_line(contact: &mut Contact, line: ContentLine) {
    let mode = escape_for(&line.name);
    match line.name.as_str() {
        "UID" => contact.uid = Some(unescape(&line.value, mode)),
        "REV" => match parse_revision(&line.value) {
            Some(rev) => contact.rev = Some(rev),
            None => tracing::warn!(value = %line.value, "unparseable REV"),
        },
        "GEO" => match Geo::parse(&line.value) {
            Some(geo) => contact.geo = Some(geo),
            None => {
                tracing::warn!(value = %line.value, "unparseable GEO");
                contact
                    .x_properties
                    .insert("GEO".to_string(), JsonValue::String(line.value));
            }
        },
        "RELATED" => contact.related.push(parse_related(&line)),
        "CLIENTPIDMAP" => {
            let value = unescape(&line.value, mode);
            let (pid, uri) = value.split_once(';').unwrap_or(("", value.as_str()));
            contact
                .clientpidmap
                .insert(pid.to_string(), JsonValue::String(uri.to_string()));
        }
        "NICKNAME" | "CATEGORIES" => {
            if let Some(prop) = ListProperty::from_name(&line.name) {
                for value in split_text_list(&line.value) {
                    contact.push_unique(prop, value);
                }
            }
        }
        name => {
            if let Some(prop) = TextProperty::from_name(name) {
                *contact.text_mut(prop) = Some(unescape(&line.value, mode));
            } else if let Some(prop) = ListProperty::from_name(name) {
                contact.push_unique(prop, unescape(&line.value, mode));
            } else {
                push_extension(contact, name, unescape(&line.value, mode));
            }
        }
    }
}

/// Repeated extension properties collect into an array.
fn push_extension(contact: &mut Contact, name: &str, value: String) {
    let value = JsonValue::String(value);
    match contact.x_properties.get_mut(name) {
        Some(JsonValue::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = JsonValue::Array(vec![first, value]);
        }
        None => {
            contact.x_properties.insert(name.to_string(), value);
        }
    }
}

fn parse_related(line: &ContentLine) -> Related {
    let types = line
        .param("TYPE")
        .flat_map(|v| v.split(','))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let pref = line.param("PREF").find_map(|p| p.parse().ok());
    let is_text = line.param("VALUE").any(|v| v.eq_ignore_ascii_case("text"));
    if is_text {
        let text = unescape(&line.value, Escape::Text);
        Related {
            uri: None,
            types,
            text_value: (!text.is_empty()).then_some(text),
            pref,
        }
    } else {
        let uri = unescape(line.value.trim(), Escape::Uri);
        Related {
            uri: (!uri.is_empty()).then_some(uri),
            types,
            text_value: None,
            pref,
        }
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Fold a content line at [`VCARD_FOLD_WIDTH`] octets without splitting a character.
fn fold(line: &str, out: &mut String) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > VCARD_FOLD_WIDTH {
            out.push_str("\r\n ");
            // the leading space counts toward the continuation line
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
}

fn push_property(out: &mut String, name: &str, params: &str, value: &str) {
    let line = format!("{name}{params}:{}", escape(value, escape_for(name)));
    fold(&line, out);
}

/// Render a contact as a vCard 4.0 card.
pub fn render_vcard(contact: &Contact) -> String {
    let mut out = String::new();
    fold("BEGIN:VCARD", &mut out);
    fold(&format!("VERSION:{}", contact.version), &mut out);
    push_property(&mut out, "FN", "", &contact.fn_name);
    if let Some(uid) = contact.uid() {
        push_property(&mut out, "UID", "", uid);
    }
    if let Some(rev) = &contact.rev {
        push_property(&mut out, "REV", "", &format_revision(rev));
    }
    for prop in TextProperty::ALL {
        if let Some(value) = contact.text(prop) {
            push_property(&mut out, prop.name(), "", value);
        }
    }
    if let Some(geo) = contact.geo {
        push_property(&mut out, "GEO", "", &geo.to_uri());
    }
    for prop in ListProperty::ALL {
        for value in contact.list(prop) {
            push_property(&mut out, prop.name(), "", value);
        }
    }
    for related in &contact.related {
        let mut params = String::new();
        if related.uri().is_none() {
            params.push_str(";VALUE=text");
        }
        if !related.types.is_empty() {
            params.push_str(";TYPE=");
            params.push_str(&related.types.join(","));
        }
        if let Some(pref) = related.pref {
            params.push_str(&format!(";PREF={pref}"));
        }
        match related.uri() {
            Some(uri) => push_property(&mut out, "RELATED", &params, uri),
            None => {
                let text = related.text_value.as_deref().unwrap_or_default();
                fold(&format!("RELATED{params}:{}", escape(text, Escape::Text)), &mut out);
            }
        }
    }
    for (pid, uri) in &contact.clientpidmap {
        let uri = uri.as_str().map_or_else(|| uri.to_string(), str::to_string);
        push_property(&mut out, "CLIENTPIDMAP", "", &format!("{pid};{uri}"));
    }
    for (name, value) in &contact.x_properties {
        match value {
            JsonValue::String(s) => push_property(&mut out, name, "", s),
            JsonValue::Array(items) => {
                for item in items {
                    let text = item.as_str().map_or_else(|| item.to_string(), str::to_string);
                    push_property(&mut out, name, "", &text);
                }
            }
            other => push_property(&mut out, name, "", &other.to_string()),
        }
    }
    fold("END:VCARD", &mut out);
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_typical_card() {
        let text = "BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
FN:Jane Doe\r\n\
N:Doe;Jane;;;\r\n\
UID:urn:uuid:1234\r\n\
REV:20240601T100000Z\r\n\
item1.EMAIL;TYPE=work:jane@work.example\r\n\
EMAIL:jane@home.example\r\n\
NICKNAME:JD,Janey\r\n\
NOTE:Met at the conference\\, great talk\\nSecond line\r\n\
GEO:geo:37.386013,-122.082932\r\n\
RELATED;TYPE=friend,colleague;PREF=1:urn:uuid:bob\r\n\
RELATED;VALUE=text;TYPE=parent:Mom\r\n\
X-TWITTER:@jane\r\n\
END:VCARD\r\n";
        let c = parse_vcard(text).expect("parse");
        assert_eq!(c.fn_name, "Jane Doe");
        assert_eq!(c.n.as_deref(), Some("Doe;Jane;;;"));
        assert_eq!(c.uid(), Some("urn:uuid:1234"));
        assert!(c.rev.is_some());
        assert_eq!(c.email, vec!["jane@work.example", "jane@home.example"]);
        assert_eq!(c.nickname, vec!["JD", "Janey"]);
        assert_eq!(
            c.note.as_deref(),
            Some("Met at the conference, great talk\nSecond line")
        );
        assert_eq!(c.geo, Some(Geo(37.386013, -122.082932)));
        assert_eq!(c.related.len(), 2);
        assert_eq!(c.related[0].types, vec!["friend", "colleague"]);
        assert_eq!(c.related[0].pref, Some(1));
        assert_eq!(c.related[1].text_value.as_deref(), Some("Mom"));
        assert!(c.related[1].uri().is_none());
        assert_eq!(c.x_properties["X-TWITTER"], json!("@jane"));
    }

    #[test]
    fn unfolds_continuation_lines() {
        let text = "BEGIN:VCARD\nVERSION:4.0\nFN:Jane\nNOTE:This is a long\n  note that was folded\nEND:VCARD\n";
        let c = parse_vcard(text).expect("parse");
        assert_eq!(c.note.as_deref(), Some("This is a long note that was folded"));
    }

    #[test]
    fn render_folds_long_lines_on_char_boundaries() {
        let mut c = Contact::new("Jane").expect("contact");
        c.note = Some("é".repeat(100));
        let text = render_vcard(&c);
        for line in text.split("\r\n") {
            assert!(line.len() <= VCARD_FOLD_WIDTH, "{line}");
        }
        assert_eq!(parse_vcard(&text).expect("parse").note, c.note);
    }

    #[test]
    fn render_then_parse_keeps_fields() {
        let mut c = Contact::new("Jane; \"JD\", Doe").expect("contact").with_uid("jane");
        c.rev = parse_revision("2024-06-01T10:00:00Z");
        c.adr = vec![";;1 Main St\\, Apt 2;Springfield;;;".into()];
        c.categories = vec!["friends, close".into(), "work".into()];
        c.related.push(Related::to_uri("urn:uuid:bob", &["friend"]));
        c.related.push(Related::to_text("Mom; the best", &["parent"]));
        c.clientpidmap.insert("1".into(), json!("urn:uuid:device"));
        c.x_properties.insert("X-ALIAS".into(), json!(["a", "b"]));

        let back = parse_vcard(&render_vcard(&c)).expect("parse");
        assert_eq!(back, c);
    }

    #[test]
    fn targetless_reference_stays_targetless() {
        let mut c = Contact::new("Jane").expect("contact").with_uid("jane");
        c.related.push(Related {
            types: vec!["friend".into()],
            ..Related::default()
        });
        let text = render_vcard(&c);
        assert!(text.contains("RELATED;VALUE=text;TYPE=friend:\r\n"), "{text}");
        assert_eq!(parse_vcard(&text).expect("parse").related, c.related);
    }

    #[test]
    fn rejects_cards_without_fn_or_begin() {
        assert!(parse_vcard("FN:Jane\n").is_err());
        assert!(parse_vcard("BEGIN:VCARD\nVERSION:4.0\nEND:VCARD\n").is_err());
        assert!(parse_vcard("BEGIN:VCARD\nFN:Jane\n").is_err());
    }
}
