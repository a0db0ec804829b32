//! # Markdown Adapter
//!
//! A contact note with YAML front matter:
//!
//! ```text
//! ---
//! FN: Jane Doe
//! UID: urn:uuid:...
//! ---
//! # Jane Doe
//!
//! Free-form note.
//!
//! ## Related
//! - friend [[Bob Smith]]
//! - parent,family Mom
//! ```
//!
//! The front matter uses the YAML adapter's mapping and is authoritative.
//! The body is rendered from it; on import, `## Related` entries that name
//! something the front matter does not already reference are appended.
//! A file without front matter still imports from its `# ` heading.

use super::FormatAdapter;
use super::yaml::{contact_from_yaml, contact_to_yaml};
use crate::contact::{Contact, Related};
use crate::primitives::URN_UUID_PREFIX;
use crate::types::PplError;
use serde_yaml::Value as YamlValue;

const DELIMITER: &str = "---";

/// Markdown-with-front-matter format adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownAdapter;

impl FormatAdapter for MarkdownAdapter {
    fn import_one(&self, text: &str) -> Result<Contact, PplError> {
        let doc = MarkdownDocument::parse(text);
        let mut contact = match doc.front_matter {
            Some(yaml) => {
                let value: YamlValue = serde_yaml::from_str(yaml)
                    .map_err(|e| PplError::DeserializationError(format!("front matter: {e}")))?;
                contact_from_yaml(value)?
            }
            None => {
                let title = doc.title().ok_or_else(|| {
                    PplError::DeserializationError(
                        "no front matter and no '# ' heading".to_string(),
                    )
                })?;
                Contact::new(title)?
            }
        };
        if contact.note.is_none() {
            contact.note = doc.note();
        }
        for entry in doc.related() {
            if !contact.related.iter().any(|known| same_target(known, &entry)) {
                contact.related.push(entry);
            }
        }
        Ok(contact)
    }

    fn export_one(&self, contact: &Contact) -> Result<String, PplError> {
        let yaml = serde_yaml::to_string(&contact_to_yaml(contact)?)
            .map_err(|e| PplError::SerializationError(e.to_string()))?;
        let mut out = format!("{DELIMITER}\n{yaml}{DELIMITER}\n# {}\n\n", contact.fn_name);
        if let Some(note) = contact.note.as_deref().filter(|n| !n.trim().is_empty()) {
            out.push_str(note);
            out.push_str("\n\n");
        }
        if !contact.related.is_empty() {
            out.push_str("## Related\n");
            let mut related: Vec<&Related> = contact.related.iter().collect();
            related.sort_by_key(|r| r.types.join(","));
            for r in related {
                let types = if r.types.is_empty() {
                    "related".to_string()
                } else if r.types.iter().any(|t| t.contains(char::is_whitespace)) {
                    format!("\"{}\"", r.types.join(","))
                } else {
                    r.types.join(",")
                };
                out.push_str(&format!("- {types} {}\n", render_target(r)));
            }
        }
        Ok(out)
    }
}

fn render_target(r: &Related) -> String {
    match (r.uri(), r.text_value.as_deref()) {
        (Some(uri), Some(text)) if uri.starts_with(URN_UUID_PREFIX) => format!("[[{text}]]"),
        (_, Some(text)) => text.to_string(),
        (Some(uri), None) => match uri.strip_prefix(URN_UUID_PREFIX) {
            Some(uid) => format!("[[{uid}]]"),
            None => uri.to_string(),
        },
        (None, None) => String::new(),
    }
}

/// Whether `b` points at something `a` already references.
///
/// Compares every identity `a` carries (URI, bare uid, text) against the
/// URI or text of `b`. Types are ignored.
fn same_target(a: &Related, b: &Related) -> bool {
    let wanted = [b.uri(), b.text_value.as_deref()];
    let names = [a.uri(), a.target_uid(), a.text_value.as_deref()];
    wanted
        .iter()
        .flatten()
        .any(|target| names.iter().flatten().any(|name| name == target))
}

// =============================================================================
// DOCUMENT STRUCTURE
// =============================================================================

/// A Markdown file split into front matter and body.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownDocument<'a> {
    /// YAML between the `---` delimiters, if the file starts with them.
    pub front_matter: Option<&'a str>,
    pub body: &'a str,
}

impl<'a> MarkdownDocument<'a> {
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        split_front_matter(text).map_or(
            Self {
                front_matter: None,
                body: text,
            },
            |(front_matter, body)| Self {
                front_matter: Some(front_matter),
                body,
            },
        )
    }

    /// Whether the front matter has a `RELATED` key.
    #[must_use]
    pub fn front_matter_has_related(&self) -> bool {
        let Some(yaml) = self.front_matter else {
            return false;
        };
        match serde_yaml::from_str::<YamlValue>(yaml) {
            Ok(YamlValue::Mapping(map)) => map
                .keys()
                .filter_map(YamlValue::as_str)
                .any(|k| k.eq_ignore_ascii_case("RELATED")),
            _ => false,
        }
    }

    /// Text of the first level-one heading.
    #[must_use]
    pub fn title(&self) -> Option<&'a str> {
        self.body
            .lines()
            .find_map(|l| l.strip_prefix("# "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Paragraphs between the title and the next heading.
    fn note(&self) -> Option<String> {
        let mut lines = self.body.lines().skip_while(|l| !l.starts_with("# "));
        lines.next()?;
        let note = lines
            .take_while(|l| !l.starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");
        let note = note.trim();
        (!note.is_empty()).then(|| note.to_string())
    }

    /// List items under the `Related` heading (any level).
    fn related_items(&self) -> Vec<&'a str> {
        let mut lines = self.body.lines().skip_while(|l| !is_related_heading(l));
        if lines.next().is_none() {
            return Vec::new();
        }
        lines
            .take_while(|l| !l.trim_start().starts_with('#'))
            .filter_map(|l| {
                let l = l.trim_start();
                l.strip_prefix("- ")
                    .or_else(|| l.strip_prefix("* "))
                    .or_else(|| l.strip_prefix("+ "))
            })
            .collect()
    }

    /// Parsed `Related` section entries.
    #[must_use]
    pub fn related(&self) -> Vec<Related> {
        self.related_items()
            .into_iter()
            .filter_map(parse_related_item)
            .collect()
    }

    /// Whether the `Related` section contains `[[wiki links]]`.
    #[must_use]
    pub fn has_wiki_links(&self) -> bool {
        self.related_items().iter().any(|item| wiki_target(item).is_some())
    }
}

fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(DELIMITER)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_related_heading(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('#') && line.trim_start_matches('#').trim().eq_ignore_ascii_case("related")
}

fn wiki_target(item: &str) -> Option<&str> {
    let start = item.find("[[")? + 2;
    let len = item[start..].find("]]")?;
    let inner = &item[start..start + len];
    // [[target|alias]]
    let target = inner.split('|').next().unwrap_or(inner).trim();
    (!target.is_empty()).then_some(target)
}

/// `type1,type2 target` where target is `[[name]]`, a URI or free text.
///
/// Types containing spaces are quoted: `"best friend,family" target`.
fn parse_related_item(item: &str) -> Option<Related> {
    let item = item.trim();
    let (types, target) = match item.strip_prefix('"') {
        Some(quoted) => quoted.split_once('"')?,
        None => item.split_once(char::is_whitespace)?,
    };
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let types = types
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let mut related = Related {
        types,
        ..Related::default()
    };
    if let Some(name) = wiki_target(target) {
        related.text_value = Some(name.to_string());
    } else if target.starts_with(URN_UUID_PREFIX) || target.starts_with("http") {
        related.uri = Some(target.to_string());
    } else {
        related.text_value = Some(target.to_string());
    }
    Some(related)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::parse_revision;

    #[test]
    fn export_layout() {
        let mut c = Contact::new("Jane Doe").expect("contact").with_uid("jane");
        c.note = Some("Met at the conference.".into());
        c.related.push(Related::to_uri("urn:uuid:bob", &["friend"]));
        c.related.push(Related::to_text("Mom", &["parent"]));
        c.related.push(Related::to_uri("https://example.com/x", &[]));

        let text = MarkdownAdapter.export_one(&c).expect("render");
        assert!(text.starts_with("---\nFN: Jane Doe\n"), "{text}");
        assert!(text.contains("---\n# Jane Doe\n\nMet at the conference.\n\n## Related\n"), "{text}");
        let section = text.split("## Related\n").nth(1).expect("related section");
        let related: Vec<&str> = section.lines().collect();
        assert_eq!(
            related,
            vec!["- related https://example.com/x", "- friend [[bob]]", "- parent Mom"]
        );
    }

    #[test]
    fn round_trip_adds_nothing_from_body() {
        let mut c = Contact::new("Jane Doe").expect("contact").with_uid("jane");
        c.rev = parse_revision("2024-06-01T00:00:00Z");
        c.note = Some("Line one\nLine two".into());
        c.related.push(Related::to_uri("urn:uuid:bob", &["friend"]));
        let mut resolved = Related::to_uri("urn:uuid:carol", &["colleague"]);
        resolved.text_value = Some("Carol".into());
        c.related.push(resolved);
        c.related.push(Related::to_text("Mom", &[]));

        let text = MarkdownAdapter.export_one(&c).expect("render");
        assert_eq!(MarkdownAdapter.import_one(&text).expect("parse"), c);
    }

    #[test]
    fn types_with_spaces_survive_the_body() {
        let mut c = Contact::new("Jane").expect("contact").with_uid("jane");
        c.related.push(Related::to_text("Bob", &["best friend", "neighbor"]));

        let text = MarkdownAdapter.export_one(&c).expect("render");
        assert!(text.contains("- \"best friend,neighbor\" Bob\n"), "{text}");
        assert_eq!(MarkdownAdapter.import_one(&text).expect("parse").related, c.related);

        let body_only = "# Jane\n\n## Related\n- \"best friend\" [[Bob]]\n";
        let parsed = MarkdownAdapter.import_one(body_only).expect("parse");
        assert_eq!(parsed.related.len(), 1);
        assert_eq!(parsed.related[0].types, vec!["best friend"]);
        assert_eq!(parsed.related[0].text_value.as_deref(), Some("Bob"));
    }

    #[test]
    fn body_entries_are_added_when_new() {
        let text = "---\nFN: Jane\nUID: jane\n---\n# Jane\n\n## Related\n- friend [[Bob Smith]]\n- parent,family Mom\n- colleague urn:uuid:carol\n";
        let c = MarkdownAdapter.import_one(text).expect("parse");
        assert_eq!(c.related.len(), 3);
        assert_eq!(c.related[0].text_value.as_deref(), Some("Bob Smith"));
        assert!(c.related[0].uri().is_none());
        assert_eq!(c.related[1].types, vec!["parent", "family"]);
        assert_eq!(c.related[2].uri(), Some("urn:uuid:carol"));
    }

    #[test]
    fn file_without_front_matter_uses_heading() {
        let text = "# Jane Doe\n\nSome notes.\n\n## Related\n- friend [[Bob]]\n";
        let c = MarkdownAdapter.import_one(text).expect("parse");
        assert_eq!(c.fn_name, "Jane Doe");
        assert_eq!(c.note.as_deref(), Some("Some notes."));
        assert_eq!(c.related.len(), 1);
        assert!(MarkdownAdapter.import_one("just text\n").is_err());
    }

    #[test]
    fn document_lint_helpers() {
        let bare = MarkdownDocument::parse("# Jane\n\n## Related\n- friend [[Bob]]\n");
        assert!(bare.front_matter.is_none());
        assert!(bare.has_wiki_links());

        let with_fm = MarkdownDocument::parse("---\nFN: Jane\n---\n# Jane\n\n## Related\n- friend [[Bob]]\n");
        assert_eq!(with_fm.front_matter, Some("FN: Jane\n"));
        assert!(with_fm.has_wiki_links());
        assert!(!with_fm.front_matter_has_related());

        let linked = MarkdownDocument::parse("---\nFN: Jane\nRELATED:\n- uri: urn:uuid:bob\n---\n# Jane\n");
        assert!(linked.front_matter_has_related());
        assert!(!linked.has_wiki_links());
    }
}
