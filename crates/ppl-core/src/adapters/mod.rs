//! # Format Adapters
//!
//! Per-contact text formats and folder-level bulk I/O.
//!
//! Every adapter implements [`FormatAdapter`]: parse one contact from text,
//! render one contact to text, and decide whether an existing file needs
//! rewriting. [`ContactFormat`] is the closed set of supported formats.

pub mod folder;
pub mod markdown;
pub mod vcard;
pub mod yaml;

pub use folder::{
    ExportSummary, FolderImport, bulk_export, bulk_import, list_files, resolve_text_references,
};
pub use markdown::MarkdownAdapter;
pub use vcard::VcardAdapter;
pub use yaml::YamlAdapter;

use crate::contact::Contact;
use crate::types::PplError;
use std::cmp::Ordering;

// =============================================================================
// ADAPTER TRAIT
// =============================================================================

/// Text codec for a single contact.
pub trait FormatAdapter {
    /// Parse one contact.
    fn import_one(&self, text: &str) -> Result<Contact, PplError>;

    /// Render one contact.
    fn export_one(&self, contact: &Contact) -> Result<String, PplError>;

    /// Whether writing `candidate` over `existing` would change anything.
    ///
    /// A newer candidate always writes, an older one never does. With equal
    /// revisions the rendered text decides. Unreadable existing text is
    /// always replaced.
    fn text_changed(&self, existing: &str, candidate: &Contact) -> bool {
        let Ok(current) = self.import_one(existing) else {
            return true;
        };
        match candidate.compare_rev(&current) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self
                .export_one(candidate)
                .map_or(true, |rendered| rendered != existing),
        }
    }
}

// =============================================================================
// CONTACT FORMATS
// =============================================================================

/// A per-contact file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactFormat {
    Vcard,
    Yaml,
    Markdown,
}

static VCARD: VcardAdapter = VcardAdapter;
static YAML: YamlAdapter = YamlAdapter;
static MARKDOWN: MarkdownAdapter = MarkdownAdapter;

impl ContactFormat {
    pub const ALL: [Self; 3] = [Self::Vcard, Self::Yaml, Self::Markdown];

    /// The adapter implementing this format.
    #[must_use]
    pub fn adapter(self) -> &'static dyn FormatAdapter {
        match self {
            Self::Vcard => &VCARD,
            Self::Yaml => &YAML,
            Self::Markdown => &MARKDOWN,
        }
    }

    /// File extensions recognized on import; the first is used on export.
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Vcard => &["vcf", "vcard"],
            Self::Yaml => &["yaml", "yml"],
            Self::Markdown => &["md", "markdown"],
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// Short name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vcard => "vcard",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
        }
    }

    /// Human label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vcard => "VCF",
            Self::Yaml => "YAML",
            Self::Markdown => "Markdown",
        }
    }

    /// `source` value of inconsistencies found in a folder of this format.
    #[must_use]
    pub const fn folder_source(self) -> &'static str {
        match self {
            Self::Vcard => "vcf_folder",
            Self::Yaml => "yaml_folder",
            Self::Markdown => "markdown_folder",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, PplError> {
        match name.to_ascii_lowercase().as_str() {
            "vcard" | "vcf" => Ok(Self::Vcard),
            "yaml" | "yml" => Ok(Self::Yaml),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(PplError::ConfigError(format!(
                "unknown contact format '{other}' (expected vcard, yaml or markdown)"
            ))),
        }
    }

    /// Whether `path` has one of this format's extensions.
    #[must_use]
    pub fn matches(self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}

impl std::fmt::Display for ContactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TESTS
// =============================================================================
