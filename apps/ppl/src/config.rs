//! # Configuration
//!
//! Optional `ppl.toml` naming the graph file and the contact folders.
//!
//! ```toml
//! graph = "contacts.json"
//!
//! [folders]
//! vcard = "contacts/vcf"
//! markdown = "contacts/md"
//! yaml = "contacts/yaml"
//! ```
//!
//! Relative paths are taken as written (relative to the working directory).
//! Command-line flags override every value here.

use ppl_core::{ContactFormat, FolderSpec, PplError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ppl.toml";

/// Graph file used when neither the config nor `--graph` names one.
pub const DEFAULT_GRAPH_FILE: &str = "contacts.graphml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub graph: Option<PathBuf>,
    #[serde(default)]
    pub folders: FoldersConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoldersConfig {
    pub vcard: Option<PathBuf>,
    pub markdown: Option<PathBuf>,
    pub yaml: Option<PathBuf>,
}

impl Config {
    /// Parse a config document.
    pub fn parse(raw: &str) -> Result<Self, PplError> {
        toml::from_str(raw).map_err(|e| PplError::ConfigError(e.to_string()))
    }

    /// Load the config.
    ///
    /// An explicit path must exist. Without one, `./ppl.toml` is read if
    /// present and defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PplError> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(PplError::FileNotFound(path.to_path_buf()));
            }
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| PplError::IoError(format!("read {}: {e}", path.display())))?;
        let config = Self::parse(&raw)
            .map_err(|e| PplError::ConfigError(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// The graph path: the flag, else the config, else the default file.
    #[must_use]
    pub fn graph_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.graph.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GRAPH_FILE))
    }

    /// The configured folder for `format`, if any.
    #[must_use]
    pub fn folder(&self, format: ContactFormat) -> Option<&Path> {
        match format {
            ContactFormat::Vcard => self.folders.vcard.as_deref(),
            ContactFormat::Markdown => self.folders.markdown.as_deref(),
            ContactFormat::Yaml => self.folders.yaml.as_deref(),
        }
    }

    /// Folders to check: each flag overrides its configured counterpart.
    ///
    /// Order is vCard, Markdown, YAML.
    #[must_use]
    pub fn check_folders(
        &self,
        vcard: Option<PathBuf>,
        markdown: Option<PathBuf>,
        yaml: Option<PathBuf>,
    ) -> Vec<FolderSpec> {
        [
            (ContactFormat::Vcard, vcard),
            (ContactFormat::Markdown, markdown),
            (ContactFormat::Yaml, yaml),
        ]
        .into_iter()
        .filter_map(|(format, flag)| {
            flag.or_else(|| self.folder(format).map(Path::to_path_buf))
                .map(|path| FolderSpec::new(format, path))
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let config = Config::parse(
            "graph = \"g.json\"\n[folders]\nvcard = \"v\"\nmarkdown = \"m\"\n",
        )
        .expect("parse");
        assert_eq!(config.graph.as_deref(), Some(Path::new("g.json")));
        assert_eq!(config.folder(ContactFormat::Vcard), Some(Path::new("v")));
        assert_eq!(config.folder(ContactFormat::Markdown), Some(Path::new("m")));
        assert_eq!(config.folder(ContactFormat::Yaml), None);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::parse("").expect("parse"), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::parse("grpah = \"typo\""),
            Err(PplError::ConfigError(_))
        ));
    }

    #[test]
    fn flags_override_config() {
        let config = Config::parse("graph = \"g.json\"\n[folders]\nvcard = \"v\"\nyaml = \"y\"\n")
            .expect("parse");
        assert_eq!(config.graph_path(Some(Path::new("other.graphml"))), PathBuf::from("other.graphml"));
        assert_eq!(config.graph_path(None), PathBuf::from("g.json"));
        assert_eq!(Config::default().graph_path(None), PathBuf::from(DEFAULT_GRAPH_FILE));

        let folders = config.check_folders(Some("flag-v".into()), Some("m".into()), None);
        assert_eq!(folders.len(), 3);
        assert_eq!(folders[0].path, PathBuf::from("flag-v"));
        assert_eq!(folders[1].format, ContactFormat::Markdown);
        assert_eq!(folders[2].path, PathBuf::from("y"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/ppl.toml"))).expect_err("missing");
        assert!(matches!(err, PplError::FileNotFound(_)));
    }
}
