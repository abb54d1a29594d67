//! On-disk formats
//!
//! JSON is the native format; YAML is accepted for hand-edited files. The
//! format is picked from the file extension.

use crate::error::ConfigError;
use std::path::Path;
use topomap_core::TopologyDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Format for `path`; no extension means JSON
    ///
    /// # Errors
    /// - `ConfigError::UnsupportedFormat` for any other extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(Self::Yaml)
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Decode a document; blank content is the default document
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the content is not a valid document
    pub fn decode(self, content: &str, path: &Path) -> Result<TopologyDocument, ConfigError> {
        if content.trim().is_empty() {
            return Ok(TopologyDocument::default());
        }
        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| ConfigError::parse_error(path, e)),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::parse_error(path, e)),
        }
    }

    /// Encode a document
    ///
    /// # Errors
    /// - `ConfigError::Serialize` if encoding fails
    pub fn encode(self, document: &TopologyDocument, path: &Path) -> Result<String, ConfigError> {
        match self {
            Self::Json => serde_json::to_string_pretty(document)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| ConfigError::serialize_error(path, e)),
            Self::Yaml => serde_yaml::to_string(document).map_err(|e| ConfigError::serialize_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topomap_core::{Node, Settings};

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.YML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.yaml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("topomap")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("a.toml")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn blank_content_is_default_document() {
        let doc = Format::Json.decode("  \n", Path::new("a.json")).unwrap();
        assert_eq!(doc, TopologyDocument::default());
    }

    #[test]
    fn yaml_document_decodes() {
        let raw = "settings:\n  snapToGrid: false\nnodes:\n  - id: gw\n    name: Gateway\n    x: 10.0\n    y: 20.0\n";
        let doc = Format::Yaml.decode(raw, Path::new("a.yaml")).unwrap();
        assert!(!doc.settings.snap_to_grid);
        assert_eq!(doc.nodes[0].id.as_str(), "gw");
        assert_eq!(doc.nodes[0].x, Some(10.0));
    }

    #[test]
    fn json_encoding_uses_camel_case() {
        let doc = TopologyDocument::new(Settings::default(), vec![Node::new("a", "A").with_primary_parent("b")]);
        let text = Format::Json.encode(&doc, Path::new("a.json")).unwrap();
        assert!(text.contains("\"primaryParentId\": \"b\""));
        assert!(text.contains("\"snapToGrid\": true"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = Format::Json.decode("{ nodes: ", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
