// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured-text parsers for definition files.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use trellis_core::{DefinitionFormat, TrellisError};

/// Parses the contents of one definition file.
pub trait DefinitionParser: Send + Sync {
    /// Parse `content` read from `path`.
    ///
    /// Returns `Ok(None)` for a document that holds nothing (blank, comments
    /// only, or an explicit null).
    fn parse(&self, content: &str, path: &Path) -> Result<Option<Value>, TrellisError>;

    /// The format this parser reads.
    fn format(&self) -> DefinitionFormat;
}

/// YAML definition files (`*.yml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl DefinitionParser for YamlParser {
    fn parse(&self, content: &str, path: &Path) -> Result<Option<Value>, TrellisError> {
        let blank = content
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#') || line == "---");
        if blank {
            return Ok(None);
        }

        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| TrellisError::invalid_definition(path, format!("invalid YAML: {e}")))?;

        Ok((!value.is_null()).then_some(value))
    }

    fn format(&self) -> DefinitionFormat {
        DefinitionFormat::Yaml
    }
}

/// TOML definition files (`*.toml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl DefinitionParser for TomlParser {
    fn parse(&self, content: &str, path: &Path) -> Result<Option<Value>, TrellisError> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| TrellisError::invalid_definition(path, format!("invalid TOML: {e}")))?;

        if table.is_empty() {
            return Ok(None);
        }

        serde_json::to_value(table)
            .map(Some)
            .map_err(|e| TrellisError::invalid_definition(path, format!("unrepresentable TOML value: {e}")))
    }

    fn format(&self) -> DefinitionFormat {
        DefinitionFormat::Toml
    }
}

/// Parser for the given file format.
pub fn parser_for(format: DefinitionFormat) -> Arc<dyn DefinitionParser> {
    match format {
        DefinitionFormat::Yaml => Arc::new(YamlParser),
        DefinitionFormat::Toml => Arc::new(TomlParser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_mapping_parses_to_object() {
        let yaml = "id: markdown\nlabel: Markdown\nweight: 2\nsettings:\n  safe: true\n";
        let value = YamlParser.parse(yaml, Path::new("m.yml")).unwrap().unwrap();
        assert_eq!(
            value,
            json!({ "id": "markdown", "label": "Markdown", "weight": 2, "settings": { "safe": true } })
        );
    }

    #[test]
    fn yaml_blank_and_comment_only_are_empty() {
        assert!(YamlParser.parse("", Path::new("e.yml")).unwrap().is_none());
        assert!(YamlParser.parse("# nothing here\n\n", Path::new("e.yml")).unwrap().is_none());
        assert!(YamlParser.parse("~\n", Path::new("e.yml")).unwrap().is_none());
    }

    #[test]
    fn yaml_syntax_error_is_invalid_definition() {
        let err = YamlParser
            .parse("id: [unclosed\n", Path::new("/defs/broken.yml"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid YAML"), "got: {msg}");
        assert!(msg.contains("/defs/broken.yml"), "got: {msg}");
    }

    #[test]
    fn toml_table_parses_to_object() {
        let toml = "id = \"teaser\"\nclass = \"Teaser\"\n\n[settings]\nlength = 200\n";
        let value = TomlParser.parse(toml, Path::new("t.toml")).unwrap().unwrap();
        assert_eq!(
            value,
            json!({ "id": "teaser", "class": "Teaser", "settings": { "length": 200 } })
        );
    }

    #[test]
    fn toml_empty_document_is_empty() {
        assert!(TomlParser.parse("# only a comment\n", Path::new("t.toml")).unwrap().is_none());
    }

    #[test]
    fn toml_syntax_error_is_invalid_definition() {
        let err = TomlParser.parse("id = ", Path::new("t.toml")).unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn parser_for_matches_format() {
        assert_eq!(parser_for(DefinitionFormat::Yaml).format(), DefinitionFormat::Yaml);
        assert_eq!(parser_for(DefinitionFormat::Toml).format(), DefinitionFormat::Toml);
    }
}
