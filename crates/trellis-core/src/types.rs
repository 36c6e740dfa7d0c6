// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by discovery, factories, and managers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::TrellisError;

/// Runtime configuration handed to a factory when a plugin is instantiated.
pub type Configuration = Map<String, Value>;

/// Definitions keyed by plugin id, iterated in id order.
pub type DefinitionMap = BTreeMap<String, Definition>;

/// Separator between a base plugin id and a derivative id (`menu_block:main`).
pub const DERIVATIVE_SEPARATOR: char = ':';

/// Metadata describing one discoverable plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Unique id within one manager's namespace.
    pub id: String,

    /// Module or package that contributed the definition.
    #[serde(default)]
    pub provider: String,

    /// Name of the registered constructor that builds instances of this plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Name of a registered deriver that expands this definition into derivatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deriver: Option<String>,

    /// File the definition was read from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Remaining plugin-type specific metadata.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Definition {
    /// Create a definition with no class, deriver, source, or metadata.
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            class: None,
            deriver: None,
            source: None,
            metadata: Map::new(),
        }
    }

    /// Set the implementation reference.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the deriver name.
    pub fn with_deriver(mut self, deriver: impl Into<String>) -> Self {
        self.deriver = Some(deriver.into());
        self
    }

    /// Insert one metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build a definition from a parsed document.
    ///
    /// `id_key` names the field holding the plugin id. The provider always comes
    /// from the caller (the directory that contributed the file), never from the
    /// document itself.
    pub fn from_value(
        value: Value,
        id_key: &str,
        provider: &str,
        source: &Path,
    ) -> Result<Self, TrellisError> {
        let Value::Object(mut fields) = value else {
            return Err(TrellisError::invalid_definition(
                source,
                "definition must be a mapping",
            ));
        };

        let id = match fields.remove(id_key) {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::String(_)) => {
                return Err(TrellisError::invalid_definition(
                    source,
                    format!("`{id_key}` must not be empty"),
                ));
            }
            Some(_) => {
                return Err(TrellisError::invalid_definition(
                    source,
                    format!("`{id_key}` must be a string"),
                ));
            }
            None => {
                return Err(TrellisError::invalid_definition(
                    source,
                    format!("missing `{id_key}`"),
                ));
            }
        };

        let class = take_optional_string(&mut fields, "class", source)?;
        let deriver = take_optional_string(&mut fields, "deriver", source)?;
        fields.remove("provider");
        fields.remove("source");

        Ok(Self {
            id,
            provider: provider.to_string(),
            class,
            deriver,
            source: Some(source.to_path_buf()),
            metadata: fields,
        })
    }

    /// Look up a metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// The part of the id before the derivative separator.
    pub fn base_id(&self) -> &str {
        base_id(&self.id)
    }

    /// The part of the id after the derivative separator, if any.
    pub fn derivative_id(&self) -> Option<&str> {
        derivative_id(&self.id)
    }
}

fn take_optional_string(
    fields: &mut Map<String, Value>,
    key: &str,
    source: &Path,
) -> Result<Option<String>, TrellisError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(TrellisError::invalid_definition(
            source,
            format!("`{key}` must be a string"),
        )),
    }
}

/// Base id of a (possibly derived) plugin id.
pub fn base_id(plugin_id: &str) -> &str {
    plugin_id
        .split_once(DERIVATIVE_SEPARATOR)
        .map_or(plugin_id, |(base, _)| base)
}

/// Derivative id of a plugin id, if it has one.
pub fn derivative_id(plugin_id: &str) -> Option<&str> {
    plugin_id
        .split_once(DERIVATIVE_SEPARATOR)
        .map(|(_, derivative)| derivative)
}

/// Ordered mapping from provider name to the directories it contributes.
///
/// Order is precedence: when two providers define the same plugin id, the one
/// added later wins. Adding more paths for a provider that is already present
/// appends to its list and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySet {
    entries: Vec<(String, Vec<PathBuf>)>,
}

impl DirectorySet {
    /// Create an empty directory set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one directory for a provider.
    pub fn add(&mut self, provider: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        let provider = provider.into();
        let path = path.into();
        match self.entries.iter_mut().find(|(name, _)| *name == provider) {
            Some((_, paths)) => paths.push(path),
            None => self.entries.push((provider, vec![path])),
        }
        self
    }

    /// Builder-style variant of [`DirectorySet::add`].
    pub fn with(mut self, provider: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.add(provider, path);
        self
    }

    /// Iterate providers and their directories in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(provider, paths)| (provider.as_str(), paths.as_slice()))
    }

    /// Provider names in precedence order.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(provider, _)| provider.as_str())
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no provider has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P, D> FromIterator<(P, D)> for DirectorySet
where
    P: Into<String>,
    D: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (P, D)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (provider, path) in iter {
            set.add(provider, path);
        }
        set
    }
}

/// File format of definition files.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DefinitionFormat {
    #[default]
    Yaml,
    Toml,
}

impl DefinitionFormat {
    /// File suffix used when none is configured explicitly.
    pub fn default_suffix(self) -> &'static str {
        match self {
            DefinitionFormat::Yaml => ".yml",
            DefinitionFormat::Toml => ".toml",
        }
    }
}
