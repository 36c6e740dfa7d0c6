// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Trellis plugin managers.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use trellis_core::{DefinitionFormat, DirectorySet};

/// Top-level Trellis configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrellisConfig {
    /// Where and how definition files are found.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Parsed-definition cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Manager behavior: fallback and provider filtering.
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Definition file discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Definition file format.
    #[serde(default)]
    pub format: DefinitionFormat,

    /// File name suffix to match. Defaults to the format's suffix (`.yml` or `.toml`).
    #[serde(default)]
    pub file_suffix: Option<String>,

    /// Field holding the plugin id inside each definition.
    #[serde(default = "default_id_key")]
    pub id_key: String,

    /// Regular expression; files whose path matches are skipped.
    #[serde(default)]
    pub exclude_pattern: Option<String>,

    /// Provider directories in precedence order (later wins on collisions).
    #[serde(default)]
    pub directories: Vec<DirectoryConfig>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            format: DefinitionFormat::default(),
            file_suffix: None,
            id_key: default_id_key(),
            exclude_pattern: None,
            directories: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    /// Suffix to scan for, falling back to the format default.
    pub fn effective_suffix(&self) -> &str {
        self.file_suffix
            .as_deref()
            .unwrap_or_else(|| self.format.default_suffix())
    }

    /// Build the ordered directory set handed to discovery.
    pub fn directory_set(&self) -> DirectorySet {
        let mut set = DirectorySet::new();
        for dir in &self.directories {
            for path in &dir.paths {
                set.add(dir.provider.clone(), path.clone());
            }
        }
        set
    }
}

fn default_id_key() -> String {
    "id".to_string()
}

/// One provider and the directories it contributes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Provider (module or package) name.
    pub provider: String,

    /// Directories scanned for this provider.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Parsed-definition cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Whether parsed definitions are cached per file.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Namespace suffix separating this manager's entries from others sharing a backend.
    #[serde(default = "default_key_suffix")]
    pub key_suffix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            key_suffix: default_key_suffix(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_key_suffix() -> String {
    "plugins".to_string()
}

/// How a manager picks a replacement for a missing plugin.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FallbackStrategy {
    /// Missing plugins are an error.
    #[default]
    None,
    /// Always fall back to `manager.fallback_plugin`.
    Designated,
    /// Fall back to the first available definition, in id order.
    FirstAvailable,
}

/// Manager configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    /// Fallback strategy for missing plugins.
    #[serde(default)]
    pub fallback_strategy: FallbackStrategy,

    /// Plugin id used by the `designated` strategy.
    #[serde(default)]
    pub fallback_plugin: Option<String>,

    /// Restricts the `first_available` strategy to one provider.
    #[serde(default)]
    pub fallback_provider: Option<String>,

    /// When set, definitions from other providers are dropped.
    #[serde(default)]
    pub installed_providers: Option<Vec<String>>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
