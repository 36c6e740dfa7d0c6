// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback policies for missing plugins.

use trellis_config::{FallbackStrategy, ManagerConfig};
use trellis_core::{Configuration, DefinitionMap};

/// Chooses a replacement id when a requested plugin does not exist.
pub trait FallbackPolicy: Send + Sync {
    /// Replacement for `plugin_id`, or `None` to report the plugin as missing.
    fn fallback_plugin_id(
        &self,
        plugin_id: &str,
        configuration: &Configuration,
        definitions: &DefinitionMap,
    ) -> Option<String>;
}

impl<F> FallbackPolicy for F
where
    F: Fn(&str, &Configuration, &DefinitionMap) -> Option<String> + Send + Sync,
{
    fn fallback_plugin_id(
        &self,
        plugin_id: &str,
        configuration: &Configuration,
        definitions: &DefinitionMap,
    ) -> Option<String> {
        self(plugin_id, configuration, definitions)
    }
}

/// Always falls back to one fixed plugin id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignatedFallback {
    plugin_id: String,
}

impl DesignatedFallback {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }
}

impl FallbackPolicy for DesignatedFallback {
    fn fallback_plugin_id(
        &self,
        _plugin_id: &str,
        _configuration: &Configuration,
        _definitions: &DefinitionMap,
    ) -> Option<String> {
        Some(self.plugin_id.clone())
    }
}

/// Falls back to the first defined plugin in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstAvailableFallback {
    provider: Option<String>,
}

impl FirstAvailableFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only consider definitions contributed by `provider`.
    pub fn from_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
        }
    }
}

impl FallbackPolicy for FirstAvailableFallback {
    fn fallback_plugin_id(
        &self,
        plugin_id: &str,
        _configuration: &Configuration,
        definitions: &DefinitionMap,
    ) -> Option<String> {
        definitions
            .values()
            .filter(|def| def.id != plugin_id)
            .find(|def| match &self.provider {
                Some(provider) => def.provider == *provider,
                None => true,
            })
            .map(|def| def.id.clone())
    }
}

/// Policy selected by a manager configuration, if any.
pub fn policy_from_config(config: &ManagerConfig) -> Option<Box<dyn FallbackPolicy>> {
    match config.fallback_strategy {
        FallbackStrategy::None => None,
        FallbackStrategy::Designated => config
            .fallback_plugin
            .as_ref()
            .map(|id| Box::new(DesignatedFallback::new(id.clone())) as Box<dyn FallbackPolicy>),
        FallbackStrategy::FirstAvailable => Some(Box::new(match &config.fallback_provider {
            Some(provider) => FirstAvailableFallback::from_provider(provider.clone()),
            None => FirstAvailableFallback::new(),
        })),
    }
}
