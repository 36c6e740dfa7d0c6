// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugin for factory and manager tests.

use serde_json::json;
use trellis_core::{
    merge_configuration, Configurable, Configuration, Definition, Plugin, TrellisError,
};

/// Signature shared by the mock constructors.
pub type MockConstructor =
    fn(&str, Configuration, &Definition) -> Result<Box<MockPlugin>, TrellisError>;

/// Class names and constructors covering the success and failure paths.
///
/// `MockPlugin` and `FallbackPlugin` build normally, `BrokenPlugin` always fails.
pub fn mock_constructors() -> Vec<(&'static str, MockConstructor)> {
    vec![
        ("MockPlugin", MockPlugin::construct),
        ("FallbackPlugin", MockPlugin::construct),
        ("BrokenPlugin", MockPlugin::construct_broken),
    ]
}

/// A configurable plugin that records its id, definition, and configuration.
#[derive(Debug, Clone)]
pub struct MockPlugin {
    plugin_id: String,
    definition: Definition,
    configuration: Configuration,
}

impl MockPlugin {
    /// Constructor matching the factory constructor signature.
    pub fn construct(
        plugin_id: &str,
        configuration: Configuration,
        definition: &Definition,
    ) -> Result<Box<MockPlugin>, TrellisError> {
        let mut plugin = MockPlugin {
            plugin_id: plugin_id.to_string(),
            definition: definition.clone(),
            configuration: Configuration::new(),
        };
        plugin.set_configuration(configuration);
        Ok(Box::new(plugin))
    }

    /// Constructor that always fails, for error propagation tests.
    pub fn construct_broken(
        plugin_id: &str,
        _configuration: Configuration,
        _definition: &Definition,
    ) -> Result<Box<MockPlugin>, TrellisError> {
        Err(TrellisError::Internal(format!(
            "mock plugin `{plugin_id}` refused to build"
        )))
    }

    /// The class named by the definition this plugin was built from.
    pub fn class(&self) -> Option<&str> {
        self.definition.class.as_deref()
    }
}

impl Plugin for MockPlugin {
    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    fn definition(&self) -> &Definition {
        &self.definition
    }
}

impl Configurable for MockPlugin {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = merge_configuration(self.default_configuration(), configuration);
    }

    fn default_configuration(&self) -> Configuration {
        let mut defaults = Configuration::new();
        defaults.insert("enabled".into(), json!(true));
        defaults
    }
}
