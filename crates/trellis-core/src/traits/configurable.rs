// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration capability for plugins.
//!
//! Plugins that accept runtime configuration hold it themselves and expose it
//! through [`Configurable`]; nothing is mixed in.

use serde_json::Value;

use crate::types::Configuration;

/// A plugin that carries runtime configuration.
pub trait Configurable {
    /// Current configuration.
    fn configuration(&self) -> &Configuration;

    /// Replace the configuration.
    ///
    /// Implementations normally store
    /// `merge_configuration(self.default_configuration(), configuration)`.
    fn set_configuration(&mut self, configuration: Configuration);

    /// Configuration used for keys the caller did not provide.
    fn default_configuration(&self) -> Configuration {
        Configuration::new()
    }
}

/// Deep-merge `overrides` on top of `defaults`.
///
/// Nested objects merge key by key; any other value in `overrides` replaces
/// the default outright (arrays included).
pub fn merge_configuration(mut defaults: Configuration, overrides: Configuration) -> Configuration {
    for (key, value) in overrides {
        match (defaults.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                let merged = merge_configuration(std::mem::take(existing), incoming);
                *existing = merged;
            }
            (_, value) => {
                defaults.insert(key, value);
            }
        }
    }
    defaults
}
