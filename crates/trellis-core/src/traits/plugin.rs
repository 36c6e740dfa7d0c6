// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait for instantiated plugins.

use crate::types::{self, Definition};

/// The base trait every plugin instance implements.
///
/// Instances are owned by whoever asked for them; managers keep no reference
/// after construction.
pub trait Plugin: Send + Sync + 'static {
    /// The id the plugin was created under (the fallback id if a fallback was used).
    fn plugin_id(&self) -> &str;

    /// The definition the plugin was built from.
    fn definition(&self) -> &Definition;

    /// Base id of a derived plugin, or the full id otherwise.
    fn base_id(&self) -> &str {
        types::base_id(self.plugin_id())
    }

    /// Derivative id, if this plugin is a derivative.
    fn derivative_id(&self) -> Option<&str> {
        types::derivative_id(self.plugin_id())
    }
}
