// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams of the plugin architecture.
//!
//! [`Discovery`] turns some source of metadata into definitions, [`Plugin`] is
//! the base of every instantiated plugin, and [`Configurable`] is the optional
//! capability of plugins that carry runtime configuration.

pub mod configurable;
pub mod discovery;
pub mod plugin;

pub use configurable::{merge_configuration, Configurable};
pub use discovery::Discovery;
pub use plugin::Plugin;
