// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin instantiation for the Trellis framework.
//!
//! Provides the [`PluginFactory`] seam with its constructor-registry based
//! [`DefaultFactory`], the [`FallbackPolicy`] implementations used when a
//! requested plugin is missing, and the [`PluginManager`] tying discovery,
//! factory, and fallback together.

pub mod factory;
pub mod fallback;
pub mod manager;

pub use factory::{Constructor, ConstructorRegistry, DefaultFactory, PluginFactory};
pub use fallback::{policy_from_config, DesignatedFallback, FallbackPolicy, FirstAvailableFallback};
pub use manager::{PluginManager, PluginManagerBuilder};
