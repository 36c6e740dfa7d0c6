// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin factories.
//!
//! Implementations are never resolved by name at runtime. Each plugin class
//! is registered up front in a [`ConstructorRegistry`], and the
//! [`DefaultFactory`] picks the constructor named by a definition's `class`.

use std::collections::HashMap;
use std::sync::Arc;

use trellis_core::types::base_id;
use trellis_core::{Configuration, Definition, Discovery, TrellisError};

/// Builds one plugin instance from its id, configuration, and definition.
pub type Constructor<P> =
    Box<dyn Fn(&str, Configuration, &Definition) -> Result<Box<P>, TrellisError> + Send + Sync>;

/// Creates plugin instances by id.
pub trait PluginFactory<P: ?Sized>: Send + Sync {
    /// Create an instance of `plugin_id`.
    ///
    /// Returns [`TrellisError::NotFound`] when no definition exists for the id.
    fn create_instance(
        &self,
        plugin_id: &str,
        configuration: Configuration,
    ) -> Result<Box<P>, TrellisError>;
}

/// Constructors keyed by implementation (class) name.
pub struct ConstructorRegistry<P: ?Sized> {
    constructors: HashMap<String, Constructor<P>>,
}

impl<P: ?Sized> ConstructorRegistry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor for `class`, replacing any previous one.
    pub fn register<F>(&mut self, class: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&str, Configuration, &Definition) -> Result<Box<P>, TrellisError>
            + Send
            + Sync
            + 'static,
    {
        let class = class.into();
        if self
            .constructors
            .insert(class.clone(), Box::new(constructor))
            .is_some()
        {
            tracing::debug!(class = %class, "constructor replaced");
        }
        self
    }

    /// Constructor registered for `class`.
    pub fn get(&self, class: &str) -> Option<&Constructor<P>> {
        self.constructors.get(class)
    }

    /// Returns true if a constructor is registered for `class`.
    pub fn contains(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<P: ?Sized> Default for ConstructorRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized> std::fmt::Debug for ConstructorRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorRegistry")
            .field("classes", &self.classes())
            .finish()
    }
}

/// Factory resolving definitions through a shared discovery.
///
/// The constructor is chosen by the definition's `class`. A definition
/// without one uses its base plugin id, so `menu_block:main` resolves to the
/// `menu_block` constructor.
pub struct DefaultFactory<P: ?Sized> {
    discovery: Arc<dyn Discovery>,
    constructors: ConstructorRegistry<P>,
}

impl<P: ?Sized> DefaultFactory<P> {
    pub fn new(discovery: Arc<dyn Discovery>, constructors: ConstructorRegistry<P>) -> Self {
        Self {
            discovery,
            constructors,
        }
    }

    pub fn constructors(&self) -> &ConstructorRegistry<P> {
        &self.constructors
    }

    /// Class name used to pick the constructor for `definition`.
    pub fn implementation_of(definition: &Definition) -> &str {
        definition
            .class
            .as_deref()
            .unwrap_or_else(|| base_id(&definition.id))
    }
}

impl<P: ?Sized> PluginFactory<P> for DefaultFactory<P> {
    fn create_instance(
        &self,
        plugin_id: &str,
        configuration: Configuration,
    ) -> Result<Box<P>, TrellisError> {
        let definition = self
            .discovery
            .get_definition(plugin_id, true)?
            .ok_or_else(|| TrellisError::not_found(plugin_id))?;

        let class = Self::implementation_of(&definition);
        let constructor =
            self.constructors
                .get(class)
                .ok_or_else(|| TrellisError::UnknownImplementation {
                    plugin_id: plugin_id.to_string(),
                    class: class.to_string(),
                })?;

        tracing::debug!(plugin_id, class, "creating plugin instance");
        constructor(plugin_id, configuration, &definition)
    }
}
