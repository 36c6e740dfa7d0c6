// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The discovery trait implemented by every definition source.

use std::sync::Arc;

use crate::error::TrellisError;
use crate::types::{Definition, DefinitionMap};

/// A source of plugin definitions.
///
/// Only [`Discovery::get_definitions`] is required. The lookup methods are
/// derived from it and may be overridden when a source can answer them more
/// cheaply.
pub trait Discovery: Send + Sync {
    /// Returns every definition, keyed by plugin id.
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError>;

    /// Returns one definition.
    ///
    /// A missing id is [`TrellisError::NotFound`] when `exception_on_invalid`
    /// is true and `Ok(None)` otherwise.
    fn get_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<Definition>, TrellisError> {
        let mut definitions = self.get_definitions()?;
        lookup(definitions.remove(plugin_id), plugin_id, exception_on_invalid)
    }

    /// Returns true if a definition exists for `plugin_id`.
    fn has_definition(&self, plugin_id: &str) -> Result<bool, TrellisError> {
        Ok(self.get_definition(plugin_id, false)?.is_some())
    }
}

/// Apply the not-found policy to the result of a definition lookup.
pub fn lookup(
    found: Option<Definition>,
    plugin_id: &str,
    exception_on_invalid: bool,
) -> Result<Option<Definition>, TrellisError> {
    match found {
        Some(definition) => Ok(Some(definition)),
        None if exception_on_invalid => Err(TrellisError::not_found(plugin_id)),
        None => Ok(None),
    }
}

impl<D: Discovery + ?Sized> Discovery for Arc<D> {
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        (**self).get_definitions()
    }

    fn get_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<Definition>, TrellisError> {
        (**self).get_definition(plugin_id, exception_on_invalid)
    }

    fn has_definition(&self, plugin_id: &str) -> Result<bool, TrellisError> {
        (**self).has_definition(plugin_id)
    }
}

impl<D: Discovery + ?Sized> Discovery for Box<D> {
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        (**self).get_definitions()
    }

    fn get_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<Definition>, TrellisError> {
        (**self).get_definition(plugin_id, exception_on_invalid)
    }

    fn has_definition(&self, plugin_id: &str) -> Result<bool, TrellisError> {
        (**self).has_definition(plugin_id)
    }
}
