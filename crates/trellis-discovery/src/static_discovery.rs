// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Definitions registered in code rather than discovered on disk.

use std::sync::RwLock;

use trellis_core::{Definition, DefinitionMap, Discovery, TrellisError};

/// A discovery whose definitions are set explicitly.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    definitions: RwLock<DefinitionMap>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition.
    pub fn set_definition(&self, definition: Definition) -> Result<(), TrellisError> {
        let mut definitions = self.definitions.write().map_err(|e| {
            TrellisError::Internal(format!("static definitions lock poisoned: {e}"))
        })?;
        definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Remove a definition, returning it if it existed.
    pub fn delete_definition(&self, plugin_id: &str) -> Result<Option<Definition>, TrellisError> {
        let mut definitions = self.definitions.write().map_err(|e| {
            TrellisError::Internal(format!("static definitions lock poisoned: {e}"))
        })?;
        Ok(definitions.remove(plugin_id))
    }
}

impl FromIterator<Definition> for StaticDiscovery {
    fn from_iter<I: IntoIterator<Item = Definition>>(iter: I) -> Self {
        let definitions = iter
            .into_iter()
            .map(|definition| (definition.id.clone(), definition))
            .collect();
        Self {
            definitions: RwLock::new(definitions),
        }
    }
}

impl Discovery for StaticDiscovery {
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        let definitions = self.definitions.read().map_err(|e| {
            TrellisError::Internal(format!("static definitions lock poisoned: {e}"))
        })?;
        Ok(definitions.clone())
    }

    fn get_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<Definition>, TrellisError> {
        let definitions = self.definitions.read().map_err(|e| {
            TrellisError::Internal(format!("static definitions lock poisoned: {e}"))
        })?;
        trellis_core::traits::discovery::lookup(
            definitions.get(plugin_id).cloned(),
            plugin_id,
            exception_on_invalid,
        )
    }
}
