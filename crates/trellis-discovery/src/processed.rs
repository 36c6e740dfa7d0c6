// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing decorator over any [`Discovery`].
//!
//! [`ProcessedDiscovery`] expands derivatives, merges default metadata, runs
//! alter hooks, and filters out definitions from providers that are not
//! installed, in that order. The processed map is memoized until
//! [`ProcessedDiscovery::clear_cached_definitions`] is called.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use serde_json::{Map, Value};
use trellis_core::{Definition, DefinitionMap, Discovery, TrellisError, DERIVATIVE_SEPARATOR};

/// Expands one base definition into derivative definitions.
///
/// The returned map is keyed by derivative id; the decorator rewrites each
/// definition's id to `{base}:{derivative}`.
pub trait Deriver: Send + Sync {
    fn derivative_definitions(
        &self,
        base: &Definition,
    ) -> Result<BTreeMap<String, Definition>, TrellisError>;
}

impl<F> Deriver for F
where
    F: Fn(&Definition) -> Result<BTreeMap<String, Definition>, TrellisError> + Send + Sync,
{
    fn derivative_definitions(
        &self,
        base: &Definition,
    ) -> Result<BTreeMap<String, Definition>, TrellisError> {
        self(base)
    }
}

/// Mutates the full definition map after discovery.
pub trait DefinitionAlter: Send + Sync {
    fn alter(&self, definitions: &mut DefinitionMap);
}

impl<F> DefinitionAlter for F
where
    F: Fn(&mut DefinitionMap) + Send + Sync,
{
    fn alter(&self, definitions: &mut DefinitionMap) {
        self(definitions)
    }
}

/// Decorator applying derivatives, defaults, alter hooks, and a provider filter.
pub struct ProcessedDiscovery {
    inner: Box<dyn Discovery>,
    derivers: HashMap<String, Box<dyn Deriver>>,
    defaults: Map<String, Value>,
    alterers: Vec<Box<dyn DefinitionAlter>>,
    installed_providers: Option<BTreeSet<String>>,
    memoize: bool,
    memo: RwLock<Option<DefinitionMap>>,
}

impl ProcessedDiscovery {
    pub fn new(inner: Box<dyn Discovery>) -> Self {
        Self {
            inner,
            derivers: HashMap::new(),
            defaults: Map::new(),
            alterers: Vec::new(),
            installed_providers: None,
            memoize: true,
            memo: RwLock::new(None),
        }
    }

    /// Register a deriver under the name definitions refer to in `deriver`.
    pub fn with_deriver(mut self, name: impl Into<String>, deriver: impl Deriver + 'static) -> Self {
        self.register_deriver(name, Box::new(deriver));
        self
    }

    pub fn register_deriver(&mut self, name: impl Into<String>, deriver: Box<dyn Deriver>) {
        self.derivers.insert(name.into(), deriver);
    }

    /// Metadata merged under every definition; values already present win.
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Append an alter hook. Hooks run in registration order.
    pub fn with_alter(mut self, alter: impl DefinitionAlter + 'static) -> Self {
        self.add_alter(Box::new(alter));
        self
    }

    pub fn add_alter(&mut self, alter: Box<dyn DefinitionAlter>) {
        self.alterers.push(alter);
    }

    /// Keep only definitions whose provider is in `providers`.
    pub fn with_installed_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed_providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Recompute definitions on every call.
    pub fn without_memo(mut self) -> Self {
        self.memoize = false;
        self
    }

    /// Forget the memoized definitions so the next call rediscovers them.
    pub fn clear_cached_definitions(&self) -> Result<(), TrellisError> {
        let mut memo = self.memo.write().map_err(|e| {
            TrellisError::Internal(format!("definition memo lock poisoned: {e}"))
        })?;
        *memo = None;
        tracing::debug!("cleared memoized definitions");
        Ok(())
    }

    fn process(&self) -> Result<DefinitionMap, TrellisError> {
        let discovered = self.inner.get_definitions()?;
        let mut definitions = self.expand_derivatives(discovered)?;

        if !self.defaults.is_empty() {
            for definition in definitions.values_mut() {
                for (key, value) in &self.defaults {
                    definition
                        .metadata
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
            }
        }

        for alter in &self.alterers {
            alter.alter(&mut definitions);
        }

        if let Some(installed) = &self.installed_providers {
            definitions.retain(|id, definition| {
                let keep = installed.contains(&definition.provider);
                if !keep {
                    tracing::debug!(plugin_id = %id, provider = %definition.provider, "provider not installed, dropping definition");
                }
                keep
            });
        }

        tracing::info!(count = definitions.len(), "processed plugin definitions");
        Ok(definitions)
    }

    fn expand_derivatives(&self, discovered: DefinitionMap) -> Result<DefinitionMap, TrellisError> {
        let mut definitions = DefinitionMap::new();

        for (id, base) in discovered {
            let Some(name) = base.deriver.as_deref() else {
                insert_definition(&mut definitions, base);
                continue;
            };

            let deriver = self.derivers.get(name).ok_or_else(|| TrellisError::InvalidDefinition {
                path: base.source.clone(),
                message: format!("plugin `{id}` names unregistered deriver `{name}`"),
            })?;

            for (derivative_id, mut derivative) in deriver.derivative_definitions(&base)? {
                derivative.id = format!("{id}{DERIVATIVE_SEPARATOR}{derivative_id}");
                derivative.deriver = None;
                if derivative.provider.is_empty() {
                    derivative.provider = base.provider.clone();
                }
                if derivative.source.is_none() {
                    derivative.source = base.source.clone();
                }
                insert_definition(&mut definitions, derivative);
            }
        }

        Ok(definitions)
    }
}

/// Insert `definition`, logging when it replaces one with the same id.
fn insert_definition(definitions: &mut DefinitionMap, definition: Definition) {
    let id = definition.id.clone();
    let provider = definition.provider.clone();
    if let Some(previous) = definitions.insert(id.clone(), definition) {
        tracing::debug!(
            plugin_id = %id,
            overridden = %previous.provider,
            by = %provider,
            "definition overridden by derivative expansion"
        );
    }
}

impl Discovery for ProcessedDiscovery {
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        if !self.memoize {
            return self.process();
        }

        {
            let memo = self.memo.read().map_err(|e| {
                TrellisError::Internal(format!("definition memo lock poisoned: {e}"))
            })?;
            if let Some(definitions) = memo.as_ref() {
                return Ok(definitions.clone());
            }
        }

        let definitions = self.process()?;
        let mut memo = self.memo.write().map_err(|e| {
            TrellisError::Internal(format!("definition memo lock poisoned: {e}"))
        })?;
        *memo = Some(definitions.clone());
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_discovery::StaticDiscovery;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn inner(defs: Vec<Definition>) -> Box<dyn Discovery> {
        Box::new(defs.into_iter().collect::<StaticDiscovery>())
    }

    fn menu_deriver(base: &Definition) -> Result<BTreeMap<String, Definition>, TrellisError> {
        let mut out = BTreeMap::new();
        for menu in ["main", "footer"] {
            let def = base.clone().with_metadata("menu", menu);
            out.insert(menu.to_string(), def);
        }
        Ok(out)
    }

    #[test]
    fn derivatives_replace_their_base() {
        let discovery = ProcessedDiscovery::new(inner(vec![
            Definition::new("menu_block", "system")
                .with_class("MenuBlock")
                .with_deriver("menus"),
            Definition::new("plain", "system"),
        ]))
        .with_deriver("menus", menu_deriver);

        let defs = discovery.get_definitions().unwrap();
        assert_eq!(
            defs.keys().collect::<Vec<_>>(),
            vec!["menu_block:footer", "menu_block:main", "plain"]
        );
        let main = &defs["menu_block:main"];
        assert_eq!(main.base_id(), "menu_block");
        assert_eq!(main.derivative_id(), Some("main"));
        assert_eq!(main.class.as_deref(), Some("MenuBlock"));
        assert_eq!(main.provider, "system");
        assert!(main.deriver.is_none());
        assert_eq!(main.get("menu"), Some(&json!("main")));
    }

    #[traced_test]
    #[test]
    fn derivative_colliding_with_plain_definition_is_logged() {
        let discovery = ProcessedDiscovery::new(inner(vec![
            Definition::new("menu_block", "system").with_deriver("menus"),
            Definition::new("menu_block:main", "custom"),
        ]))
        .with_deriver("menus", menu_deriver);

        let defs = discovery.get_definitions().unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs["menu_block:main"].provider, "custom");
        assert!(logs_contain("definition overridden by derivative expansion"));
        assert!(logs_contain("menu_block:main"));
    }

    #[test]
    fn unregistered_deriver_is_invalid_definition() {
        let discovery = ProcessedDiscovery::new(inner(vec![
            Definition::new("x", "p").with_deriver("nope"),
        ]));
        let err = discovery.get_definitions().unwrap_err();
        assert!(err.to_string().contains("unregistered deriver `nope`"));
    }

    #[test]
    fn defaults_fill_missing_metadata_only() {
        let mut defaults = Map::new();
        defaults.insert("weight".into(), json!(0));
        defaults.insert("label".into(), json!("Untitled"));

        let discovery = ProcessedDiscovery::new(inner(vec![
            Definition::new("a", "p").with_metadata("label", "Alpha"),
        ]))
        .with_defaults(defaults);

        let a = discovery.get_definition("a", true).unwrap().unwrap();
        assert_eq!(a.get("label"), Some(&json!("Alpha")));
        assert_eq!(a.get("weight"), Some(&json!(0)));
    }

    #[test]
    fn alter_hooks_run_in_order() {
        let discovery = ProcessedDiscovery::new(inner(vec![
            Definition::new("a", "p"),
            Definition::new("b", "p"),
        ]))
        .with_alter(|defs: &mut DefinitionMap| {
            defs.remove("b");
        })
        .with_alter(|defs: &mut DefinitionMap| {
            let count = defs.len();
            for def in defs.values_mut() {
                def.metadata.insert("seen".into(), json!(count));
            }
        });

        let defs = discovery.get_definitions().unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs["a"].get("seen"), Some(&json!(1)));
    }

    #[test]
    fn uninstalled_providers_are_filtered() {
        let discovery = ProcessedDiscovery::new(inner(vec![
            Definition::new("a", "core"),
            Definition::new("b", "disabled_module"),
        ]))
        .with_installed_providers(["core"]);

        let defs = discovery.get_definitions().unwrap();
        assert!(defs.contains_key("a"));
        assert!(!defs.contains_key("b"));
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Discovery for Counting {
        fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DefinitionMap::new())
        }
    }

    #[test]
    fn memo_is_reused_until_cleared() {
        let calls = Arc::new(AtomicUsize::new(0));
        let discovery = ProcessedDiscovery::new(Box::new(Counting {
            calls: calls.clone(),
        }));

        discovery.get_definitions().unwrap();
        discovery.get_definitions().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        discovery.clear_cached_definitions().unwrap();
        discovery.get_definitions().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn without_memo_always_rediscovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let discovery = ProcessedDiscovery::new(Box::new(Counting {
            calls: calls.clone(),
        }))
        .without_memo();

        discovery.get_definitions().unwrap();
        discovery.get_definitions().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
