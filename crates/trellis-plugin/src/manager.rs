// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin managers.
//!
//! A [`PluginManager`] owns the discovery stack for one plugin type, a
//! [`DefaultFactory`] sharing that discovery, and an optional
//! [`FallbackPolicy`]. Managers are assembled with [`PluginManagerBuilder`],
//! either by hand or from a [`TrellisConfig`].

use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use trellis_config::TrellisConfig;
use trellis_core::{
    Configuration, Definition, DefinitionFormat, DefinitionMap, DirectorySet, Discovery,
    TrellisError,
};
use trellis_discovery::{
    cache_for, parser_for, CacheBackend, DefinitionAlter, DefinitionCache, DefinitionParser,
    Deriver, DirectoryDiscovery, NullDefinitionCache, ProcessedDiscovery, Scanner,
    DEFAULT_ID_KEY,
};

use crate::factory::{ConstructorRegistry, DefaultFactory, PluginFactory};
use crate::fallback::{policy_from_config, FallbackPolicy};

/// Entry point for one plugin type: definitions, instances, and fallback.
pub struct PluginManager<P: ?Sized> {
    discovery: Arc<ProcessedDiscovery>,
    factory: DefaultFactory<P>,
    fallback: Option<Box<dyn FallbackPolicy>>,
}

impl<P: ?Sized> PluginManager<P> {
    /// Start building a manager.
    pub fn builder() -> PluginManagerBuilder<P> {
        PluginManagerBuilder::new()
    }

    /// Builder pre-populated from configuration; register constructors, then build.
    ///
    /// `backend` stores parsed definitions when `[cache] enabled` is true.
    pub fn from_config(
        config: &TrellisConfig,
        backend: Arc<dyn CacheBackend>,
    ) -> Result<PluginManagerBuilder<P>, TrellisError> {
        PluginManagerBuilder::from_config(config, backend)
    }

    /// Create a plugin instance, applying the fallback policy when the id is missing.
    ///
    /// Any failure of the fallback plugin is [`TrellisError::FallbackExhausted`]
    /// carrying the fallback's own error; the fallback is tried once and never
    /// chained.
    pub fn create_instance(
        &self,
        plugin_id: &str,
        configuration: Configuration,
    ) -> Result<Box<P>, TrellisError> {
        let Some(policy) = &self.fallback else {
            return self.factory.create_instance(plugin_id, configuration);
        };

        let retry_configuration = configuration.clone();
        let original = match self.factory.create_instance(plugin_id, configuration) {
            Err(err) if err.is_not_found() => err,
            other => return other,
        };

        let definitions = self.discovery.get_definitions()?;
        let Some(fallback_id) =
            policy.fallback_plugin_id(plugin_id, &retry_configuration, &definitions)
        else {
            return Err(original);
        };

        if fallback_id == plugin_id {
            return Err(TrellisError::FallbackExhausted {
                requested: plugin_id.to_string(),
                fallback: fallback_id,
                source: Box::new(original),
            });
        }

        tracing::warn!(
            requested = plugin_id,
            fallback = %fallback_id,
            "plugin not found, using fallback"
        );

        self.factory
            .create_instance(&fallback_id, retry_configuration)
            .map_err(|err| TrellisError::FallbackExhausted {
                requested: plugin_id.to_string(),
                fallback: fallback_id,
                source: Box::new(err),
            })
    }

    pub fn get_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<Definition>, TrellisError> {
        self.discovery.get_definition(plugin_id, exception_on_invalid)
    }

    pub fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        self.discovery.get_definitions()
    }

    pub fn has_definition(&self, plugin_id: &str) -> Result<bool, TrellisError> {
        self.discovery.has_definition(plugin_id)
    }

    /// Drop memoized definitions so the next lookup rediscovers them.
    ///
    /// Per-file cache entries are kept and revalidated by mtime.
    pub fn clear_cached_definitions(&self) -> Result<(), TrellisError> {
        self.discovery.clear_cached_definitions()
    }

    /// The processed discovery backing this manager.
    pub fn discovery(&self) -> &Arc<ProcessedDiscovery> {
        &self.discovery
    }

    pub fn constructors(&self) -> &ConstructorRegistry<P> {
        self.factory.constructors()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<P: ?Sized> Discovery for PluginManager<P> {
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        PluginManager::get_definitions(self)
    }

    fn get_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<Definition>, TrellisError> {
        PluginManager::get_definition(self, plugin_id, exception_on_invalid)
    }
}

impl<P: ?Sized> std::fmt::Debug for PluginManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("constructors", self.factory.constructors())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl<P: ?Sized> std::fmt::Debug for PluginManagerBuilder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManagerBuilder")
            .field("constructors", &self.constructors)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Assembles a [`PluginManager`].
///
/// By default definitions come from YAML files under the configured
/// directories with no cache. [`PluginManagerBuilder::source`] replaces file
/// discovery with any other [`Discovery`].
pub struct PluginManagerBuilder<P: ?Sized> {
    directories: DirectorySet,
    format: DefinitionFormat,
    file_suffix: Option<String>,
    parser: Option<Arc<dyn DefinitionParser>>,
    exclude: Option<Regex>,
    id_key: String,
    cache: Option<Arc<dyn DefinitionCache>>,
    source: Option<Box<dyn Discovery>>,
    derivers: Vec<(String, Box<dyn Deriver>)>,
    defaults: Map<String, Value>,
    alterers: Vec<Box<dyn DefinitionAlter>>,
    installed_providers: Option<Vec<String>>,
    memoize: bool,
    constructors: ConstructorRegistry<P>,
    fallback: Option<Box<dyn FallbackPolicy>>,
}

impl<P: ?Sized> PluginManagerBuilder<P> {
    pub fn new() -> Self {
        Self {
            directories: DirectorySet::new(),
            format: DefinitionFormat::default(),
            file_suffix: None,
            parser: None,
            exclude: None,
            id_key: DEFAULT_ID_KEY.to_string(),
            cache: None,
            source: None,
            derivers: Vec::new(),
            defaults: Map::new(),
            alterers: Vec::new(),
            installed_providers: None,
            memoize: true,
            constructors: ConstructorRegistry::new(),
            fallback: None,
        }
    }

    /// Builder carrying every setting from `config`.
    pub fn from_config(
        config: &TrellisConfig,
        backend: Arc<dyn CacheBackend>,
    ) -> Result<Self, TrellisError> {
        let discovery = &config.discovery;
        let mut builder = Self::new()
            .directories(discovery.directory_set())
            .format(discovery.format)
            .file_suffix(discovery.effective_suffix())
            .id_key(discovery.id_key.clone())
            .cache(cache_for(
                config.cache.enabled,
                &config.cache.key_suffix,
                backend,
            ));

        if let Some(pattern) = &discovery.exclude_pattern {
            let exclude = Regex::new(pattern).map_err(|e| {
                TrellisError::Config(format!("invalid exclude pattern `{pattern}`: {e}"))
            })?;
            builder = builder.exclude(exclude);
        }

        if let Some(installed) = &config.manager.installed_providers {
            builder = builder.installed_providers(installed.iter().cloned());
        }

        builder.fallback = policy_from_config(&config.manager);
        Ok(builder)
    }

    pub fn directories(mut self, directories: DirectorySet) -> Self {
        self.directories = directories;
        self
    }

    /// Add one provider directory after those already present.
    pub fn directory(
        mut self,
        provider: impl Into<String>,
        path: impl Into<std::path::PathBuf>,
    ) -> Self {
        self.directories.add(provider, path);
        self
    }

    /// Definition format; also decides the parser and default suffix.
    pub fn format(mut self, format: DefinitionFormat) -> Self {
        self.format = format;
        self
    }

    pub fn file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = Some(suffix.into());
        self
    }

    /// Use a custom parser instead of the one for the configured format.
    pub fn parser(mut self, parser: Arc<dyn DefinitionParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn exclude(mut self, pattern: Regex) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }

    pub fn cache(mut self, cache: Arc<dyn DefinitionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Read definitions from `discovery` instead of scanning directories.
    ///
    /// Directory, format, parser, exclude, id key, and cache settings are ignored.
    pub fn source(mut self, discovery: impl Discovery + 'static) -> Self {
        self.source = Some(Box::new(discovery));
        self
    }

    pub fn deriver(mut self, name: impl Into<String>, deriver: impl Deriver + 'static) -> Self {
        self.derivers.push((name.into(), Box::new(deriver)));
        self
    }

    pub fn defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn alter(mut self, alter: impl DefinitionAlter + 'static) -> Self {
        self.alterers.push(Box::new(alter));
        self
    }

    pub fn installed_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed_providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Rediscover on every lookup instead of memoizing the processed map.
    pub fn without_memo(mut self) -> Self {
        self.memoize = false;
        self
    }

    /// Register the constructor for one implementation class.
    pub fn constructor<F>(mut self, class: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&str, Configuration, &Definition) -> Result<Box<P>, TrellisError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.register(class, constructor);
        self
    }

    pub fn constructors(mut self, constructors: ConstructorRegistry<P>) -> Self {
        self.constructors = constructors;
        self
    }

    pub fn fallback(mut self, policy: impl FallbackPolicy + 'static) -> Self {
        self.fallback = Some(Box::new(policy));
        self
    }

    /// Remove any fallback policy, including one set from configuration.
    pub fn no_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn build(self) -> PluginManager<P> {
        let inner: Box<dyn Discovery> = match self.source {
            Some(source) => source,
            None => {
                let parser = self.parser.unwrap_or_else(|| parser_for(self.format));
                let suffix = self
                    .file_suffix
                    .unwrap_or_else(|| parser.format().default_suffix().to_string());
                let mut scanner = Scanner::new(suffix);
                if let Some(exclude) = self.exclude {
                    scanner = scanner.with_exclude(exclude);
                }
                let cache = self
                    .cache
                    .unwrap_or_else(|| Arc::new(NullDefinitionCache));
                Box::new(
                    DirectoryDiscovery::new(self.directories, scanner, parser, cache)
                        .with_id_key(self.id_key),
                )
            }
        };

        let mut processed = ProcessedDiscovery::new(inner).with_defaults(self.defaults);
        for (name, deriver) in self.derivers {
            processed.register_deriver(name, deriver);
        }
        for alter in self.alterers {
            processed.add_alter(alter);
        }
        if let Some(installed) = self.installed_providers {
            processed = processed.with_installed_providers(installed);
        }
        if !self.memoize {
            processed = processed.without_memo();
        }

        let discovery = Arc::new(processed);
        let factory = DefaultFactory::new(discovery.clone(), self.constructors);

        PluginManager {
            discovery,
            factory,
            fallback: self.fallback,
        }
    }
}

impl<P: ?Sized> Default for PluginManagerBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
