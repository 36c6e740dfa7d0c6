// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of one-definition-per-file metadata under provider directories.
//!
//! Collision policy: when two files define the same id, the one scanned later
//! wins. Providers are scanned in [`DirectorySet`] order and files within a
//! directory in file-name order, so callers control precedence by the order
//! in which they add providers.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use trellis_core::{Definition, DefinitionMap, DirectorySet, Discovery, TrellisError};

use crate::cache::{file_mtime, CacheEntry, DefinitionCache};
use crate::parser::DefinitionParser;
use crate::scanner::Scanner;

/// Field holding the plugin id when none is configured.
pub const DEFAULT_ID_KEY: &str = "id";

/// Discovers definitions from files found by a [`Scanner`].
pub struct DirectoryDiscovery {
    directories: DirectorySet,
    scanner: Scanner,
    parser: Arc<dyn DefinitionParser>,
    cache: Arc<dyn DefinitionCache>,
    id_key: String,
}

impl DirectoryDiscovery {
    /// Create a discovery over `directories` using the given collaborators.
    pub fn new(
        directories: DirectorySet,
        scanner: Scanner,
        parser: Arc<dyn DefinitionParser>,
        cache: Arc<dyn DefinitionCache>,
    ) -> Self {
        Self {
            directories,
            scanner,
            parser,
            cache,
            id_key: DEFAULT_ID_KEY.to_string(),
        }
    }

    /// Read plugin ids from `id_key` instead of `id`.
    pub fn with_id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }

    pub fn directories(&self) -> &DirectorySet {
        &self.directories
    }

    pub fn id_key(&self) -> &str {
        &self.id_key
    }

    /// Parse `path`, returning the entry and the mtime observed before reading.
    fn load(&self, path: &Path, provider: &str) -> Result<(CacheEntry, Option<u128>), TrellisError> {
        let mtime = file_mtime(path);
        let bytes = std::fs::read(path).map_err(|source| TrellisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes)
            .map_err(|_| TrellisError::invalid_definition(path, "not valid UTF-8"))?;

        let entry = match self.parser.parse(&content, path)? {
            None => CacheEntry::Empty,
            Some(Value::Object(fields)) if fields.is_empty() => CacheEntry::Empty,
            Some(value) => CacheEntry::Definition(Definition::from_value(
                value,
                &self.id_key,
                provider,
                path,
            )?),
        };
        Ok((entry, mtime))
    }
}

impl Discovery for DirectoryDiscovery {
    fn get_definitions(&self) -> Result<DefinitionMap, TrellisError> {
        let scanned = self.scanner.scan(&self.directories);
        let mut cached = self.cache.get_multiple(&scanned.paths());
        let mut definitions = DefinitionMap::new();

        for (path, provider) in scanned.iter() {
            let hit = cached.remove(path).filter(|entry| match entry {
                CacheEntry::Definition(def) => def.provider == provider,
                CacheEntry::Empty => true,
            });

            let entry = match hit {
                Some(entry) => entry,
                None => {
                    let (entry, mtime) = self.load(path, provider)?;
                    match mtime {
                        Some(mtime) => self.cache.set(path, mtime, entry.clone()),
                        None => tracing::debug!(
                            path = %path.display(),
                            "cannot stat definition file, not caching"
                        ),
                    }
                    entry
                }
            };

            let CacheEntry::Definition(definition) = entry else {
                tracing::debug!(path = %path.display(), "definition file is empty, skipping");
                continue;
            };

            let id = definition.id.clone();
            if let Some(previous) = definitions.insert(id.clone(), definition) {
                tracing::debug!(
                    plugin_id = %id,
                    overridden = %previous.provider,
                    by = provider,
                    "definition overridden by later directory"
                );
            }
        }

        tracing::debug!(count = definitions.len(), "discovered definitions");
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileDefinitionCache, MemoryBackend, NullDefinitionCache};
    use crate::parser::{TomlParser, YamlParser};
    use serde_json::json;
    use std::fs;
    use tracing_test::traced_test;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn yaml_discovery(dirs: DirectorySet) -> DirectoryDiscovery {
        DirectoryDiscovery::new(
            dirs,
            Scanner::new(".yml"),
            Arc::new(YamlParser),
            Arc::new(NullDefinitionCache),
        )
    }

    #[test]
    fn aggregates_definitions_from_all_providers() {
        let core = tempfile::tempdir().unwrap();
        let blog = tempfile::tempdir().unwrap();
        write(&core.path().join("text.yml"), "id: text\nclass: TextFilter\n");
        write(&blog.path().join("teaser/teaser.yml"), "id: teaser\nlabel: Teaser\n");

        let discovery = yaml_discovery(
            DirectorySet::new()
                .with("core", core.path())
                .with("blog", blog.path()),
        );
        let defs = discovery.get_definitions().unwrap();

        assert_eq!(defs.len(), 2);
        assert_eq!(defs["text"].provider, "core");
        assert_eq!(defs["text"].class.as_deref(), Some("TextFilter"));
        assert_eq!(defs["teaser"].provider, "blog");
        assert_eq!(defs["teaser"].get("label"), Some(&json!("Teaser")));
        assert_eq!(
            defs["teaser"].source.as_deref(),
            Some(blog.path().join("teaser/teaser.yml").as_path())
        );
    }

    #[traced_test]
    #[test]
    fn later_directory_wins_on_collision() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(&first.path().join("x.yml"), "id: x\nlabel: first\n");
        write(&second.path().join("x.yml"), "id: x\nlabel: second\n");

        let defs = yaml_discovery(
            DirectorySet::new()
                .with("first", first.path())
                .with("second", second.path()),
        )
        .get_definitions()
        .unwrap();
        assert_eq!(defs["x"].provider, "second");
        assert_eq!(defs["x"].get("label"), Some(&json!("second")));
        assert!(logs_contain("definition overridden by later directory"));

        let reversed = yaml_discovery(
            DirectorySet::new()
                .with("second", second.path())
                .with("first", first.path()),
        )
        .get_definitions()
        .unwrap();
        assert_eq!(reversed["x"].provider, "first");
    }

    #[test]
    fn empty_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("blank.yml"), "# placeholder\n");
        write(&dir.path().join("braces.yml"), "{}\n");
        write(&dir.path().join("real.yml"), "id: real\n");

        let defs = yaml_discovery(DirectorySet::new().with("p", dir.path()))
            .get_definitions()
            .unwrap();
        assert_eq!(defs.keys().collect::<Vec<_>>(), vec!["real"]);
    }

    #[test]
    fn malformed_file_surfaces_invalid_definition() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("ok.yml"), "id: ok\n");
        write(&dir.path().join("bad.yml"), "label: no id here\n");

        let err = yaml_discovery(DirectorySet::new().with("p", dir.path()))
            .get_definitions()
            .unwrap_err();
        assert!(matches!(err, TrellisError::InvalidDefinition { .. }));
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn non_utf8_file_is_invalid_definition() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), b"id: \xff\xfe\n").unwrap();

        let err = yaml_discovery(DirectorySet::new().with("p", dir.path()))
            .get_definitions()
            .unwrap_err();
        assert!(matches!(
            err,
            TrellisError::InvalidDefinition { ref message, .. } if message == "not valid UTF-8"
        ));
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn cached_entry_records_file_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a\n");

        let backend = MemoryBackend::new();
        let discovery = DirectoryDiscovery::new(
            DirectorySet::new().with("p", dir.path()),
            Scanner::new(".yml"),
            Arc::new(YamlParser),
            Arc::new(FileDefinitionCache::new("mtime", Arc::new(backend.clone()))),
        );
        discovery.get_definitions().unwrap();

        let key = &backend.keys()[0];
        let stored = crate::cache::CacheBackend::get(&backend, key).unwrap();
        assert_eq!(Some(stored.mtime), file_mtime(&path));
    }

    #[test]
    fn custom_id_key_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.yml"), "machine_name: alpha\n");

        let defs = yaml_discovery(DirectorySet::new().with("p", dir.path()))
            .with_id_key("machine_name")
            .get_definitions()
            .unwrap();
        assert!(defs.contains_key("alpha"));
    }

    #[test]
    fn get_definition_follows_not_found_policy() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.yml"), "id: a\n");
        let discovery = yaml_discovery(DirectorySet::new().with("p", dir.path()));

        assert!(discovery.get_definition("a", true).unwrap().is_some());
        assert!(discovery.get_definition("missing", false).unwrap().is_none());
        assert!(discovery.get_definition("missing", true).unwrap_err().is_not_found());
    }

    #[test]
    fn repeated_discovery_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.yml"), "id: a\nweight: 1\n");
        write(&dir.path().join("b/b.yml"), "id: b\n");

        let backend = Arc::new(MemoryBackend::new());
        let discovery = DirectoryDiscovery::new(
            DirectorySet::new().with("p", dir.path()),
            Scanner::new(".yml"),
            Arc::new(YamlParser),
            Arc::new(FileDefinitionCache::new("idem", backend)),
        );

        let first = discovery.get_definitions().unwrap();
        let second = discovery.get_definitions().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cached_entries_are_reused_until_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a\nlabel: old\n");

        let backend = MemoryBackend::new();
        let discovery = DirectoryDiscovery::new(
            DirectorySet::new().with("p", dir.path()),
            Scanner::new(".yml"),
            Arc::new(YamlParser),
            Arc::new(FileDefinitionCache::new("reuse", Arc::new(backend.clone()))),
        );
        discovery.get_definitions().unwrap();
        assert_eq!(backend.len(), 1);

        write(&path, "id: a\nlabel: new\n");
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(42))
            .unwrap();

        let defs = discovery.get_definitions().unwrap();
        assert_eq!(defs["a"].get("label"), Some(&json!("new")));
    }

    #[test]
    fn toml_files_are_discovered_with_toml_parser() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.plugin.toml"), "id = \"a\"\nclass = \"A\"\n");

        let discovery = DirectoryDiscovery::new(
            DirectorySet::new().with("p", dir.path()),
            Scanner::new(".plugin.toml"),
            Arc::new(TomlParser),
            Arc::new(NullDefinitionCache),
        );
        let defs = discovery.get_definitions().unwrap();
        assert_eq!(defs["a"].class.as_deref(), Some("A"));
    }

    #[test]
    fn missing_directories_yield_no_definitions() {
        let defs = yaml_discovery(DirectorySet::new().with("gone", "/nonexistent/trellis"))
            .get_definitions()
            .unwrap();
        assert!(defs.is_empty());
    }
}
