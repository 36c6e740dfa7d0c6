// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-file definition cache.
//!
//! Entries are keyed by `{prefix}:{suffix}:{canonical path}`. The suffix is
//! chosen by the caller so unrelated discoveries scanning overlapping paths
//! never see each other's entries. Each entry remembers the file's
//! modification time; a lookup whose mtime no longer matches evicts the entry
//! and misses. Callers stat a file before reading it and store the entry
//! against that mtime, so an edit racing the read leaves a stale entry that
//! the next lookup evicts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use trellis_core::Definition;

/// Key prefix shared by every definition cache.
pub const CACHE_PREFIX: &str = "trellis_definitions";

/// What a file resolved to when it was last parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheEntry {
    /// The file held a definition.
    Definition(Definition),
    /// The file held nothing; remembered so it is not parsed again.
    Empty,
}

/// A cache entry together with the file mtime it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Modification time in nanoseconds since the Unix epoch.
    pub mtime: u128,
    pub entry: CacheEntry,
}

/// Key/value store behind a [`FileDefinitionCache`].
///
/// Implementations must be safe to share between threads; consistency across
/// processes is whatever the backing store provides.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<StoredEntry>;
    fn set(&self, key: String, entry: StoredEntry);
    fn delete(&self, key: &str);
    /// Remove every entry.
    fn clear(&self);
}

/// In-process backend. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<StoredEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn set(&self, key: String, entry: StoredEntry) {
        self.entries.insert(key, entry);
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// Cache of parsed definition files.
pub trait DefinitionCache: Send + Sync {
    /// Cached entry for `path`, or `None` on a miss or a stale entry.
    fn get(&self, path: &Path) -> Option<CacheEntry>;

    /// Cached entries for several paths; misses are simply absent.
    fn get_multiple(&self, paths: &[PathBuf]) -> HashMap<PathBuf, CacheEntry> {
        paths
            .iter()
            .filter_map(|path| self.get(path).map(|entry| (path.clone(), entry)))
            .collect()
    }

    /// Store the entry for `path`, parsed from the file as it was at `mtime`.
    fn set(&self, path: &Path, mtime: u128, entry: CacheEntry);

    fn delete(&self, path: &Path);
}

/// mtime-validated cache over a [`CacheBackend`].
pub struct FileDefinitionCache {
    namespace: String,
    backend: Arc<dyn CacheBackend>,
}

impl FileDefinitionCache {
    /// Create a cache whose keys are namespaced by `key_suffix`.
    pub fn new(key_suffix: &str, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            namespace: format!("{CACHE_PREFIX}:{key_suffix}"),
            backend,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, path: &Path) -> String {
        let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        format!("{}:{}", self.namespace, resolved.display())
    }
}

impl DefinitionCache for FileDefinitionCache {
    fn get(&self, path: &Path) -> Option<CacheEntry> {
        let key = self.key(path);
        let stored = self.backend.get(&key)?;

        match file_mtime(path) {
            Some(mtime) if mtime == stored.mtime => Some(stored.entry),
            _ => {
                tracing::debug!(path = %path.display(), "definition cache entry is stale, evicting");
                self.backend.delete(&key);
                None
            }
        }
    }

    fn set(&self, path: &Path, mtime: u128, entry: CacheEntry) {
        self.backend.set(self.key(path), StoredEntry { mtime, entry });
    }

    fn delete(&self, path: &Path) {
        self.backend.delete(&self.key(path));
    }
}

/// Cache that stores nothing. Used when stale definitions are unacceptable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDefinitionCache;

impl DefinitionCache for NullDefinitionCache {
    fn get(&self, _path: &Path) -> Option<CacheEntry> {
        None
    }

    fn get_multiple(&self, _paths: &[PathBuf]) -> HashMap<PathBuf, CacheEntry> {
        HashMap::new()
    }

    fn set(&self, _path: &Path, _mtime: u128, _entry: CacheEntry) {}

    fn delete(&self, _path: &Path) {}
}

/// A [`FileDefinitionCache`] when `enabled`, a [`NullDefinitionCache`] otherwise.
pub fn cache_for(
    enabled: bool,
    key_suffix: &str,
    backend: Arc<dyn CacheBackend>,
) -> Arc<dyn DefinitionCache> {
    if enabled {
        Arc::new(FileDefinitionCache::new(key_suffix, backend))
    } else {
        Arc::new(NullDefinitionCache)
    }
}

/// Modification time of `path` in nanoseconds since the Unix epoch.
pub fn file_mtime(path: &Path) -> Option<u128> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn mtime(path: &Path) -> u128 {
        file_mtime(path).unwrap()
    }

    fn entry(id: &str) -> CacheEntry {
        CacheEntry::Definition(Definition::new(id, "core"))
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");

        let cache = FileDefinitionCache::new("filters", Arc::new(MemoryBackend::new()));
        cache.set(&path, mtime(&path), entry("a"));
        assert_eq!(cache.get(&path), Some(entry("a")));
    }

    #[test]
    fn mtime_change_invalidates_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");
        set_mtime(&path, 1_000_000);

        let backend = MemoryBackend::new();
        let cache = FileDefinitionCache::new("filters", Arc::new(backend.clone()));
        cache.set(&path, mtime(&path), entry("a"));
        assert!(cache.get(&path).is_some());

        set_mtime(&path, 2_000_000);
        assert_eq!(cache.get(&path), None);
        assert!(backend.is_empty(), "stale entry should be evicted");
    }

    #[test]
    fn entry_stored_against_pre_read_mtime_is_stale_after_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");
        set_mtime(&path, 1_000_000);
        let seen = mtime(&path);

        // The file changes after it was read but before the entry is stored.
        write(&path, "id: b");
        set_mtime(&path, 2_000_000);

        let cache = FileDefinitionCache::new("filters", Arc::new(MemoryBackend::new()));
        cache.set(&path, seen, entry("a"));
        assert_eq!(cache.get(&path), None);
    }

    #[test]
    fn deleted_file_misses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");

        let cache = FileDefinitionCache::new("filters", Arc::new(MemoryBackend::new()));
        cache.set(&path, mtime(&path), entry("a"));
        fs::remove_file(&path).unwrap();
        assert_eq!(cache.get(&path), None);
    }

    #[test]
    fn negative_marker_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yml");
        write(&path, "");

        let cache = FileDefinitionCache::new("filters", Arc::new(MemoryBackend::new()));
        cache.set(&path, mtime(&path), CacheEntry::Empty);
        assert_eq!(cache.get(&path), Some(CacheEntry::Empty));
    }

    #[test]
    fn suffixes_do_not_collide_on_shared_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");

        let backend = MemoryBackend::new();
        let filters = FileDefinitionCache::new("filters", Arc::new(backend.clone()));
        let blocks = FileDefinitionCache::new("blocks", Arc::new(backend.clone()));

        filters.set(&path, mtime(&path), entry("as-filter"));
        assert_eq!(blocks.get(&path), None);

        blocks.set(&path, mtime(&path), entry("as-block"));
        assert_eq!(filters.get(&path), Some(entry("as-filter")));
        assert_eq!(blocks.get(&path), Some(entry("as-block")));
        assert_eq!(backend.len(), 2);
        assert!(backend.keys().iter().all(|k| k.starts_with(CACHE_PREFIX)));
    }

    #[test]
    fn equivalent_paths_share_one_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");
        let dotted = dir.path().join("sub").join("..").join("a.yml");

        let cache = FileDefinitionCache::new("x", Arc::new(MemoryBackend::new()));
        cache.set(&dotted, mtime(&dotted), entry("a"));
        assert_eq!(cache.get(&path), Some(entry("a")));
    }

    #[test]
    fn get_multiple_returns_only_hits() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.yml");
        let b = dir.path().join("b.yml");
        write(&a, "id: a");
        write(&b, "id: b");

        let cache = FileDefinitionCache::new("x", Arc::new(MemoryBackend::new()));
        cache.set(&a, mtime(&a), entry("a"));

        let hits = cache.get_multiple(&[a.clone(), b.clone()]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.get(&a), Some(&entry("a")));
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");

        let cache = FileDefinitionCache::new("x", Arc::new(MemoryBackend::new()));
        cache.set(&path, mtime(&path), entry("a"));
        cache.delete(&path);
        assert_eq!(cache.get(&path), None);
    }

    #[test]
    fn null_cache_never_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");

        let cache = NullDefinitionCache;
        cache.set(&path, mtime(&path), entry("a"));
        assert_eq!(cache.get(&path), None);
        assert!(cache.get_multiple(&[path]).is_empty());
    }

    #[test]
    fn cache_for_honours_enabled_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        write(&path, "id: a");
        let backend: Arc<dyn CacheBackend> = Arc::new(MemoryBackend::new());

        let enabled = cache_for(true, "x", backend.clone());
        enabled.set(&path, mtime(&path), entry("a"));
        assert!(enabled.get(&path).is_some());

        let disabled = cache_for(false, "x", backend);
        assert!(disabled.get(&path).is_none());
    }
}
