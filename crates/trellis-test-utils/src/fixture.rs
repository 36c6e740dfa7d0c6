// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary directory trees of definition files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use trellis_core::DirectorySet;

/// A temporary root holding one subdirectory per provider.
///
/// The tree is removed when the fixture is dropped.
pub struct FixtureTree {
    root: TempDir,
}

impl FixtureTree {
    /// Create an empty fixture tree.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create fixture tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Directory of `provider` (created on demand).
    pub fn provider_dir(&self, provider: &str) -> PathBuf {
        let dir = self.root.path().join(provider);
        fs::create_dir_all(&dir).expect("create provider dir");
        dir
    }

    /// Write `content` to `relative` under the provider's directory.
    pub fn write(&self, provider: &str, relative: &str, content: &str) -> PathBuf {
        let path = self.provider_dir(provider).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture parent dir");
        }
        fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Write a minimal YAML definition `{id}.yml` with an optional class.
    pub fn yaml_definition(&self, provider: &str, id: &str, class: Option<&str>) -> PathBuf {
        let mut content = format!("id: {id}\nlabel: {id} from {provider}\n");
        if let Some(class) = class {
            content.push_str(&format!("class: {class}\n"));
        }
        self.write(provider, &format!("{id}.yml"), &content)
    }

    /// Write a minimal TOML definition `{id}.toml` with an optional class.
    pub fn toml_definition(&self, provider: &str, id: &str, class: Option<&str>) -> PathBuf {
        let mut content = format!("id = \"{id}\"\nlabel = \"{id} from {provider}\"\n");
        if let Some(class) = class {
            content.push_str(&format!("class = \"{class}\"\n"));
        }
        self.write(provider, &format!("{id}.toml"), &content)
    }

    /// Set a file's modification time to `secs` seconds after the epoch.
    pub fn set_mtime(&self, path: &Path, secs: u64) {
        let file = fs::File::options()
            .write(true)
            .open(path)
            .expect("open fixture file");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("set fixture mtime");
    }

    /// Directory set over the given providers, in the given order.
    pub fn directories(&self, providers: &[&str]) -> DirectorySet {
        providers
            .iter()
            .map(|provider| (*provider, self.provider_dir(provider)))
            .collect()
    }
}

impl Default for FixtureTree {
    fn default() -> Self {
        Self::new()
    }
}
