// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive scanning of provider directories for definition files.
//!
//! Every directory of a [`DirectorySet`] is walked completely; files whose
//! name ends with the configured suffix are collected together with the
//! provider that contributed them. The exclude pattern is applied to the
//! collected paths afterwards, so the walk itself never prunes anything.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use trellis_core::DirectorySet;
use walkdir::WalkDir;

/// Files found by a scan, in scan order, each with its provider.
///
/// A path appears at most once. If overlapping directories yield the same
/// file, the later provider takes it over and the path moves to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    files: Vec<(PathBuf, String)>,
}

impl ScanResult {
    fn push(&mut self, path: PathBuf, provider: &str) {
        self.files.push((path, provider.to_string()));
    }

    /// Keep only the last occurrence of each path, preserving scan order.
    fn dedup_keep_last(&mut self) {
        let mut seen = HashSet::with_capacity(self.files.len());
        let mut files: Vec<_> = self
            .files
            .drain(..)
            .rev()
            .filter(|(path, _)| seen.insert(path.clone()))
            .collect();
        files.reverse();
        self.files = files;
    }

    /// Iterate `(path, provider)` pairs in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files
            .iter()
            .map(|(path, provider)| (path.as_path(), provider.as_str()))
    }

    /// Scanned paths in scan order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(path, _)| path.clone()).collect()
    }

    /// Provider that contributed `path`, if it was scanned.
    pub fn provider(&self, path: &Path) -> Option<&str> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, provider)| provider.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Walks provider directories for files with a fixed suffix.
#[derive(Debug, Clone)]
pub struct Scanner {
    file_suffix: String,
    exclude: Option<Regex>,
}

impl Scanner {
    /// Create a scanner collecting files whose name ends with `file_suffix`.
    pub fn new(file_suffix: impl Into<String>) -> Self {
        Self {
            file_suffix: file_suffix.into(),
            exclude: None,
        }
    }

    /// Drop every collected path whose full path string matches `pattern`.
    pub fn with_exclude(mut self, pattern: Regex) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn file_suffix(&self) -> &str {
        &self.file_suffix
    }

    pub fn exclude(&self) -> Option<&Regex> {
        self.exclude.as_ref()
    }

    /// Scan every directory in precedence order.
    ///
    /// Missing or unreadable directories contribute nothing; a scan never fails.
    pub fn scan(&self, directories: &DirectorySet) -> ScanResult {
        let mut result = ScanResult::default();

        for (provider, paths) in directories.iter() {
            for dir in paths {
                if !dir.is_dir() {
                    tracing::debug!(provider, dir = %dir.display(), "definition directory does not exist, skipping");
                    continue;
                }
                self.walk(dir, provider, &mut result);
            }
        }

        result.dedup_keep_last();

        if let Some(exclude) = &self.exclude {
            let before = result.len();
            result
                .files
                .retain(|(path, _)| !exclude.is_match(&path.to_string_lossy()));
            tracing::debug!(
                pattern = exclude.as_str(),
                excluded = before - result.len(),
                "applied exclude pattern"
            );
        }

        tracing::debug!(
            files = result.len(),
            suffix = %self.file_suffix,
            "definition scan complete"
        );
        result
    }

    fn walk(&self, dir: &Path, provider: &str, result: &mut ScanResult) {
        let walker = WalkDir::new(dir).follow_links(false).sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(provider, dir = %dir.display(), error = %e, "cannot read entry, skipping");
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches_suffix(entry.path()) {
                result.push(entry.into_path(), provider);
            }
        }
    }

    fn matches_suffix(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.file_suffix))
    }
}
