// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Definition discovery for the Trellis plugin framework.
//!
//! A [`Scanner`] finds definition files under provider directories, a
//! [`DefinitionParser`] turns each file into structured metadata, and a
//! [`DefinitionCache`] remembers parsed files until their mtime changes.
//! [`DirectoryDiscovery`] composes the three; [`ProcessedDiscovery`] layers
//! derivatives, defaults, alter hooks, and provider filtering on top of any
//! discovery.

pub mod cache;
pub mod directory;
pub mod parser;
pub mod processed;
pub mod scanner;
pub mod static_discovery;

pub use cache::{
    cache_for, file_mtime, CacheBackend, CacheEntry, DefinitionCache, FileDefinitionCache, MemoryBackend,
    NullDefinitionCache, StoredEntry, CACHE_PREFIX,
};
pub use directory::{DirectoryDiscovery, DEFAULT_ID_KEY};
pub use parser::{parser_for, DefinitionParser, TomlParser, YamlParser};
pub use processed::{DefinitionAlter, Deriver, ProcessedDiscovery};
pub use scanner::{ScanResult, Scanner};
pub use static_discovery::StaticDiscovery;
