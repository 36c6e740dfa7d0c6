// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./trellis.toml` > `~/.config/trellis/trellis.toml` > `/etc/trellis/trellis.toml`
//! with environment variable overrides via `TRELLIS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TrellisConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/trellis/trellis.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "trellis.toml";

/// Sections whose keys may be set through `TRELLIS_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["discovery", "cache", "manager", "logging"];

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trellis/trellis.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/trellis/trellis.toml` (system-wide)
/// 3. `~/.config/trellis/trellis.toml` (user XDG config)
/// 4. `./trellis.toml` (local directory)
/// 5. `TRELLIS_*` environment variables
pub fn load_config() -> Result<TrellisConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<TrellisConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TrellisConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TrellisConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TrellisConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TrellisConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Map a prefix-stripped, lowercased env var name to a dotted config path.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `cache_key_suffix` maps to `cache.key_suffix`, not `cache.key.suffix`.
/// Names that start with no known section are returned unchanged.
pub fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        match key.strip_prefix(*section).and_then(|r| r.strip_prefix('_')) {
            Some(rest) if !rest.is_empty() => return format!("{section}.{rest}"),
            _ => {}
        }
    }
    key.to_string()
}

/// Environment provider using explicit `map()` for section-to-dot mapping.
///
/// `Env::split("_")` would break keys that contain underscores.
fn env_provider() -> Env {
    Env::prefixed("TRELLIS_").map(|key| env_key_to_path(key.as_str()).into())
}
