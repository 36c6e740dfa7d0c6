// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: non-empty names,
//! compilable patterns, unique providers, and strategy prerequisites.

use std::collections::HashSet;

use regex::Regex;

use crate::diagnostic::ConfigError;
use crate::model::{FallbackStrategy, TrellisConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TrellisConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let discovery = &config.discovery;

    if let Some(suffix) = &discovery.file_suffix {
        if suffix.trim().is_empty() {
            errors.push(ConfigError::validation(
                "discovery.file_suffix must not be empty",
            ));
        }
    }

    if discovery.id_key.trim().is_empty() {
        errors.push(ConfigError::validation("discovery.id_key must not be empty"));
    }

    if let Some(pattern) = &discovery.exclude_pattern {
        if let Err(e) = Regex::new(pattern) {
            errors.push(ConfigError::validation(format!(
                "discovery.exclude_pattern `{pattern}` is not a valid regular expression: {e}"
            )));
        }
    }

    let mut seen_providers = HashSet::new();
    for (i, dir) in discovery.directories.iter().enumerate() {
        if dir.provider.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "discovery.directories[{i}].provider must not be empty"
            )));
        } else if !seen_providers.insert(dir.provider.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate provider `{}` in [[discovery.directories]]; list all its paths in one entry",
                dir.provider
            )));
        }
        if dir.paths.is_empty() {
            errors.push(ConfigError::validation(format!(
                "discovery.directories[{i}].paths must list at least one directory"
            )));
        }
    }

    if config.cache.enabled && config.cache.key_suffix.trim().is_empty() {
        errors.push(ConfigError::validation(
            "cache.key_suffix must not be empty when the cache is enabled",
        ));
    }

    let manager = &config.manager;
    match manager.fallback_strategy {
        FallbackStrategy::Designated => match &manager.fallback_plugin {
            Some(id) if !id.trim().is_empty() => {}
            _ => errors.push(ConfigError::validation(
                "manager.fallback_plugin is required when fallback_strategy is `designated`",
            )),
        },
        FallbackStrategy::None | FallbackStrategy::FirstAvailable => {}
    }

    if let Some(installed) = &manager.installed_providers {
        for (i, provider) in installed.iter().enumerate() {
            if provider.trim().is_empty() {
                errors.push(ConfigError::validation(format!(
                    "manager.installed_providers[{i}] must not be empty"
                )));
            }
        }
    }

    if config.logging.level.parse::<tracing::Level>().is_err() {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` is not one of trace, debug, info, warn, error",
            config.logging.level
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
