// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Trellis plugin framework.
//!
//! This crate provides the error type, the definition and directory-set data
//! model, and the trait seams ([`Discovery`], [`Plugin`], [`Configurable`])
//! shared by the discovery, factory, and manager crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{Result, TrellisError};
pub use traits::{merge_configuration, Configurable, Discovery, Plugin};
pub use types::{
    Configuration, Definition, DefinitionFormat, DefinitionMap, DirectorySet,
    DERIVATIVE_SEPARATOR,
};
