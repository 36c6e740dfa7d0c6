// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Trellis integration tests.
//!
//! # Components
//!
//! - [`FixtureTree`] - Temporary provider directories with definition files
//! - [`MockPlugin`] - Configurable plugin recording what it was built from

pub mod fixture;
pub mod mock_plugin;

pub use fixture::FixtureTree;
pub use mock_plugin::{mock_constructors, MockConstructor, MockPlugin};
