//! Common test utilities for dyck-alias
//!
//! Shared module fixtures and assertions for the integration and property
//! tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;

// Re-export all utilities
pub use assertions::*;
pub use fixtures::*;
