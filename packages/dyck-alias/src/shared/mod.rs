//! Shared module - Common types and utilities
//!
//! Types shared by every feature: the host IR model lives here so feature
//! modules depend on it, never on each other.

pub mod models;

// Re-exports for convenience
pub use models::*;
