//! Error types for dyck-alias
//!
//! Provides unified error handling across the crate.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for alias analysis operations
#[derive(Debug, Error)]
pub enum AliasError {
    /// Query on a value, class or function the analysis never registered
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Host IR construct the analysis refuses to approximate
    #[error("Unsupported construct '{construct}' in function '{function}'")]
    UnsupportedConstruct { function: String, construct: String },

    /// Dangling handle or inconsistent module
    #[error("Malformed IR: {0}")]
    MalformedIr(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Module (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AliasError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AliasError::NotFound { what: what.into() }
    }

    pub fn unsupported(function: impl Into<String>, construct: impl Into<String>) -> Self {
        AliasError::UnsupportedConstruct {
            function: function.into(),
            construct: construct.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        AliasError::MalformedIr(msg.into())
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, AliasError::NotFound { .. })
    }
}

/// Result type alias for alias analysis operations
pub type Result<T> = std::result::Result<T, AliasError>;
