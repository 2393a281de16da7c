//! Error types for secfix-ir
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::patch_synthesis::domain::TemplateError;

/// Main error type for secfix-ir operations
#[derive(Debug, Error)]
pub enum SecfixError {
    /// Configuration error (invalid catalog, out-of-range limits, bad signatures)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fix template could not be instantiated
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Fragment could not be spliced at its coordinate
    #[error("Splice error: {0}")]
    Splice(String),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SecfixError {
    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        SecfixError::Analysis(msg.into())
    }

    /// Create a splice error
    pub fn splice(msg: impl Into<String>) -> Self {
        SecfixError::Splice(msg.into())
    }
}

/// Result type alias for secfix operations
pub type Result<T> = std::result::Result<T, SecfixError>;
