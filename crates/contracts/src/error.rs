//! Layered error definitions.
//!
//! Grouped by origin: config / estimator / buffer.

use thiserror::Error;

/// Unified error type for the workspace.
#[derive(Debug, Error)]
pub enum BufferError {
    // ===== Configuration errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Estimator errors =====
    /// The period estimate and the counted number of missing measurements
    /// contradict each other.
    #[error(
        "estimator desync for missing-measurement count {num_missing}: \
         estimate={estimate}, mean={mean}, corrected={corrected}, num_updates={num_updates}"
    )]
    EstimatorDesync {
        num_missing: usize,
        estimate: f64,
        mean: f64,
        corrected: f64,
        num_updates: usize,
    },

    // ===== Buffer errors =====
    /// Placeholder expansion was requested for a source whose estimator is
    /// not initialized yet.
    #[error("placeholder requested for uninitialized source '{source_id}'")]
    UninitializedSource { source_id: String },

    // ===== Generic errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl BufferError {
    /// Create a configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an uninitialized-source error
    pub fn uninitialized_source(source_id: impl Into<String>) -> Self {
        Self::UninitializedSource {
            source_id: source_id.into(),
        }
    }
}
