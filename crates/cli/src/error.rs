//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Scenario file not found
    #[error("Scenario file not found: {path}")]
    ScenarioNotFound { path: String },

    /// Scenario parsing error
    #[error("Failed to parse scenario: {message}")]
    ScenarioParse { message: String },

    /// Scenario validation error
    #[error("Scenario validation failed: {message}")]
    ScenarioValidation { message: String },

    /// Replay execution error
    #[error("Replay execution failed: {message}")]
    ReplayExecution { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn scenario_not_found(path: impl Into<String>) -> Self {
        Self::ScenarioNotFound { path: path.into() }
    }

    pub fn scenario_parse(message: impl Into<String>) -> Self {
        Self::ScenarioParse {
            message: message.into(),
        }
    }

    pub fn scenario_validation(message: impl Into<String>) -> Self {
        Self::ScenarioValidation {
            message: message.into(),
        }
    }

    pub fn replay_execution(message: impl Into<String>) -> Self {
        Self::ReplayExecution {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
