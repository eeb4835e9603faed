//! CLI error types.

use lookback_core::LookbackError;
use thiserror::Error;

/// Errors raised by the `lookback` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Run file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Run file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Run file parsed but describes an invalid run.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Environment override holds an unusable value.
    #[error("Invalid value for {name}: {reason}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Command line argument holds an unusable value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Pricing failed.
    #[error(transparent)]
    Pricing(#[from] LookbackError),

    /// Results could not be written.
    #[error("Failed to write output: {0}")]
    Output(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

impl From<csv::Error> for CliError {
    fn from(err: csv::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
