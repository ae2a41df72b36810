//! Build configuration errors

use thiserror::Error;

/// Errors that can occur while loading or resolving the build configuration
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to parse config file {path}: {message}")]
    ParseFailed { path: String, message: String },

    #[error("invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
