//! Blob generation errors

use thiserror::Error;

/// Errors that can occur while generating the application blob
#[derive(Debug, Clone, Error)]
pub enum BlobError {
    #[error("blob build step failed: {message}")]
    GenerationFailed { message: String },

    #[error("blob config {config_path} does not declare an 'output' path")]
    MissingOutputPath { config_path: String },

    #[error("failed to read generated blob at {path}: {message}")]
    ReadFailed { path: String, message: String },
}
