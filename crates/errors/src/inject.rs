//! Binary injection errors

use thiserror::Error;

/// Errors that can occur while injecting a blob into a target binary
#[derive(Debug, Clone, Error)]
pub enum InjectError {
    #[error("sentinel marker not found in target binary")]
    MarkerNotFound,

    #[error("sentinel marker occurs {count} times, expected exactly one")]
    AmbiguousMarker { count: usize },

    #[error("target binary already contains an injected blob (use overwrite to replace it)")]
    BlobAlreadyInjected,

    #[error("invalid binary format: {message}")]
    InvalidBinaryFormat { message: String },

    #[error("corrupt sentinel marker: {message}")]
    CorruptMarker { message: String },
}
