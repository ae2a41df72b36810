//! Platform-specific operation errors

use thiserror::Error;

/// Errors that can occur during platform-specific operations
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("command not found: '{command}'. Make sure it is installed and added to your PATH")]
    CommandNotFound { command: String },

    #[error("{platform} is not supported for code signing")]
    UnsupportedPlatform { platform: String },
}
