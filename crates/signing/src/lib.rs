#![deny(clippy::pedantic, unsafe_code)]

//! Code signing through the platform's native tool
//!
//! The signer wraps `codesign` (macOS) and `signtool` (Windows) behind one
//! operation. It never touches the target file itself: either the external
//! tool runs to completion or the call fails before any process is spawned.

use seapack_errors::{Error, PlatformError};
use seapack_platform::{Platform, ProcessRunner};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Options for a single signing call
#[derive(Debug, Clone, Copy, Default)]
pub struct SignOptions {
    /// Strip the existing signature instead of applying one
    pub remove: bool,
}

/// Platform-dispatching code signer
pub struct Signer {
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
}

impl Signer {
    /// Create a signer for the platform this process runs on
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self::with_platform(Platform::current(), runner)
    }

    /// Create a signer pinned to an explicit platform
    pub fn with_platform(platform: Platform, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { platform, runner }
    }

    /// Sign `file`, or strip its signature when `options.remove` is set.
    ///
    /// Returns the signing tool's standard output.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::UnsupportedPlatform` when the platform has no
    /// signing tool (no process is spawned in that case),
    /// `PlatformError::CommandNotFound` when the tool is not on PATH, and
    /// the runner's error unmodified when the tool itself fails.
    pub async fn sign(&self, file: &Path, options: &SignOptions) -> Result<String, Error> {
        let tool = self.platform.sign_tool().ok_or_else(|| {
            Error::from(PlatformError::UnsupportedPlatform {
                platform: self.platform.to_string(),
            })
        })?;

        self.runner.which(tool.program).await.map_err(|_| {
            Error::from(PlatformError::CommandNotFound {
                command: tool.program.to_string(),
            })
        })?;

        let file = file.to_string_lossy();
        let mut args: Vec<&str> = tool.args(options.remove).to_vec();
        args.push(file.as_ref());

        debug!(
            tool = tool.program,
            remove = options.remove,
            file = %file,
            "invoking signing tool"
        );
        self.runner.run(tool.program, &args).await
    }
}
