#![deny(clippy::pedantic, unsafe_code)]

//! SEA blob generation
//!
//! The blob is produced by the host runtime itself: `node
//! --experimental-sea-config <config>` serializes the application described
//! by the SEA config JSON and writes it to the path the config's `output`
//! key names. This crate runs that build step and reads the result back.

use async_trait::async_trait;
use seapack_errors::{BlobError, Error};
use seapack_platform::ProcessRunner;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Produces the serialized application payload from a config file.
///
/// One-method seam so the orchestrator can be driven by a fake in tests.
#[async_trait]
pub trait BlobGenerator: Send + Sync {
    /// Materialize the blob described by `sea_config` and return its bytes.
    ///
    /// # Errors
    ///
    /// Any build-step or read failure is an error; a partial blob is never
    /// returned.
    async fn generate(&self, sea_config: &Path) -> Result<Vec<u8>, Error>;
}

/// The subset of the SEA config this crate needs; the schema is owned by
/// the host runtime.
#[derive(Debug, Deserialize)]
struct SeaConfig {
    output: Option<PathBuf>,
}

/// `BlobGenerator` backed by the real runtime build step
pub struct SeaBlobGenerator {
    runner: Arc<dyn ProcessRunner>,
    node: PathBuf,
}

impl SeaBlobGenerator {
    pub fn new(runner: Arc<dyn ProcessRunner>, node: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            node: node.into(),
        }
    }
}

#[async_trait]
impl BlobGenerator for SeaBlobGenerator {
    async fn generate(&self, sea_config: &Path) -> Result<Vec<u8>, Error> {
        let node = self.node.to_string_lossy();
        let config_arg = sea_config.to_string_lossy();

        self.runner
            .run(node.as_ref(), &["--experimental-sea-config", config_arg.as_ref()])
            .await
            .map_err(|e| {
                Error::from(BlobError::GenerationFailed {
                    message: e.to_string(),
                })
            })?;

        let output = blob_output_path(sea_config).await?;
        debug!(output = %output.display(), "reading generated blob");
        fs::read(&output).await.map_err(|e| {
            Error::from(BlobError::ReadFailed {
                path: output.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Resolve the blob output path declared by the SEA config, relative to the
/// config file's own directory.
async fn blob_output_path(sea_config: &Path) -> Result<PathBuf, Error> {
    let content = fs::read_to_string(sea_config)
        .await
        .map_err(|e| Error::io_with_path(&e, sea_config))?;
    let config: SeaConfig = serde_json::from_str(&content).map_err(|e| {
        Error::from(BlobError::GenerationFailed {
            message: format!("invalid SEA config {}: {e}", sea_config.display()),
        })
    })?;

    let output = config.output.ok_or_else(|| BlobError::MissingOutputPath {
        config_path: sea_config.display().to_string(),
    })?;
    if output.is_absolute() {
        Ok(output)
    } else {
        let base = sea_config.parent().unwrap_or_else(|| Path::new("."));
        Ok(base.join(output))
    }
}
