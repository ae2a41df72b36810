#![deny(clippy::pedantic, unsafe_code)]

//! Build orchestration for single-executable applications
//!
//! The pipeline is strictly sequential: blob generation, optional output
//! cleanup, runtime duplication, signature removal, injection, re-signing.
//! Copy and inject failures are fatal; the two signature steps are
//! best-effort because an unsigned artifact is still a deliverable the
//! caller can sign out-of-band.

pub mod step;

pub use step::{BuildReport, StepOutcome, StepReport, StepSeverity};

use seapack_blob::{BlobGenerator, SeaBlobGenerator};
use seapack_config::ResolvedConfig;
use seapack_errors::Error;
use seapack_inject::{inject, InjectOptions, MACHO_SEGMENT_NAME};
use seapack_platform::{Platform, ProcessRunner};
use seapack_signing::{SignOptions, Signer};
use std::path::Path;
use std::sync::Arc;
use step::{run_best_effort, run_fatal};
use tokio::fs;
use tracing::{debug, info};

/// Name of the host runtime executable looked up on PATH when the
/// configuration does not pin one
const RUNTIME_PROGRAM: &str = "node";

/// Orchestrates one build run; owns the target binary for its duration
pub struct SeaBuilder {
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
    generator: Box<dyn BlobGenerator>,
    signer: Signer,
}

impl SeaBuilder {
    /// Builder with the real runtime build step and the host platform's
    /// signing tool
    #[must_use]
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        let platform = Platform::current();
        let generator = Box::new(SeaBlobGenerator::new(Arc::clone(&runner), RUNTIME_PROGRAM));
        let signer = Signer::with_platform(platform, Arc::clone(&runner));
        Self {
            platform,
            runner,
            generator,
            signer,
        }
    }

    /// Builder with explicit collaborators (tests use fakes here)
    #[must_use]
    pub fn with_components(
        platform: Platform,
        runner: Arc<dyn ProcessRunner>,
        generator: Box<dyn BlobGenerator>,
        signer: Signer,
    ) -> Self {
        Self {
            platform,
            runner,
            generator,
            signer,
        }
    }

    /// Run the full pipeline against a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when a fatal step (blob generation,
    /// runtime copy, injection) fails; best-effort failures are recorded in
    /// the returned report instead.
    pub async fn build(&self, config: &ResolvedConfig) -> Result<BuildReport, Error> {
        let mut steps = Vec::new();
        info!(binary = %config.binary_path.display(), "building single executable application");

        info!("generating blob");
        let blob = run_fatal(
            &mut steps,
            "generate blob",
            self.generator.generate(&config.sea_config).await,
        )?;

        if config.clean {
            info!("cleaning output directory");
            clean_output(&mut steps, &config.output_dir).await;
        }

        info!("copying runtime executable");
        run_fatal(&mut steps, "copy runtime", self.copy_runtime(config).await)?;

        info!("removing binary signature");
        run_best_effort(
            &mut steps,
            "remove signature",
            self.signer
                .sign(&config.binary_path, &SignOptions { remove: true })
                .await
                .map(|_| ()),
        );

        info!("injecting blob");
        let options = InjectOptions {
            overwrite: false,
            macho_segment_name: (self.platform == Platform::MacOS)
                .then(|| MACHO_SEGMENT_NAME.to_string()),
        };
        run_fatal(
            &mut steps,
            "inject blob",
            inject(&config.binary_path, &blob, &options).await,
        )?;

        info!("signing binary");
        run_best_effort(
            &mut steps,
            "sign binary",
            self.signer
                .sign(&config.binary_path, &SignOptions { remove: false })
                .await
                .map(|_| ()),
        );

        Ok(BuildReport {
            binary_path: config.binary_path.clone(),
            blob_size: blob.len(),
            steps,
        })
    }

    /// Duplicate the host runtime image into the output location. The copy
    /// is the only file the rest of the pipeline mutates.
    async fn copy_runtime(&self, config: &ResolvedConfig) -> Result<(), Error> {
        let runtime = match &config.runtime {
            Some(path) => path.clone(),
            None => self.runner.which(RUNTIME_PROGRAM).await?,
        };

        fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &config.output_dir))?;
        fs::copy(&runtime, &config.binary_path)
            .await
            .map_err(|e| Error::io_with_path(&e, &config.binary_path))?;
        debug!(
            runtime = %runtime.display(),
            target = %config.binary_path.display(),
            "runtime copied"
        );
        Ok(())
    }
}

/// Best-effort output directory removal; failures (directory absent,
/// permissions) are acceptable no-ops and are not recorded as warnings.
async fn clean_output(steps: &mut Vec<StepReport>, output_dir: &Path) {
    match fs::remove_dir_all(output_dir).await {
        Ok(()) => {
            steps.push(StepReport {
                name: "clean output",
                severity: StepSeverity::BestEffort,
                outcome: StepOutcome::Ok,
            });
        }
        Err(err) => {
            debug!(dir = %output_dir.display(), error = %err, "output cleanup skipped");
        }
    }
}
