//! seapack - single-executable application packager
//!
//! This is the CLI front-end for the embed-and-sign pipeline: it resolves
//! the build configuration, then drives blob generation, runtime
//! duplication, signature removal, injection, and re-signing.

mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use seapack_builder::SeaBuilder;
use seapack_config::{BuildConfig, BuildConfigOverrides};
use seapack_errors::Error;
use seapack_inject::{inject, InjectOptions};
use seapack_platform::{ProcessRunner, TokioProcessRunner};
use seapack_signing::{SignOptions, Signer};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("pipeline failed: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());

    match cli.command {
        Commands::Build {
            bin,
            out,
            sea_config,
            clean,
            runtime,
        } => {
            let mut config = BuildConfig::load_or_default(config_file(&cli.global).as_deref()).await?;
            config.merge(BuildConfigOverrides {
                bin,
                out,
                sea_config,
                clean: clean.then_some(true),
                runtime,
            });

            let base = std::env::current_dir()?;
            let resolved = config.resolve(&base)?;

            let report = SeaBuilder::new(runner).build(&resolved).await?;
            for (step, err) in report.warnings() {
                eprintln!("Warning: {step}: {err}");
            }
            println!(
                "Built {} ({} byte blob)",
                report.binary_path.display(),
                report.blob_size
            );
            Ok(())
        }

        Commands::Sign { file, remove } => {
            let output = Signer::new(runner).sign(&file, &SignOptions { remove }).await?;
            let output = output.trim();
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }

        Commands::Inject {
            binary,
            blob,
            overwrite,
            macho_segment,
        } => {
            let bytes = tokio::fs::read(&blob)
                .await
                .map_err(|e| Error::io_with_path(&e, &blob))?;
            inject(
                &binary,
                &bytes,
                &InjectOptions {
                    overwrite,
                    macho_segment_name: macho_segment,
                },
            )
            .await?;
            println!("Injected {} bytes into {}", bytes.len(), binary.display());
            Ok(())
        }
    }
}

/// Explicit `--config` wins; otherwise pick up `seapack.toml` from the
/// working directory when one exists.
fn config_file(global: &cli::GlobalArgs) -> Option<PathBuf> {
    if global.config.is_some() {
        return global.config.clone();
    }
    let default = PathBuf::from("seapack.toml");
    default.exists().then_some(default)
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
