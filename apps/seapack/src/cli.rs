//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// seapack - package Node.js applications as single executables
#[derive(Parser)]
#[command(name = "seapack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Package Node.js applications as single self-contained executables")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file (default: seapack.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the full embed-and-sign pipeline
    #[command(alias = "b")]
    Build {
        /// Name of the binary to build
        #[arg(long)]
        bin: Option<String>,

        /// Output directory
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Path to the SEA configuration JSON file
        #[arg(long, value_name = "PATH")]
        sea_config: Option<PathBuf>,

        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,

        /// Host runtime executable to copy (default: node on PATH)
        #[arg(long, value_name = "PATH")]
        runtime: Option<PathBuf>,
    },

    /// Sign a binary with the platform's code-signing tool
    Sign {
        /// File to sign
        file: PathBuf,

        /// Strip the existing signature instead of applying one
        #[arg(long)]
        remove: bool,
    },

    /// Inject a pre-generated blob into a binary
    Inject {
        /// Target binary (a copy of the host runtime)
        binary: PathBuf,

        /// File holding the blob to inject
        blob: PathBuf,

        /// Replace an existing payload
        #[arg(long)]
        overwrite: bool,

        /// Require the named Mach-O segment in the target
        #[arg(long, value_name = "NAME")]
        macho_segment: Option<String>,
    },
}
