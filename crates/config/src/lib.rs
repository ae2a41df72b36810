#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build configuration for the seapack pipeline
//!
//! Configuration flows through three layers with increasing precedence:
//! built-in defaults, an optional TOML file, and caller (CLI) overrides.
//! The merged [`BuildConfig`] is then resolved exactly once against a base
//! directory into an immutable [`ResolvedConfig`] holding absolute paths.

use seapack_errors::{ConfigError, Error};
use seapack_platform::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

fn default_bin() -> String {
    "node-sea".to_string()
}

fn default_out() -> PathBuf {
    PathBuf::from(".")
}

fn default_sea_config() -> PathBuf {
    PathBuf::from("sea-config.json")
}

/// Build configuration as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Name of the binary to build, without platform suffix
    #[serde(default = "default_bin")]
    pub bin: String,
    /// Directory the binary is written to
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Path to the SEA configuration JSON file
    #[serde(default = "default_sea_config")]
    pub sea_config: PathBuf,
    /// Whether to remove the output directory before building
    #[serde(default)]
    pub clean: bool,
    /// Host runtime executable to copy; discovered on PATH when unset
    #[serde(default)]
    pub runtime: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            bin: default_bin(),
            out: default_out(),
            sea_config: default_sea_config(),
            clean: false,
            runtime: None,
        }
    }
}

/// Caller-supplied overrides, applied over file values and defaults
#[derive(Debug, Clone, Default)]
pub struct BuildConfigOverrides {
    pub bin: Option<String>,
    pub out: Option<PathBuf>,
    pub sea_config: Option<PathBuf>,
    pub clean: Option<bool>,
    pub runtime: Option<PathBuf>,
}

impl BuildConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        toml::from_str(&content).map_err(|e| {
            Error::from(ConfigError::ParseFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Load from `path` when given, otherwise start from defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is given but unreadable or invalid.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(p) => Self::load_from_file(p).await,
            None => Ok(Self::default()),
        }
    }

    /// Apply caller overrides in place; set fields win over loaded values.
    pub fn merge(&mut self, overrides: BuildConfigOverrides) {
        if let Some(bin) = overrides.bin {
            self.bin = bin;
        }
        if let Some(out) = overrides.out {
            self.out = out;
        }
        if let Some(sea_config) = overrides.sea_config {
            self.sea_config = sea_config;
        }
        if let Some(clean) = overrides.clean {
            self.clean = clean;
        }
        if let Some(runtime) = overrides.runtime {
            self.runtime = runtime.into();
        }
    }

    /// Resolve against `base` for the current platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (see [`Self::resolve_for`]).
    pub fn resolve(&self, base: &Path) -> Result<ResolvedConfig, Error> {
        self.resolve_for(base, Platform::current())
    }

    /// Resolve against `base` for an explicit platform.
    ///
    /// Resolution is a pure function of `(self, base, platform)`: paths are
    /// absolutized against `base` and the binary name gets the platform's
    /// executable suffix. Resolving twice yields identical results.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `bin` is empty or contains a
    /// path separator.
    pub fn resolve_for(&self, base: &Path, platform: Platform) -> Result<ResolvedConfig, Error> {
        if self.bin.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bin".to_string(),
                message: "binary name must not be empty".to_string(),
            }
            .into());
        }
        if self.bin.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "bin".to_string(),
                message: "binary name must not contain path separators".to_string(),
            }
            .into());
        }

        let output_dir = absolutize(base, &self.out);
        let binary = format!("{}{}", self.bin, platform.exe_suffix());

        Ok(ResolvedConfig {
            binary_path: output_dir.join(binary),
            output_dir,
            sea_config: absolutize(base, &self.sea_config),
            clean: self.clean,
            runtime: self.runtime.as_deref().map(|p| absolutize(base, p)),
        })
    }
}

/// Fully resolved build configuration; immutable after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Absolute path of the binary to produce
    pub binary_path: PathBuf,
    /// Absolute output directory
    pub output_dir: PathBuf,
    /// Absolute path of the SEA configuration JSON file
    pub sea_config: PathBuf,
    /// Whether the output directory is removed before building
    pub clean: bool,
    /// Explicit runtime executable, if configured
    pub runtime: Option<PathBuf>,
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
