//! Process execution with captured output
//!
//! External tools are invoked through the `ProcessRunner` trait so that
//! callers (signer, blob generator, orchestrator) can be tested against
//! fakes without spawning real OS processes.

use async_trait::async_trait;
use seapack_errors::{Error, PlatformError};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Trait for spawning external commands and capturing their output
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, returning stdout as text on success.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::ProcessExecutionFailed` if the process cannot
    /// be spawned or exits non-zero; the error carries the composed command
    /// line and captured stderr. Invocations are one-shot: no retries.
    async fn run(&self, program: &str, args: &[&str]) -> Result<String, Error>;

    /// Find the path to an executable on the search path.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::CommandNotFound` if `program` is not present.
    async fn which(&self, program: &str) -> Result<PathBuf, Error>;
}

/// `ProcessRunner` backed by `tokio::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

/// Path lookup command of the host OS
const LOOKUP_COMMAND: &str = if cfg!(windows) { "where" } else { "which" };

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String, Error> {
        let command = render_command(program, args);
        debug!(command = %command, "running external command");

        let output = Command::new(program).args(args).output().await.map_err(|e| {
            Error::from(PlatformError::ProcessExecutionFailed {
                command: command.clone(),
                message: e.to_string(),
            })
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match output.status.code() {
                Some(code) => format!("exit code {code}: {}", stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            Err(Error::from(PlatformError::ProcessExecutionFailed {
                command,
                message,
            }))
        }
    }

    async fn which(&self, program: &str) -> Result<PathBuf, Error> {
        let output = Command::new(LOOKUP_COMMAND)
            .arg(program)
            .output()
            .await
            .map_err(|e| {
                Error::from(PlatformError::ProcessExecutionFailed {
                    command: render_command(LOOKUP_COMMAND, &[program]),
                    message: e.to_string(),
                })
            })?;

        if output.status.success() {
            let text = String::from_utf8_lossy(&output.stdout);
            let first = text.lines().next().unwrap_or("").trim();
            if !first.is_empty() {
                return Ok(PathBuf::from(first));
            }
        }
        Err(Error::from(PlatformError::CommandNotFound {
            command: program.to_string(),
        }))
    }
}
