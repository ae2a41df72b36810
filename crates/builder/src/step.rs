//! Typed pipeline step results
//!
//! The pipeline distinguishes two step classes: fatal steps abort the build
//! when they fail, best-effort steps degrade to a recorded warning. The
//! classification is data carried in the report, and the continue/abort
//! policy lives here rather than in per-step catch blocks.

use seapack_errors::Error;
use std::path::PathBuf;
use tracing::warn;

/// Failure policy of a pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSeverity {
    /// Failure aborts the build
    Fatal,
    /// Failure is logged and recorded; the build continues
    BestEffort,
}

/// What happened to a step the pipeline carried on past
#[derive(Debug)]
pub enum StepOutcome {
    Ok,
    Warning(Error),
}

/// One entry in the build report
#[derive(Debug)]
pub struct StepReport {
    pub name: &'static str,
    pub severity: StepSeverity,
    pub outcome: StepOutcome,
}

/// Result of a full pipeline run that reached the terminal state
#[derive(Debug)]
pub struct BuildReport {
    /// Path of the produced executable
    pub binary_path: PathBuf,
    /// Size of the injected blob in bytes
    pub blob_size: usize,
    /// Per-step outcomes in execution order
    pub steps: Vec<StepReport>,
}

impl BuildReport {
    /// Steps that failed best-effort and were carried as warnings
    pub fn warnings(&self) -> impl Iterator<Item = (&'static str, &Error)> {
        self.steps.iter().filter_map(|step| match &step.outcome {
            StepOutcome::Warning(err) => Some((step.name, err)),
            StepOutcome::Ok => None,
        })
    }
}

/// A fatal step: the value flows onward, the error aborts the run.
pub(crate) fn run_fatal<T>(
    steps: &mut Vec<StepReport>,
    name: &'static str,
    result: Result<T, Error>,
) -> Result<T, Error> {
    let value = result?;
    steps.push(StepReport {
        name,
        severity: StepSeverity::Fatal,
        outcome: StepOutcome::Ok,
    });
    Ok(value)
}

/// A best-effort step: failure is logged and recorded, never propagated.
pub(crate) fn run_best_effort(
    steps: &mut Vec<StepReport>,
    name: &'static str,
    result: Result<(), Error>,
) {
    let outcome = match result {
        Ok(()) => StepOutcome::Ok,
        Err(err) => {
            warn!(step = name, error = %err, "step failed, continuing");
            StepOutcome::Warning(err)
        }
    };
    steps.push(StepReport {
        name,
        severity: StepSeverity::BestEffort,
        outcome,
    });
}
