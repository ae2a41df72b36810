#![deny(clippy::pedantic, unsafe_code)]

//! Platform abstraction layer for the seapack build pipeline.
//!
//! This crate provides the pieces of the pipeline that depend on the host
//! operating system:
//! - Platform detection as a closed enumeration
//! - The code-signing tool lookup table (tool name and argument sets)
//! - Process execution with captured output and typed errors

pub mod core;
pub mod process;
pub mod signtool;

pub use self::core::Platform;
pub use process::{ProcessRunner, TokioProcessRunner};
pub use signtool::SignTool;
