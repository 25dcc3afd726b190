//! Embeddable core library for scopelint.
//!
//! Provides a clap-free, I/O-abstracted entry point: resolve tools once,
//! then fix and lint every changed file on a bounded worker pool.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`ChangeProvider`](ports::ChangeProvider): which files and lines changed
//! - [`ResultCache`](ports::ResultCache): raw tool output keyed by (tool, file)
//! - [`ToolRunner`](ports::ToolRunner): spawn an external program
//! - [`ProgramLocator`](ports::ProgramLocator): is a program installed
//!
//! The [`adapters`] module provides default process/filesystem-backed
//! implementations plus in-memory ones for tests and embedding; the git
//! backend lives in [`git`].
//!
//! # Entry point
//!
//! - [`PipelineScheduler::run`](pipeline::PipelineScheduler::run): fix and lint a list of files

pub mod adapters;
mod error;
mod fix;
#[cfg(feature = "git")]
pub mod git;
mod invoker;
mod lint;
pub mod pipeline;
pub mod ports;
pub mod settings;
mod toolbox;

pub use error::ExecutionError;
pub use fix::FixOrchestrator;
pub use invoker::ToolInvoker;
pub use lint::LintOrchestrator;
pub use pipeline::PipelineScheduler;
pub use settings::{FixMode, Mode, RunSettings};
pub use toolbox::Toolbox;

// Re-export the shared types so embedders don't need scopelint-types directly.
pub use scopelint_types::{ChangeSet, ChangeStatus, FileResult, Finding, LineScope, LineSet, Report};
