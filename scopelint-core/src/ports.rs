//! Port traits abstracting all I/O away from the pipeline.

use crate::error::ExecutionError;
use camino::{Utf8Path, Utf8PathBuf};
use scopelint_types::{ChangeSet, ChangeStatus, LineScope};
use std::time::SystemTime;

/// The point in history changes are measured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Uncommitted working-tree state only.
    Local,
    /// Everything changed since this ancestor commit, plus local changes.
    Commit(String),
}

/// Read-only VCS queries.
pub trait ChangeProvider: Send + Sync {
    /// Absolute repository root, or `None` outside a repository.
    fn root(&self) -> anyhow::Result<Option<Utf8PathBuf>>;

    fn head_reference(&self) -> anyhow::Result<Option<String>>;

    fn merge_base_reference(&self) -> anyhow::Result<Option<String>>;

    /// Every changed file under `root`, keyed by absolute path.
    fn changed_files(
        &self,
        root: &Utf8Path,
        tracked_only: bool,
        baseline: &Baseline,
    ) -> anyhow::Result<ChangeSet>;

    /// Lines of `path` changed since `baseline`.
    ///
    /// `status` is `None` for a file that is not part of the change set.
    fn changed_lines(
        &self,
        path: &Utf8Path,
        status: Option<ChangeStatus>,
        baseline: &Baseline,
    ) -> anyhow::Result<LineScope>;
}

/// The line scope implied by `status` alone, when no history lookup is needed.
///
/// - no status: the file did not change, nothing is in scope
/// - added or unknown: every line is in scope
/// - in-place modification: `None`, the backend has to look the lines up
pub fn scope_without_history(status: Option<ChangeStatus>) -> Option<LineScope> {
    match status {
        None => Some(LineScope::nothing()),
        Some(s) if s.is_in_place_modification() => None,
        Some(_) => Some(LineScope::All),
    }
}

/// Raw tool output as last stored, with its storage time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedOutput {
    pub output: String,
    pub stored_at: SystemTime,
}

/// Storage for raw tool output keyed by (tool name, absolute file path).
///
/// Staleness is decided by the caller; implementations only store and
/// return entries.
pub trait ResultCache: Send + Sync {
    fn get(&self, tool: &str, path: &Utf8Path) -> anyhow::Result<Option<CachedOutput>>;
    fn put(&self, tool: &str, path: &Utf8Path, output: &str) -> anyhow::Result<()>;
}

/// Runs `program arguments... path` and returns its combined output.
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        arguments: &[String],
        path: &Utf8Path,
    ) -> Result<String, ExecutionError>;
}

/// Answers whether a program can be executed.
pub trait ProgramLocator: Send + Sync {
    fn is_installed(&self, program: &str) -> bool;
}
