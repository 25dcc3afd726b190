//! Default port implementations.
//!
//! Process/filesystem-backed adapters for real runs, plus in-memory ones for
//! embedding and testing.

use crate::error::ExecutionError;
use crate::ports::{
    Baseline, CachedOutput, ChangeProvider, ProgramLocator, ResultCache, ToolRunner,
    scope_without_history,
};
use anyhow::Context;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use fs_err as fs;
use scopelint_types::{ChangeSet, ChangeStatus, LineScope, LineSet};
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::debug;

/// Spawns tools as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(
        &self,
        program: &str,
        arguments: &[String],
        path: &Utf8Path,
    ) -> Result<String, ExecutionError> {
        let output = Command::new(program)
            .args(arguments)
            .arg(path.as_str())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExecutionError {
                command: command_line(program, arguments, path),
                reason: e.to_string(),
            })?;

        debug!(
            program,
            path = %path,
            status = ?output.status.code(),
            "tool finished"
        );

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}

pub(crate) fn command_line(program: &str, arguments: &[String], path: &Utf8Path) -> String {
    std::iter::once(program)
        .chain(arguments.iter().map(String::as_str))
        .chain(std::iter::once(path.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks programs up like a shell would.
///
/// Absolute names are checked directly; anything else is searched for in the
/// configured directories (`PATH` by default).
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    paths: Option<OsString>,
    cwd: PathBuf,
}

impl SearchPathLocator {
    pub fn from_env() -> Self {
        Self {
            paths: std::env::var_os("PATH"),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        }
    }

    pub fn with_dirs<I, P>(dirs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let dirs: Vec<PathBuf> = dirs.into_iter().map(Into::into).collect();
        let paths = std::env::join_paths(&dirs).context("join search directories")?;
        Ok(Self {
            paths: Some(paths),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        })
    }
}

impl ProgramLocator for SearchPathLocator {
    fn is_installed(&self, program: &str) -> bool {
        let found = which::which_in(program, self.paths.as_ref(), &self.cwd).is_ok();
        debug!(program, found, "located program");
        found
    }
}

/// Answers from a fixed set of program names.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocator {
    installed: BTreeSet<String>,
}

impl InMemoryLocator {
    pub fn new<I, S>(installed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            installed: installed.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProgramLocator for InMemoryLocator {
    fn is_installed(&self, program: &str) -> bool {
        self.installed.contains(program)
    }
}

/// Directory under the home directory that holds cached tool output.
pub const CACHE_DIR: &str = ".scopelint/cache";

/// Caches raw output on disk, one file per (tool, source file).
///
/// The file's modification time is the entry's storage time. Writes are not
/// locked; concurrent writers for the same pair race and the last one wins.
#[derive(Debug, Clone)]
pub struct FsResultCache {
    root: Utf8PathBuf,
}

impl FsResultCache {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// `~/.scopelint/cache`.
    pub fn in_home_dir() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("could not determine the home directory")?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| anyhow::anyhow!("home directory is not UTF-8: {}", p.display()))?;
        Ok(Self::new(home.join(CACHE_DIR)))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `<root>/<tool>/<path without its root or prefix>`.
    pub fn entry_path(&self, tool: &str, path: &Utf8Path) -> Utf8PathBuf {
        let mut entry = self.root.join(tool);
        for component in path.components() {
            if let Utf8Component::Normal(part) = component {
                entry.push(part);
            }
        }
        entry
    }
}

impl ResultCache for FsResultCache {
    fn get(&self, tool: &str, path: &Utf8Path) -> anyhow::Result<Option<CachedOutput>> {
        let entry = self.entry_path(tool, path);
        if !entry.is_file() {
            return Ok(None);
        }
        let stored_at = fs::metadata(&entry)?
            .modified()
            .with_context(|| format!("modification time of {entry}"))?;
        let output = fs::read_to_string(&entry)?;
        Ok(Some(CachedOutput { output, stored_at }))
    }

    fn put(&self, tool: &str, path: &Utf8Path, output: &str) -> anyhow::Result<()> {
        let entry = self.entry_path(tool, path);
        if let Some(parent) = entry.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create cache dir for {entry}"))?;
        }
        fs::write(&entry, output).with_context(|| format!("write {entry}"))
    }
}

/// Process-local cache for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryResultCache {
    entries: Mutex<HashMap<(String, Utf8PathBuf), CachedOutput>>,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry with an explicit storage time.
    pub fn insert_at(&self, tool: &str, path: &Utf8Path, output: &str, stored_at: SystemTime) {
        self.lock().insert(
            (tool.to_string(), path.to_path_buf()),
            CachedOutput {
                output: output.to_string(),
                stored_at,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, Utf8PathBuf), CachedOutput>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResultCache for InMemoryResultCache {
    fn get(&self, tool: &str, path: &Utf8Path) -> anyhow::Result<Option<CachedOutput>> {
        Ok(self
            .lock()
            .get(&(tool.to_string(), path.to_path_buf()))
            .cloned())
    }

    fn put(&self, tool: &str, path: &Utf8Path, output: &str) -> anyhow::Result<()> {
        self.insert_at(tool, path, output, SystemTime::now());
        Ok(())
    }
}

/// One recorded call to [`InMemoryRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub arguments: Vec<String>,
    pub path: Utf8PathBuf,
}

/// Returns canned output per program and records every call.
///
/// Programs without canned output fail to launch.
#[derive(Debug, Default)]
pub struct InMemoryRunner {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<Invocation>>,
}

impl InMemoryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, program: &str, output: &str) -> Self {
        self.outputs.insert(program.to_string(), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ToolRunner for InMemoryRunner {
    fn run(
        &self,
        program: &str,
        arguments: &[String],
        path: &Utf8Path,
    ) -> Result<String, ExecutionError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Invocation {
                program: program.to_string(),
                arguments: arguments.to_vec(),
                path: path.to_path_buf(),
            });
        self.outputs
            .get(program)
            .cloned()
            .ok_or_else(|| ExecutionError {
                command: command_line(program, arguments, path),
                reason: "no such program".to_string(),
            })
    }
}

/// Change provider backed by fixed data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChangeProvider {
    root: Option<Utf8PathBuf>,
    head: Option<String>,
    merge_base: Option<String>,
    changes: ChangeSet,
    untracked: BTreeSet<Utf8PathBuf>,
    lines: HashMap<Utf8PathBuf, LineSet>,
}

impl InMemoryChangeProvider {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// A provider that reports no repository at all.
    pub fn outside_repository() -> Self {
        Self::default()
    }

    pub fn with_head(mut self, head: &str) -> Self {
        self.head = Some(head.to_string());
        self
    }

    pub fn with_merge_base(mut self, merge_base: &str) -> Self {
        self.merge_base = Some(merge_base.to_string());
        self
    }

    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, status: ChangeStatus) -> Self {
        self.changes.insert(path.into(), status);
        self
    }

    /// Records a file git does not track yet; it counts as added.
    pub fn with_untracked_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        self.changes.insert(path.clone(), ChangeStatus::Added);
        self.untracked.insert(path);
        self
    }

    /// Records an in-place modification touching `lines`.
    pub fn with_modified_lines(
        mut self,
        path: impl Into<Utf8PathBuf>,
        lines: impl IntoIterator<Item = u32>,
    ) -> Self {
        let path = path.into();
        self.changes
            .insert(path.clone(), ChangeStatus::ModifiedUntracked);
        self.lines.insert(path, lines.into_iter().collect());
        self
    }
}

impl ChangeProvider for InMemoryChangeProvider {
    fn root(&self) -> anyhow::Result<Option<Utf8PathBuf>> {
        Ok(self.root.clone())
    }

    fn head_reference(&self) -> anyhow::Result<Option<String>> {
        Ok(self.head.clone())
    }

    fn merge_base_reference(&self) -> anyhow::Result<Option<String>> {
        Ok(self.merge_base.clone())
    }

    fn changed_files(
        &self,
        root: &Utf8Path,
        tracked_only: bool,
        _baseline: &Baseline,
    ) -> anyhow::Result<ChangeSet> {
        let mut changes = self.changes.clone();
        changes.retain(|path, _| {
            path.starts_with(root) && !(tracked_only && self.untracked.contains(path))
        });
        Ok(changes)
    }

    fn changed_lines(
        &self,
        path: &Utf8Path,
        status: Option<ChangeStatus>,
        _baseline: &Baseline,
    ) -> anyhow::Result<LineScope> {
        if let Some(scope) = scope_without_history(status) {
            return Ok(scope);
        }
        Ok(LineScope::Lines(
            self.lines.get(path).cloned().unwrap_or_default(),
        ))
    }
}
