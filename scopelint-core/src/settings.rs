//! Clap-free settings for a fix-then-lint run.

use crate::ports::{Baseline, ChangeProvider};
use scopelint_domain::LineExpansion;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Whether, and how much of, each file is handed to fixers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixMode {
    #[default]
    Off,
    /// Fix the changed ranges only.
    ChangedLines,
    /// Fix whole files.
    AllLines,
}

/// Which history counts as "changed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Everything since the branch left the base branch, plus local changes.
    #[default]
    MergeBase,
    /// Uncommitted changes only.
    Local,
    /// The last commit plus local changes.
    LastCommit,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::MergeBase, Mode::Local, Mode::LastCommit];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::MergeBase => "merge-base",
            Mode::Local => "local",
            Mode::LastCommit => "last-commit",
        }
    }

    /// Resolves the baseline commit; a missing commit falls back to
    /// [`Baseline::Local`] (fresh repository, unknown base branch).
    pub fn baseline(self, provider: &dyn ChangeProvider) -> anyhow::Result<Baseline> {
        let commit = match self {
            Mode::Local => None,
            Mode::MergeBase => provider.merge_base_reference()?,
            Mode::LastCommit => provider.head_reference()?,
        };
        Ok(commit.map_or(Baseline::Local, Baseline::Commit))
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown mode {s:?}; expected merge-base, local or last-commit"))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for [`PipelineScheduler`](crate::PipelineScheduler).
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Worker pool size.
    pub workers: NonZeroUsize,
    pub fix: FixMode,
    /// Treat every line of every file as changed.
    pub force: bool,
    /// Read and write cached linter output. Fixers never use the cache.
    pub cache_enabled: bool,
    pub line_expansion: LineExpansion,
    pub baseline: Baseline,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fix: FixMode::Off,
            force: false,
            cache_enabled: true,
            line_expansion: LineExpansion::NONE,
            baseline: Baseline::Local,
        }
    }
}

/// The host's available parallelism, or one worker when unknown.
pub fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
