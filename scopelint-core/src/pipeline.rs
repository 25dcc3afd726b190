//! The per-file fix-then-lint pipeline, fanned out over a worker pool.
//!
//! All I/O goes through the port traits, so the scheduler runs the same way
//! against git and real tools as against in-memory fakes.

use crate::fix::FixOrchestrator;
use crate::invoker::ToolInvoker;
use crate::lint::LintOrchestrator;
use crate::ports::ChangeProvider;
use crate::settings::{FixMode, RunSettings};
use crate::toolbox::Toolbox;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use scopelint_types::{ChangeStatus, FileResult, LineScope, Report};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs fixers then linters for every requested file.
pub struct PipelineScheduler {
    provider: Arc<dyn ChangeProvider>,
    fixer: FixOrchestrator,
    linter: LintOrchestrator,
    settings: RunSettings,
}

impl PipelineScheduler {
    pub fn new(
        toolbox: Arc<Toolbox>,
        invoker: ToolInvoker,
        provider: Arc<dyn ChangeProvider>,
        settings: RunSettings,
    ) -> Self {
        Self {
            provider,
            fixer: FixOrchestrator::new(
                Arc::clone(&toolbox),
                invoker.clone(),
                settings.line_expansion,
            ),
            linter: LintOrchestrator::new(toolbox, invoker, settings.cache_enabled),
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Processes `files` on a pool of `settings.workers` threads.
    ///
    /// Each entry pairs an absolute path with its change status (`None` for a
    /// file that did not change). The report is ordered by path, whatever
    /// order the workers finish in.
    pub fn run(&self, files: &[(Utf8PathBuf, Option<ChangeStatus>)]) -> anyhow::Result<Report> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.workers.get())
            .thread_name(|i| format!("scopelint-worker-{i}"))
            .build()
            .context("build worker pool")?;

        let started = Instant::now();
        info!(
            files = files.len(),
            workers = self.settings.workers.get(),
            fix = ?self.settings.fix,
            "processing files"
        );

        let results: Vec<(Utf8PathBuf, FileResult)> = pool.install(|| {
            files
                .par_iter()
                .map(|(path, status)| (path.clone(), self.process_file(path, *status)))
                .collect()
        });

        let report: Report = results.into_iter().collect();
        info!(
            files = report.len(),
            with_findings = report.files_with_findings(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    /// Fix (when enabled) then lint one file against one resolved scope.
    pub fn process_file(&self, path: &Utf8Path, status: Option<ChangeStatus>) -> FileResult {
        let scope = match self.scope_for(path, status) {
            Ok(scope) => scope,
            Err(e) => {
                debug!(path = %path, error = %e, "could not compute changed lines");
                return FileResult::error(format!("could not compute changed lines: {e:#}"));
            }
        };
        debug!(path = %path, ?status, all = scope.is_all(), "resolved scope");

        let mut result = FileResult::default();
        match self.settings.fix {
            FixMode::Off => {}
            FixMode::ChangedLines => result.absorb(self.fixer.fix(path, &scope)),
            FixMode::AllLines => result.absorb(self.fixer.fix(path, &LineScope::All)),
        }
        result.absorb(self.linter.lint(path, &scope));
        result
    }

    fn scope_for(&self, path: &Utf8Path, status: Option<ChangeStatus>) -> anyhow::Result<LineScope> {
        if self.settings.force {
            return Ok(LineScope::All);
        }
        self.provider
            .changed_lines(path, status, &self.settings.baseline)
    }
}

impl std::fmt::Debug for PipelineScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineScheduler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
