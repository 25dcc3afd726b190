mod config;
mod error;

use anyhow::Context;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use clap::Parser;
use config::Variables;
use error::CliError;
use scopelint_core::adapters::{
    FsResultCache, InMemoryResultCache, ProcessRunner, SearchPathLocator,
};
use scopelint_core::git::GitChangeProvider;
use scopelint_core::ports::{ChangeProvider, ResultCache};
use scopelint_core::settings::default_workers;
use scopelint_core::{FixMode, Mode, PipelineScheduler, RunSettings, ToolInvoker, Toolbox};
use scopelint_domain::LineExpansion;
use scopelint_render::{render_json, render_text};
use scopelint_types::{ChangeStatus, ExitStatus};
use std::collections::BTreeMap;
use std::io::Write;
use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "scopelint",
    version,
    about = "Run linters and formatters on the lines you changed, and only those."
)]
struct Cli {
    /// Report every issue in the files, not just the ones on changed lines.
    #[arg(short, long)]
    force: bool,

    /// Ignore untracked files.
    #[arg(short, long)]
    tracked: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Which history counts as changed: merge-base, local or last-commit.
    #[arg(long, default_value = "merge-base")]
    mode: Mode,

    /// Do not read or write cached linter output.
    #[arg(long)]
    no_cache: bool,

    /// Run fixers on the changed lines before linting.
    #[arg(long, conflicts_with = "fix_all")]
    fix: bool,

    /// Run fixers on whole files before linting.
    #[arg(long)]
    fix_all: bool,

    /// Lines of context to format around every changed line (non-negative).
    #[arg(long = "fix-linexp", default_value = "0", allow_hyphen_values = true)]
    fix_linexp: LineExpansion,

    /// Number of files processed in parallel (default: available parallelism).
    #[arg(short, long)]
    jobs: Option<NonZeroUsize>,

    /// Branch the merge-base mode compares against.
    #[arg(long, env = "SCOPELINT_BASE_BRANCH", default_value = "master")]
    base_branch: String,

    /// Files to check (default: every changed file).
    #[arg(value_name = "FILE")]
    files: Vec<Utf8PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(status) => ExitCode::from(status.code()),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<ExitStatus, CliError> {
    let cwd = current_dir()?;
    let provider = Arc::new(GitChangeProvider::new(cwd.clone(), cli.base_branch.clone()));
    let root = provider.root()?.ok_or(CliError::NotARepository)?;
    let baseline = cli.mode.baseline(provider.as_ref())?;
    debug!(root = %root, mode = %cli.mode, ?baseline, "resolved baseline");

    let config = config::load_or_default(&root).map_err(CliError::Config)?;

    if !cli.files.is_empty() {
        let messages = find_invalid_files(&cli.files, &root, &cwd);
        if !messages.is_empty() {
            return Err(CliError::InvalidFiles { messages });
        }
    }

    let changes = provider.changed_files(&root, cli.tracked, &baseline)?;
    let work: BTreeMap<Utf8PathBuf, Option<ChangeStatus>> = if cli.files.is_empty() {
        let ignore = config.ignore_regex().map_err(CliError::Config)?;
        changes
            .iter()
            .filter(|(path, _)| !ignore.as_ref().is_some_and(|r| r.is_match(path.as_str())))
            .filter(|(path, _)| {
                let present = path.is_file();
                if !present {
                    debug!(path = %path, "changed file no longer exists, skipping");
                }
                present
            })
            .map(|(path, status)| (path.clone(), Some(status)))
            .collect()
    } else {
        cli.files
            .iter()
            .map(|f| {
                let path = absolute(&cwd, f);
                let status = changes.get(&path);
                (path, status)
            })
            .collect()
    };

    let vars = Variables::for_repository(&root);
    let linters = config
        .linter_specs(&vars)
        .map_err(|e| CliError::Config(e.into()))?;
    let fixers = config
        .fixer_specs(&vars)
        .map_err(|e| CliError::Config(e.into()))?;
    let toolbox = Toolbox::resolve(linters, fixers, &SearchPathLocator::from_env());

    let cache: Arc<dyn ResultCache> = match FsResultCache::in_home_dir() {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(error = %e, "no cache directory, keeping tool output in memory");
            Arc::new(InMemoryResultCache::new())
        }
    };

    let settings = RunSettings {
        workers: cli.jobs.unwrap_or_else(default_workers),
        fix: if cli.fix {
            FixMode::ChangedLines
        } else if cli.fix_all {
            FixMode::AllLines
        } else {
            FixMode::Off
        },
        force: cli.force,
        cache_enabled: !cli.no_cache,
        line_expansion: cli.fix_linexp,
        baseline,
    };
    info!(root = %root, files = work.len(), "starting run");

    let scheduler = PipelineScheduler::new(
        Arc::new(toolbox),
        ToolInvoker::new(Arc::new(ProcessRunner), cache),
        provider,
        settings,
    );
    let files: Vec<(Utf8PathBuf, Option<ChangeStatus>)> = work.into_iter().collect();
    let report = scheduler.run(&files)?;

    let rendered = if cli.json {
        render_json(&report).context("serialize report")?
    } else {
        render_text(&report, &cwd)
    };
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("write report")?;

    Ok(report.exit_status())
}

fn current_dir() -> anyhow::Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("read current directory")?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| anyhow::anyhow!("current directory is not UTF-8: {}", p.display()))
}

/// `path` made absolute against `cwd`, with `.` and `..` resolved lexically.
fn absolute(cwd: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let mut out = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// Files outside the repository, missing files and directories.
fn find_invalid_files(files: &[Utf8PathBuf], root: &Utf8Path, cwd: &Utf8Path) -> Vec<String> {
    let mut messages = Vec::new();
    for file in files {
        let path = absolute(cwd, file);
        if !path.starts_with(root) {
            messages.push(format!(
                "Error: File {file} does not belong to repository {root}"
            ));
        }
        if !path.exists() {
            messages.push(format!("Error: File {file} does not exist"));
        }
        if path.is_dir() {
            messages.push(format!(
                "Error: {file} is a directory. Directories are not yet supported"
            ));
        }
    }
    messages
}
