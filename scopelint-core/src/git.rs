//! Read-only git backend for [`ChangeProvider`].

use crate::ports::{Baseline, ChangeProvider, scope_without_history};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use scopelint_types::{ChangeSet, ChangeStatus, LineScope, LineSet};
use std::borrow::Cow;
use std::collections::HashSet;
use std::process::Command;
use tracing::debug;

/// Shells out to `git`, always from `cwd`.
#[derive(Debug, Clone)]
pub struct GitChangeProvider {
    cwd: Utf8PathBuf,
    base_branch: String,
}

impl GitChangeProvider {
    pub fn new(cwd: impl Into<Utf8PathBuf>, base_branch: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            base_branch: base_branch.into(),
        }
    }

    pub fn base_branch(&self) -> &str {
        &self.base_branch
    }

    fn git(&self, dir: &Utf8Path, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new("git")
            .args(["-c", "core.quotePath=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("run git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Trimmed stdout, or `None` when git fails for any reason.
    fn git_optional(&self, args: &[&str]) -> Option<String> {
        match self.git(&self.cwd, args) {
            Ok(out) => Some(out.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                debug!(error = %e, "git query failed");
                None
            }
        }
    }

    fn committed_changes(&self, root: &Utf8Path, commit: &str) -> anyhow::Result<ChangeSet> {
        let head = self
            .head_reference()?
            .context("cannot diff against a baseline without a HEAD commit")?;
        let mut args = vec!["diff-tree", "-r", "--root", "--no-commit-id", "--name-status"];
        if head != commit {
            args.push(commit);
        }
        args.push(head.as_str());

        let out = self.git(root, &args)?;
        Ok(out
            .lines()
            .filter_map(parse_name_status)
            .map(|(status, name)| (root.join(name.as_ref()), status))
            .collect())
    }

    /// Commits whose blame lines count as changed, besides uncommitted lines.
    fn blame_commits(&self, baseline: &Baseline) -> anyhow::Result<HashSet<String>> {
        let mut commits = HashSet::new();
        if let Baseline::Commit(commit) = baseline {
            let head = self.head_reference()?;
            if head.as_deref() == Some(commit.as_str()) {
                commits.insert(commit.clone());
            } else {
                let range = format!("{commit}...HEAD");
                let out = self.git(&self.cwd, &["rev-list", &range])?;
                commits.extend(
                    out.lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from),
                );
            }
        }
        Ok(commits)
    }
}

impl ChangeProvider for GitChangeProvider {
    fn root(&self) -> anyhow::Result<Option<Utf8PathBuf>> {
        Ok(self
            .git_optional(&["rev-parse", "--show-toplevel"])
            .map(Utf8PathBuf::from))
    }

    fn head_reference(&self) -> anyhow::Result<Option<String>> {
        Ok(self.git_optional(&["rev-parse", "HEAD"]))
    }

    fn merge_base_reference(&self) -> anyhow::Result<Option<String>> {
        Ok(self.git_optional(&["merge-base", "HEAD", &self.base_branch]))
    }

    fn changed_files(
        &self,
        root: &Utf8Path,
        tracked_only: bool,
        baseline: &Baseline,
    ) -> anyhow::Result<ChangeSet> {
        if !root.is_absolute() {
            bail!("repository root has to be absolute, got: {root}");
        }

        let mut changes = match baseline {
            Baseline::Commit(commit) => self.committed_changes(root, commit)?,
            Baseline::Local => ChangeSet::new(),
        };

        let status = self.git(
            root,
            &[
                "status",
                "--porcelain",
                "--untracked-files=all",
                "--ignore-submodules=all",
            ],
        )?;
        for (code, name) in status.lines().filter_map(parse_porcelain) {
            let path = root.join(name.as_ref());
            // Deleted files have nothing left to lint or blame.
            if code.contains('D') {
                changes.remove(&path);
                continue;
            }
            if tracked_only && code == "??" {
                continue;
            }
            if let Some(status) = status_of_porcelain(code) {
                changes.insert(path, status);
            }
        }

        debug!(root = %root, files = changes.len(), ?baseline, "collected changed files");
        Ok(changes)
    }

    fn changed_lines(
        &self,
        path: &Utf8Path,
        status: Option<ChangeStatus>,
        baseline: &Baseline,
    ) -> anyhow::Result<LineScope> {
        if let Some(scope) = scope_without_history(status) {
            return Ok(scope);
        }

        let commits = self.blame_commits(baseline)?;
        let dir = path.parent().unwrap_or(self.cwd.as_path());
        let blame = self.git(dir, &["blame", "--porcelain", "--", path.as_str()])?;
        let lines: LineSet = blame
            .lines()
            .filter_map(parse_blame_header)
            .filter(|(sha, _)| is_uncommitted(sha) || commits.contains(*sha))
            .map(|(_, line)| line)
            .collect();

        debug!(path = %path, changed = lines.len(), "blamed changed lines");
        Ok(LineScope::Lines(lines))
    }
}

/// Porcelain codes that are reported, and the status they map to.
fn status_of_porcelain(code: &str) -> Option<ChangeStatus> {
    match code {
        "M " | "MM" => Some(ChangeStatus::ModifiedTracked),
        " M" => Some(ChangeStatus::ModifiedUntracked),
        "A " | "AM" | "??" => Some(ChangeStatus::Added),
        _ => None,
    }
}

/// `XY name` from `git status --porcelain`.
fn parse_porcelain(line: &str) -> Option<(&str, Cow<'_, str>)> {
    let code = line.get(..2)?;
    let name = line.get(3..).filter(|n| !n.is_empty())?;
    Some((code, unquote(name)))
}

/// `A\tname` / `M\tname` from `git diff-tree --name-status`.
fn parse_name_status(line: &str) -> Option<(ChangeStatus, Cow<'_, str>)> {
    let (code, name) = line.split_once(char::is_whitespace)?;
    let status = match code {
        "A" => ChangeStatus::Added,
        "M" => ChangeStatus::ModifiedTracked,
        _ => return None,
    };
    Some((status, unquote(name.trim_start())))
}

/// `<sha> <orig line> <final line>[ <group size>]` from `git blame --porcelain`.
///
/// Accepts SHA-1 and SHA-256 object ids. Returns the final line number, i.e.
/// the line in the working tree.
fn parse_blame_header(line: &str) -> Option<(&str, u32)> {
    let mut fields = line.split(' ');
    let sha = fields.next()?;
    if !matches!(sha.len(), 40 | 64) || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let _orig: u32 = fields.next()?.parse().ok()?;
    let final_line = fields.next()?.parse().ok()?;
    Some((sha, final_line))
}

/// Blame attributes uncommitted lines to the all-zero id.
fn is_uncommitted(sha: &str) -> bool {
    sha.bytes().all(|b| b == b'0')
}

/// Decodes a C-style quoted path (`"a\tb.py"`); unquoted names pass through.
fn unquote(name: &str) -> Cow<'_, str> {
    let Some(inner) = name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) else {
        return Cow::Borrowed(name);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut bytes = Vec::with_capacity(inner.len());
    let mut rest = inner.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        rest = tail;
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        let Some((&esc, tail)) = rest.split_first() else {
            bytes.push(b'\\');
            break;
        };
        rest = tail;
        match esc {
            b'n' => bytes.push(b'\n'),
            b't' => bytes.push(b'\t'),
            b'r' => bytes.push(b'\r'),
            b'a' => bytes.push(0x07),
            b'b' => bytes.push(0x08),
            b'f' => bytes.push(0x0c),
            b'v' => bytes.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(esc - b'0');
                for _ in 0..2 {
                    match rest.split_first() {
                        Some((&d, tail)) if (b'0'..=b'7').contains(&d) => {
                            value = value * 8 + u32::from(d - b'0');
                            rest = tail;
                        }
                        _ => break,
                    }
                }
                bytes.push(u8::try_from(value).unwrap_or(u8::MAX));
            }
            other => bytes.push(other),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}
