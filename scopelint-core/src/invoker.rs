use crate::error::ExecutionError;
use crate::ports::{ResultCache, ToolRunner};
use camino::Utf8Path;
use fs_err as fs;
use scopelint_domain::ToolSpec;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Runs one tool against one file, going through the result cache when asked.
///
/// Cache failures never fail an invocation; they are logged and the tool is
/// run as if there were no cache.
#[derive(Clone)]
pub struct ToolInvoker {
    runner: Arc<dyn ToolRunner>,
    cache: Arc<dyn ResultCache>,
}

impl ToolInvoker {
    pub fn new(runner: Arc<dyn ToolRunner>, cache: Arc<dyn ResultCache>) -> Self {
        Self { runner, cache }
    }

    pub fn invoke(
        &self,
        tool: &ToolSpec,
        arguments: &[String],
        path: &Utf8Path,
        cache_enabled: bool,
    ) -> Result<String, ExecutionError> {
        if cache_enabled && let Some(output) = self.cached(&tool.name, path) {
            debug!(tool = %tool.name, path = %path, "cache hit");
            return Ok(output);
        }

        debug!(tool = %tool.name, path = %path, ?arguments, "running tool");
        let output = self.runner.run(&tool.program, arguments, path)?;

        if cache_enabled && let Err(e) = self.cache.put(&tool.name, path, &output) {
            warn!(tool = %tool.name, path = %path, error = %e, "could not store tool output");
        }
        Ok(output)
    }

    /// A cached output stored strictly after the file was last modified.
    fn cached(&self, tool: &str, path: &Utf8Path) -> Option<String> {
        let entry = match self.cache.get(tool, path) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(tool, path = %path, error = %e, "could not read cached output");
                return None;
            }
        };
        let modified = match source_mtime(path) {
            Ok(modified) => modified,
            Err(e) => {
                debug!(path = %path, error = %e, "no modification time, bypassing cache");
                return None;
            }
        };
        if entry.stored_at > modified {
            Some(entry.output)
        } else {
            debug!(tool, path = %path, "stale cache entry");
            None
        }
    }
}

impl std::fmt::Debug for ToolInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolInvoker").finish_non_exhaustive()
    }
}

fn source_mtime(path: &Utf8Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryResultCache, InMemoryRunner};
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use scopelint_domain::LintPattern;
    use scopelint_types::{LineScope, LineSet};
    use std::time::Duration;
    use tempfile::TempDir;

    fn tool() -> ToolSpec {
        ToolSpec {
            name: "pycodestyle".to_string(),
            program: "pycodestyle".to_string(),
            arguments: vec![],
            requirements: vec![],
            installation: String::new(),
            extensions: vec![".py".to_string()],
        }
    }

    fn source_file() -> (TempDir, Utf8PathBuf, SystemTime) {
        let temp = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().join("a.py")).expect("utf8");
        std::fs::write(&path, "x = 1\n").expect("write");
        let mtime = std::fs::metadata(&path).expect("meta").modified().expect("mtime");
        (temp, path, mtime)
    }

    fn invoker(
        runner: Arc<InMemoryRunner>,
        cache: Arc<InMemoryResultCache>,
    ) -> ToolInvoker {
        ToolInvoker::new(runner, cache)
    }

    #[test]
    fn fresh_entry_is_a_hit() {
        let (_temp, path, mtime) = source_file();
        let runner = Arc::new(InMemoryRunner::new().with_output("pycodestyle", "live"));
        let cache = Arc::new(InMemoryResultCache::new());
        cache.insert_at("pycodestyle", &path, "cached", mtime + Duration::from_secs(5));

        let out = invoker(runner.clone(), cache).invoke(&tool(), &[], &path, true);
        assert_eq!(out.unwrap(), "cached");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn entry_with_equal_mtime_is_stale() {
        let (_temp, path, mtime) = source_file();
        let runner = Arc::new(InMemoryRunner::new().with_output("pycodestyle", "live"));
        let cache = Arc::new(InMemoryResultCache::new());
        cache.insert_at("pycodestyle", &path, "cached", mtime);

        let out = invoker(runner.clone(), cache.clone()).invoke(&tool(), &[], &path, true);
        assert_eq!(out.unwrap(), "live");
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(
            cache.get("pycodestyle", &path).unwrap().unwrap().output,
            "live"
        );
    }

    #[test]
    fn miss_runs_and_stores() {
        let (_temp, path, _) = source_file();
        let runner = Arc::new(InMemoryRunner::new().with_output("pycodestyle", "live"));
        let cache = Arc::new(InMemoryResultCache::new());

        let out = invoker(runner.clone(), cache.clone()).invoke(&tool(), &[], &path, true);
        assert_eq!(out.unwrap(), "live");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_is_neither_read_nor_written() {
        let (_temp, path, mtime) = source_file();
        let runner = Arc::new(InMemoryRunner::new().with_output("pycodestyle", "live"));
        let cache = Arc::new(InMemoryResultCache::new());
        cache.insert_at("other", &path, "x", mtime + Duration::from_secs(5));

        let out = invoker(runner.clone(), cache.clone()).invoke(&tool(), &[], &path, false);
        assert_eq!(out.unwrap(), "live");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("pycodestyle", &path).unwrap().is_none());
    }

    #[test]
    fn launch_failure_is_not_cached() {
        let (_temp, path, _) = source_file();
        let runner = Arc::new(InMemoryRunner::new());
        let cache = Arc::new(InMemoryResultCache::new());

        let err = invoker(runner, cache.clone())
            .invoke(&tool(), &["--max-line-length=100".to_string()], &path, true)
            .unwrap_err();
        assert!(err.command.starts_with("pycodestyle --max-line-length=100 "));
        assert!(cache.is_empty());
    }

    #[test]
    fn hit_and_miss_give_identical_findings() {
        let (_temp, path, mtime) = source_file();
        let raw = format!("{path}:3:1: E302 expected 2 blank lines\n{path}:20:1: W391 blank\n");
        let pattern = LintPattern::new(
            r"^{filename}:(?P<line>{lines}):((?P<column>\d+):)? (?P<message_id>\S+) (?P<message>.+)$",
        )
        .unwrap();
        let scope = LineScope::Lines(LineSet::from([3]));

        let live_runner = Arc::new(InMemoryRunner::new().with_output("pycodestyle", &raw));
        let live = invoker(live_runner, Arc::new(InMemoryResultCache::new()))
            .invoke(&tool(), &[], &path, true)
            .unwrap();

        let cache = Arc::new(InMemoryResultCache::new());
        cache.insert_at("pycodestyle", &path, &raw, mtime + Duration::from_secs(5));
        let cached = invoker(Arc::new(InMemoryRunner::new()), cache)
            .invoke(&tool(), &[], &path, true)
            .unwrap();

        let a = pattern.parse(&live, path.as_str(), &scope).unwrap();
        let b = pattern.parse(&cached, path.as_str(), &scope).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }
}
