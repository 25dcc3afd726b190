use crate::invoker::ToolInvoker;
use crate::toolbox::Toolbox;
use camino::Utf8Path;
use scopelint_domain::{ToolAction, extension_of, merge_findings};
use scopelint_types::{FileResult, LineScope};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs every linter configured for a file's extension and merges the
/// findings that fall inside the file's line scope.
#[derive(Debug, Clone)]
pub struct LintOrchestrator {
    toolbox: Arc<Toolbox>,
    invoker: ToolInvoker,
    cache_enabled: bool,
}

impl LintOrchestrator {
    pub fn new(toolbox: Arc<Toolbox>, invoker: ToolInvoker, cache_enabled: bool) -> Self {
        Self {
            toolbox,
            invoker,
            cache_enabled,
        }
    }

    pub fn lint(&self, path: &Utf8Path, scope: &LineScope) -> FileResult {
        let extension = extension_of(path);
        let linters = self.toolbox.linters_for(&extension);
        if linters.is_empty() {
            return FileResult::skip(format!(
                "no linter is defined or enabled for files with extension \"{extension}\""
            ));
        }

        let mut result = FileResult::default();
        let mut batches = Vec::with_capacity(linters.len());
        for action in linters {
            let linter = match action.as_ref() {
                ToolAction::Unavailable(u) => {
                    result.skipped.push(u.message());
                    continue;
                }
                ToolAction::Available(linter) => linter,
            };

            let output = match self.invoker.invoke(
                &linter.tool,
                &linter.tool.arguments,
                path,
                self.cache_enabled,
            ) {
                Ok(output) => output,
                Err(e) => {
                    result.errors.push(e.to_string());
                    continue;
                }
            };

            match linter.pattern.parse(&output, path.as_str(), scope) {
                Ok(findings) => {
                    debug!(
                        linter = %linter.tool.name,
                        path = %path,
                        findings = findings.len(),
                        "linted"
                    );
                    batches.push(findings);
                }
                Err(e) => {
                    warn!(
                        linter = %linter.tool.name,
                        path = %path,
                        error = %e,
                        "could not apply filter"
                    );
                    result.errors.push(format!("{}: {e}", linter.tool.name));
                }
            }
        }

        result.findings = merge_findings(batches);
        result
    }
}
