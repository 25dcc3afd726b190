use crate::invoker::ToolInvoker;
use crate::toolbox::Toolbox;
use camino::Utf8Path;
use scopelint_domain::{LineExpansion, ToolAction, extension_of};
use scopelint_types::{FileResult, LineScope};
use std::sync::Arc;
use tracing::debug;

/// Runs every fixer configured for a file's extension, rewriting the file in
/// place.
///
/// Fixers run one after another in configuration order, each seeing the
/// previous one's output. Fixer output is never cached.
#[derive(Debug, Clone)]
pub struct FixOrchestrator {
    toolbox: Arc<Toolbox>,
    invoker: ToolInvoker,
    expansion: LineExpansion,
}

impl FixOrchestrator {
    pub fn new(toolbox: Arc<Toolbox>, invoker: ToolInvoker, expansion: LineExpansion) -> Self {
        Self {
            toolbox,
            invoker,
            expansion,
        }
    }

    pub fn fix(&self, path: &Utf8Path, scope: &LineScope) -> FileResult {
        let mut result = FileResult::default();
        for action in self.toolbox.fixers_for(&extension_of(path)) {
            match action.as_ref() {
                ToolAction::Unavailable(u) => {
                    result.skipped.push(format!("fixer {}: {}", u.tool, u.message()));
                }
                ToolAction::Available(fixer) => {
                    let arguments = fixer.arguments_for(scope, self.expansion);
                    debug!(fixer = %fixer.tool.name, path = %path, ?arguments, "fixing");
                    if let Err(e) = self.invoker.invoke(&fixer.tool, &arguments, path, false) {
                        result.errors.push(e.to_string());
                    }
                }
            }
        }
        result
    }
}
