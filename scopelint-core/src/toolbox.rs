use crate::ports::ProgramLocator;
use scopelint_domain::{AsToolSpec, FixerSpec, LinterSpec, ToolAction};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

type ActionsByExtension<S> = BTreeMap<String, Vec<Arc<ToolAction<S>>>>;

/// Every configured tool, resolved once against the search path and indexed
/// by file extension.
///
/// Configuration order is kept per extension.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    linters: ActionsByExtension<LinterSpec>,
    fixers: ActionsByExtension<FixerSpec>,
}

impl Toolbox {
    pub fn resolve(
        linters: Vec<LinterSpec>,
        fixers: Vec<FixerSpec>,
        locator: &dyn ProgramLocator,
    ) -> Self {
        Self {
            linters: index(linters, locator),
            fixers: index(fixers, locator),
        }
    }

    pub fn linters_for(&self, extension: &str) -> &[Arc<ToolAction<LinterSpec>>] {
        self.linters.get(extension).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fixers_for(&self, extension: &str) -> &[Arc<ToolAction<FixerSpec>>] {
        self.fixers.get(extension).map(Vec::as_slice).unwrap_or_default()
    }
}

fn index<S: AsToolSpec>(specs: Vec<S>, locator: &dyn ProgramLocator) -> ActionsByExtension<S> {
    let mut by_extension: ActionsByExtension<S> = BTreeMap::new();
    for spec in specs {
        let extensions = spec.tool_spec().extensions.clone();
        let action = Arc::new(ToolAction::resolve(spec, |p| locator.is_installed(p)));
        match action.as_ref() {
            ToolAction::Available(_) => debug!(tool = action.name(), "tool available"),
            ToolAction::Unavailable(u) => {
                info!(tool = action.name(), missing = ?u.missing, "tool unavailable")
            }
        }
        for extension in extensions {
            by_extension
                .entry(extension)
                .or_default()
                .push(Arc::clone(&action));
        }
    }
    by_extension
}
