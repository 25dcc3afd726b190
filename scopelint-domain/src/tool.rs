use crate::filter::LintPattern;
use crate::ranges::{LineExpansion, collapse};
use camino::Utf8Path;
use scopelint_types::LineScope;

/// Placeholder in a fixer's dynamic arguments, repeated once per changed range.
pub const RANGE_PLACEHOLDER: &str = "{MODIFIED_LINES_RANGE_REPEATED_ARG}";

/// One external program bound to a set of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Logical name from the configuration; also the cache namespace.
    pub name: String,
    pub program: String,
    /// Static arguments, placed before the file path.
    pub arguments: Vec<String>,
    /// Other programs that must be installed for this tool to work.
    pub requirements: Vec<String>,
    /// Shown to the user when something is missing.
    pub installation: String,
    /// Extensions including the leading dot, e.g. `.py`.
    pub extensions: Vec<String>,
}

impl ToolSpec {
    /// The program followed by its requirements.
    pub fn programs(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.requirements.iter().map(String::as_str))
    }

    pub fn applies_to(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

pub trait AsToolSpec {
    fn tool_spec(&self) -> &ToolSpec;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinterSpec {
    pub tool: ToolSpec,
    pub pattern: LintPattern,
}

impl AsToolSpec for LinterSpec {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixerSpec {
    pub tool: ToolSpec,
    /// Argument templates that may contain [`RANGE_PLACEHOLDER`].
    pub dynamic_arguments: Vec<String>,
}

impl AsToolSpec for FixerSpec {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool
    }
}

impl FixerSpec {
    /// Static arguments followed by one range argument per collapsed range.
    ///
    /// Range arguments are only produced for a concrete line set; with
    /// [`LineScope::All`] the fixer sees its static arguments only and
    /// formats the whole file. Dynamic arguments without the placeholder are
    /// ignored.
    pub fn arguments_for(&self, scope: &LineScope, expansion: LineExpansion) -> Vec<String> {
        let mut args = self.tool.arguments.clone();
        let Some(lines) = scope.lines() else {
            return args;
        };
        let templates: Vec<&String> = self
            .dynamic_arguments
            .iter()
            .filter(|a| a.contains(RANGE_PLACEHOLDER))
            .collect();
        if templates.is_empty() {
            return args;
        }

        let ranges = collapse(lines, expansion);
        for template in templates {
            args.extend(
                ranges
                    .iter()
                    .map(|r| template.replace(RANGE_PLACEHOLDER, &r.to_string())),
            );
        }
        args
    }
}

/// A tool that is missing itself or one of its requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    pub tool: String,
    pub missing: Vec<String>,
    pub installation: String,
}

impl Unavailable {
    /// e.g. `eslint, node are not installed. Run npm install -g eslint.`
    pub fn message(&self) -> String {
        let verb = if self.missing.len() > 1 { "are" } else { "is" };
        format!(
            "{} {} not installed. {}",
            self.missing.join(", "),
            verb,
            self.installation
        )
    }
}

/// Resolved once per run: either a runnable spec or the reason it cannot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAction<S> {
    Available(S),
    Unavailable(Unavailable),
}

impl<S: AsToolSpec> ToolAction<S> {
    /// Checks the program and every requirement with `is_installed`.
    pub fn resolve(spec: S, is_installed: impl Fn(&str) -> bool) -> Self {
        let tool = spec.tool_spec();
        let missing: Vec<String> = tool
            .programs()
            .filter(|&p| !is_installed(p))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            ToolAction::Available(spec)
        } else {
            ToolAction::Unavailable(Unavailable {
                tool: tool.name.clone(),
                missing,
                installation: tool.installation.clone(),
            })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolAction::Available(spec) => &spec.tool_spec().name,
            ToolAction::Unavailable(u) => &u.tool,
        }
    }
}

/// Extension with its leading dot (`.py`), or an empty string.
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(path: &Utf8Path) -> String {
    path.extension()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
