//! Configuration file loading for scopelint.
//!
//! Discovers `.scopelint.yaml` at the repository root, falling back to the
//! bundled default configuration, and turns its entries into tool specs.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use regex::Regex;
use scopelint_domain::{DomainError, FixerSpec, LintPattern, LinterSpec, Template, ToolSpec};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = ".scopelint.yaml";

/// Used when the repository has no config file of its own.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.yaml");

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopelintConfig {
    pub linters: Named<LinterEntry>,

    pub fixers: Named<FixerEntry>,

    /// Whitespace-separated regular expressions. Changed files whose absolute
    /// path matches one of them (anchored at the start) are not processed
    /// unless named explicitly.
    #[serde(rename = "ignore-regex")]
    pub ignore_regex: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinterEntry {
    pub command: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub installation: String,
    pub extensions: Vec<String>,
    /// Output pattern with `{lines}` and `{filename}` placeholders.
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixerEntry {
    pub command: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Arguments repeated per changed range; see `RANGE_PLACEHOLDER`.
    #[serde(default)]
    pub dynamic_arguments: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub installation: String,
    pub extensions: Vec<String>,
}

/// A YAML mapping of tool name to entry, in file order.
#[derive(Debug, Clone)]
pub struct Named<T>(pub Vec<(String, T)>);

impl<T> Default for Named<T> {
    fn default() -> Self {
        Named(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Named<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for NamedVisitor<T> {
            type Value = Named<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of tool names to tool definitions")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(Named::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, entry)) = map.next_entry::<String, T>()? {
                    entries.push((name, entry));
                }
                Ok(Named(entries))
            }
        }

        deserializer.deserialize_any(NamedVisitor(PhantomData))
    }
}

/// Values for `{REPO_HOME}` and `{DEFAULT_CONFIGS}`.
#[derive(Debug, Clone)]
pub struct Variables {
    pub repo_home: Utf8PathBuf,
    pub default_configs: Option<Utf8PathBuf>,
}

impl Variables {
    /// `default_configs` is `<user config dir>/scopelint`, when there is one.
    pub fn for_repository(repo_home: &Utf8Path) -> Self {
        let default_configs = dirs::config_dir()
            .and_then(|d| Utf8PathBuf::from_path_buf(d).ok())
            .map(|d| d.join("scopelint"));
        Self {
            repo_home: repo_home.to_path_buf(),
            default_configs,
        }
    }

    fn expand(&self, value: &str) -> Result<String, DomainError> {
        let mut vars = vec![("REPO_HOME", self.repo_home.as_str())];
        if let Some(dir) = &self.default_configs {
            vars.push(("DEFAULT_CONFIGS", dir.as_str()));
        }
        Template::expand(value, &vars)
    }

    fn expand_all(&self, values: &[String]) -> Result<Vec<String>, DomainError> {
        values.iter().map(|v| self.expand(v)).collect()
    }
}

impl ScopelintConfig {
    pub fn linter_specs(&self, vars: &Variables) -> Result<Vec<LinterSpec>, DomainError> {
        self.linters
            .0
            .iter()
            .map(|(name, entry)| {
                let pattern = LintPattern::new(&entry.filter).map_err(|e| in_tool(name, e))?;
                Ok(LinterSpec {
                    tool: tool_spec(
                        name,
                        &entry.command,
                        &entry.arguments,
                        &entry.requirements,
                        &entry.installation,
                        &entry.extensions,
                        vars,
                    )?,
                    pattern,
                })
            })
            .collect()
    }

    pub fn fixer_specs(&self, vars: &Variables) -> Result<Vec<FixerSpec>, DomainError> {
        self.fixers
            .0
            .iter()
            .map(|(name, entry)| {
                Ok(FixerSpec {
                    tool: tool_spec(
                        name,
                        &entry.command,
                        &entry.arguments,
                        &entry.requirements,
                        &entry.installation,
                        &entry.extensions,
                        vars,
                    )?,
                    dynamic_arguments: entry.dynamic_arguments.clone(),
                })
            })
            .collect()
    }

    /// The `ignore-regex` patterns combined into one start-anchored regex.
    pub fn ignore_regex(&self) -> anyhow::Result<Option<Regex>> {
        let Some(source) = self.ignore_regex.as_deref() else {
            return Ok(None);
        };
        let parts: Vec<String> = source.split_whitespace().map(|r| format!("({r})")).collect();
        if parts.is_empty() {
            return Ok(None);
        }
        let combined = format!("^(?:{})", parts.join("|"));
        Regex::new(&combined)
            .map(Some)
            .with_context(|| format!("invalid ignore-regex {source:?}"))
    }
}

fn tool_spec(
    name: &str,
    command: &str,
    arguments: &[String],
    requirements: &[String],
    installation: &str,
    extensions: &[String],
    vars: &Variables,
) -> Result<ToolSpec, DomainError> {
    if extensions.is_empty() {
        return Err(DomainError::config(format!("{name}: no extensions configured")));
    }
    Ok(ToolSpec {
        name: name.to_string(),
        program: vars.expand(command).map_err(|e| in_tool(name, e))?,
        arguments: vars.expand_all(arguments).map_err(|e| in_tool(name, e))?,
        requirements: vars.expand_all(requirements).map_err(|e| in_tool(name, e))?,
        installation: installation.to_string(),
        extensions: extensions.to_vec(),
    })
}

fn in_tool(name: &str, err: DomainError) -> DomainError {
    DomainError::config(format!("{name}: {err}"))
}

/// Discover the `.scopelint.yaml` config file at the repository root.
pub fn discover_config(repo_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = repo_root.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ScopelintConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string. An empty document is an empty config.
pub fn parse_config(contents: &str) -> anyhow::Result<ScopelintConfig> {
    if contents.trim().is_empty() {
        return Ok(ScopelintConfig::default());
    }
    let config: ScopelintConfig = serde_yaml::from_str(contents).context("invalid YAML")?;
    Ok(config)
}

/// Load config from the repo root, or the bundled default if there is none.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<ScopelintConfig> {
    match discover_config(repo_root) {
        Some(path) => load_config(&path),
        None => parse_config(DEFAULT_CONFIG).context("parse bundled default config"),
    }
}
