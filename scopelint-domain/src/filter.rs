//! Turning raw linter output into findings restricted to the changed lines.

use crate::error::DomainError;
use crate::template::Template;
use regex::{Captures, Regex, RegexBuilder};
use scopelint_types::{Finding, LineScope};
use tracing::debug;

const LINES_VAR: &str = "lines";
const FILENAME_VAR: &str = "filename";

/// Sub-pattern substituted for `{lines}` when a file has no changed lines.
/// `\b\B` can never match, so line-anchored patterns report nothing.
const NO_LINES: &str = r"(\b\B)";
const ANY_LINE: &str = r"(\d+)";

/// Upper bound for the compiled pattern; long alternations of changed lines
/// exceed the regex crate's default.
const PATTERN_SIZE_LIMIT: usize = 1 << 26;

/// A linter's output-line extraction pattern.
///
/// The source is a regular expression template with `{lines}` and
/// `{filename}` substitution points. Named groups `line`, `column`,
/// `severity`, `message_id` and `message` become finding fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintPattern {
    template: Template,
}

impl LintPattern {
    /// Validates the template and checks that it compiles.
    pub fn new(source: &str) -> Result<Self, DomainError> {
        let template = Template::parse(source)?;
        if let Some(unknown) = template
            .variables()
            .find(|v| *v != LINES_VAR && *v != FILENAME_VAR)
        {
            return Err(DomainError::config(format!(
                "filter {source:?} uses unknown variable {{{unknown}}}; \
                 only {{lines}} and {{filename}} are available"
            )));
        }
        let pattern = Self { template };
        pattern
            .compile("example.txt", &LineScope::All)
            .map_err(|e| DomainError::config(e.to_string()))?;
        Ok(pattern)
    }

    pub fn source(&self) -> &str {
        self.template.source()
    }

    /// Builds the concrete regular expression for one file and scope.
    pub fn compile(&self, filename: &str, scope: &LineScope) -> Result<Regex, DomainError> {
        let lines = lines_subpattern(scope);
        let filename = regex::escape(filename);
        let source = self.template.render(|name| match name {
            LINES_VAR => Some(lines.as_str()),
            FILENAME_VAR => Some(filename.as_str()),
            _ => None,
        })?;
        RegexBuilder::new(&source)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| DomainError::Pattern {
                message: e.to_string(),
            })
    }

    /// Extracts findings from `output` for `filename`, keeping only lines in `scope`.
    ///
    /// Output lines that do not match are dropped; most tools print banners
    /// and summaries around their findings. A captured line number outside a
    /// concrete scope is dropped even when the pattern does not use `{lines}`.
    pub fn parse(
        &self,
        output: &str,
        filename: &str,
        scope: &LineScope,
    ) -> Result<Vec<Finding>, DomainError> {
        let regex = self.compile(filename, scope)?;
        let mut findings = Vec::new();
        let mut dropped = 0usize;

        for raw in output.lines() {
            let Some(caps) = regex.captures(raw) else {
                dropped += 1;
                continue;
            };
            let finding = finding_from_captures(&caps);
            let in_scope = match finding.line {
                Some(line) => scope.contains(line),
                // A captured but unreadable line number cannot be placed.
                None => scope.is_all() || caps.name("line").is_none(),
            };
            if !in_scope {
                dropped += 1;
                continue;
            }
            if finding.is_blank() {
                dropped += 1;
                continue;
            }
            findings.push(finding);
        }

        debug!(
            filename,
            kept = findings.len(),
            dropped,
            "filtered linter output"
        );
        Ok(findings)
    }
}

fn lines_subpattern(scope: &LineScope) -> String {
    match scope {
        LineScope::All => ANY_LINE.to_string(),
        LineScope::Lines(set) if set.is_empty() => NO_LINES.to_string(),
        LineScope::Lines(set) => {
            let alternatives: Vec<String> = set.iter().map(|l| l.to_string()).collect();
            format!("({})", alternatives.join("|"))
        }
    }
}

fn finding_from_captures(caps: &Captures<'_>) -> Finding {
    let text = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
    let number = |name: &str| caps.name(name).and_then(|m| m.as_str().trim().parse().ok());

    Finding {
        line: number("line"),
        column: number("column"),
        severity: text("severity").map(|s| title_case(&s)),
        message_id: text("message_id"),
        message: text("message"),
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest.
///
/// A word starts after any non-alphabetic character: `ERROR` -> `Error`,
/// `fatal error` -> `Fatal Error`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Stable sort by `(line or -1, column or -1)`.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by_key(Finding::sort_key);
}

/// Concatenates findings from several tools and sorts the result.
///
/// Ties keep the order in which the tools were given, then emission order.
pub fn merge_findings<I>(batches: I) -> Vec<Finding>
where
    I: IntoIterator<Item = Vec<Finding>>,
{
    let mut all: Vec<Finding> = batches.into_iter().flatten().collect();
    sort_findings(&mut all);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scopelint_types::LineSet;

    const PYCODESTYLE: &str =
        r"^{filename}:(?P<line>{lines}):((?P<column>\d+):)? (?P<message_id>\S+) (?P<message>.+)$";

    fn lines_of(findings: &[Finding]) -> Vec<Option<u32>> {
        findings.iter().map(|f| f.line).collect()
    }

    #[test]
    fn keeps_only_requested_lines() {
        let pattern = LintPattern::new(PYCODESTYLE).unwrap();
        let output = "/r/a.py:3:1: E302 expected 2 blank lines\n\
                      /r/a.py:4:80: E501 line too long\n\
                      /r/a.py:20:1: W391 blank line at end of file\n";
        let scope = LineScope::Lines(LineSet::from([3, 4, 9]));
        let findings = pattern.parse(output, "/r/a.py", &scope).unwrap();
        assert_eq!(lines_of(&findings), vec![Some(3), Some(4)]);
        assert_eq!(findings[1].column, Some(80));
        assert_eq!(findings[1].message_id.as_deref(), Some("E501"));
        assert_eq!(findings[1].message.as_deref(), Some("line too long"));
    }

    #[test]
    fn all_scope_keeps_every_line() {
        let pattern = LintPattern::new(PYCODESTYLE).unwrap();
        let output = "/r/a.py:3:1: E302 x\n/r/a.py:20:1: W391 y\n";
        let findings = pattern.parse(output, "/r/a.py", &LineScope::All).unwrap();
        assert_eq!(lines_of(&findings), vec![Some(3), Some(20)]);
    }

    #[test]
    fn empty_scope_matches_nothing() {
        let pattern = LintPattern::new(PYCODESTYLE).unwrap();
        let output = "/r/a.py:3:1: E302 x\n";
        let findings = pattern.parse(output, "/r/a.py", &LineScope::nothing()).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn line_prefix_is_not_a_match() {
        let pattern = LintPattern::new(PYCODESTYLE).unwrap();
        let output = "/r/a.py:30:1: E302 x\n/r/a.py:3:1: E303 y\n";
        let scope = LineScope::Lines(LineSet::from([3]));
        let findings = pattern.parse(output, "/r/a.py", &scope).unwrap();
        assert_eq!(lines_of(&findings), vec![Some(3)]);
    }

    #[test]
    fn pattern_without_lines_variable_still_filtered() {
        let pattern =
            LintPattern::new(r"^{filename}:(?P<line>\d+): (?P<message>.+)$").unwrap();
        let output = "/r/a.py:3: a\n/r/a.py:4: b\n/r/a.py:9: c\n/r/a.py:20: d\n";
        let scope = LineScope::Lines(LineSet::from([3, 4, 9]));
        let findings = pattern.parse(output, "/r/a.py", &scope).unwrap();
        assert_eq!(lines_of(&findings), vec![Some(3), Some(4), Some(9)]);
    }

    #[test]
    fn unreadable_line_number_dropped_from_concrete_scope() {
        let pattern =
            LintPattern::new(r"^{filename}:(?P<line>\d+): (?P<message>.+)$").unwrap();
        let output = "/r/a.py:99999999999: overflow\n/r/a.py:3: kept\n";
        let scope = LineScope::Lines(LineSet::from([3]));

        let findings = pattern.parse(output, "/r/a.py", &scope).unwrap();
        assert_eq!(lines_of(&findings), vec![Some(3)]);

        let all = pattern.parse(output, "/r/a.py", &LineScope::All).unwrap();
        assert_eq!(lines_of(&all), vec![None, Some(3)]);
    }

    #[test]
    fn findings_without_line_group_survive_concrete_scope() {
        let pattern = LintPattern::new(r"^{filename}: (?P<message>.+)$").unwrap();
        let scope = LineScope::Lines(LineSet::from([3]));
        let findings = pattern.parse("/r/a.py: file too long\n", "/r/a.py", &scope).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, None);
    }

    #[test]
    fn filename_is_escaped() {
        let pattern = LintPattern::new(r"^{filename}:(?P<line>{lines}): (?P<message>.+)$").unwrap();
        let output = "/r/a+b.py:1: literal plus\n/r/aab.py:1: not this file\n";
        let findings = pattern.parse(output, "/r/a+b.py", &LineScope::All).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message.as_deref(), Some("literal plus"));
    }

    #[test]
    fn missing_groups_stay_absent() {
        let pattern = LintPattern::new(
            r"^{filename}:(?P<line>{lines}):((?P<column>\d+):)? \[(?P<severity>\w+)\] (?P<message>.+)$",
        )
        .unwrap();
        let output = "/r/a.sh:7: [WARNING] quote this\n";
        let findings = pattern.parse(output, "/r/a.sh", &LineScope::All).unwrap();
        assert_eq!(
            findings,
            vec![Finding {
                line: Some(7),
                column: None,
                severity: Some("Warning".to_string()),
                message_id: None,
                message: Some("quote this".to_string()),
            }]
        );
    }

    #[test]
    fn banner_lines_are_dropped() {
        let pattern = LintPattern::new(PYCODESTYLE).unwrap();
        let output = "************* Module a\n\nYour code has been rated at 9/10\n";
        assert!(pattern.parse(output, "/r/a.py", &LineScope::All).unwrap().is_empty());
    }

    #[test]
    fn unknown_variable_is_config_error() {
        let err = LintPattern::new(r"^{file}:{lines}").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn invalid_regex_is_config_error() {
        let err = LintPattern::new(r"^{filename}:(?P<line>{lines}").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn merge_orders_by_line_then_column() {
        let f = |line: Option<u32>, column: Option<u32>| Finding {
            line,
            column,
            message: Some("m".into()),
            ..Finding::default()
        };
        let merged = merge_findings(vec![
            vec![f(Some(10), Some(3)), f(Some(5), Some(1))],
            vec![f(Some(5), None)],
        ]);
        let keys: Vec<(Option<u32>, Option<u32>)> =
            merged.iter().map(|f| (f.line, f.column)).collect();
        assert_eq!(
            keys,
            vec![(Some(5), None), (Some(5), Some(1)), (Some(10), Some(3))]
        );
    }

    #[test]
    fn merge_is_stable_for_equal_keys() {
        let f = |msg: &str| Finding {
            line: Some(2),
            message: Some(msg.into()),
            ..Finding::default()
        };
        let merged = merge_findings(vec![vec![f("first")], vec![f("second")]]);
        assert_eq!(merged[0].message.as_deref(), Some("first"));
        assert_eq!(merged[1].message.as_deref(), Some("second"));
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("ERROR"), "Error");
        assert_eq!(title_case("warning"), "Warning");
        assert_eq!(title_case("fatal error"), "Fatal Error");
        assert_eq!(title_case("c-style"), "C-Style");
    }
}
