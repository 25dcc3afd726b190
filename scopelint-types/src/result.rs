use crate::finding::Finding;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file outcome.
///
/// The three lists are additive: one tool may fail to run while another
/// reports findings for the same file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    /// Tools that could not be executed.
    #[serde(default)]
    pub errors: Vec<String>,

    /// Reasons a tool was not run (none configured, not installed).
    #[serde(default)]
    pub skipped: Vec<String>,

    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl FileResult {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            skipped: vec![reason.into()],
            ..Self::default()
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            errors: vec![reason.into()],
            ..Self::default()
        }
    }

    pub fn with_findings(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            ..Self::default()
        }
    }

    /// Appends every list of `other` onto `self`, keeping order.
    pub fn absorb(&mut self, other: FileResult) {
        self.errors.extend(other.errors);
        self.skipped.extend(other.skipped);
        self.findings.extend(other.findings);
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Nothing to report at all.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.skipped.is_empty() && self.findings.is_empty()
    }
}

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Clean,
    Findings,
    InvalidInput,
    ToolsUnavailable,
    NotARepository,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Findings => 1,
            ExitStatus::InvalidInput => 2,
            ExitStatus::ToolsUnavailable => 4,
            ExitStatus::NotARepository => 128,
        }
    }
}

/// Results for every processed file, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    files: BTreeMap<Utf8PathBuf, FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or merges the result for `path`.
    pub fn insert(&mut self, path: Utf8PathBuf, result: FileResult) {
        match self.files.get_mut(&path) {
            Some(existing) => existing.absorb(result),
            None => {
                self.files.insert(path, result);
            }
        }
    }

    pub fn get(&self, path: &Utf8Path) -> Option<&FileResult> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8PathBuf, &FileResult)> {
        self.files.iter()
    }

    pub fn files_with_findings(&self) -> usize {
        self.files.values().filter(|r| r.has_findings()).count()
    }

    /// Findings win over execution errors, which win over a clean run.
    ///
    /// Skips never affect the status.
    pub fn exit_status(&self) -> ExitStatus {
        if self.files.values().any(FileResult::has_findings) {
            ExitStatus::Findings
        } else if self.files.values().any(FileResult::has_errors) {
            ExitStatus::ToolsUnavailable
        } else {
            ExitStatus::Clean
        }
    }
}

impl FromIterator<(Utf8PathBuf, FileResult)> for Report {
    fn from_iter<I: IntoIterator<Item = (Utf8PathBuf, FileResult)>>(iter: I) -> Self {
        let mut report = Report::new();
        for (path, result) in iter {
            report.insert(path, result);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(line: u32) -> Finding {
        Finding {
            line: Some(line),
            ..Finding::default()
        }
    }

    #[test]
    fn absorb_keeps_all_categories() {
        let mut r = FileResult::error("could not run");
        r.absorb(FileResult::skip("not installed"));
        r.absorb(FileResult::with_findings(vec![finding(3)]));
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.skipped.len(), 1);
        assert_eq!(r.findings.len(), 1);
        assert!(!r.is_clean());
    }

    #[test]
    fn exit_status_precedence() {
        let mut report = Report::new();
        assert_eq!(report.exit_status(), ExitStatus::Clean);

        report.insert("/r/a.py".into(), FileResult::skip("nothing"));
        assert_eq!(report.exit_status(), ExitStatus::Clean);

        report.insert("/r/b.py".into(), FileResult::error("boom"));
        assert_eq!(report.exit_status(), ExitStatus::ToolsUnavailable);

        report.insert("/r/c.py".into(), FileResult::with_findings(vec![finding(1)]));
        assert_eq!(report.exit_status(), ExitStatus::Findings);
        assert_eq!(report.exit_status().code(), 1);
    }

    #[test]
    fn report_is_path_ordered_regardless_of_insert_order() {
        let report: Report = [
            (Utf8PathBuf::from("/r/z.py"), FileResult::default()),
            (Utf8PathBuf::from("/r/a.py"), FileResult::default()),
            (Utf8PathBuf::from("/r/m.py"), FileResult::default()),
        ]
        .into_iter()
        .collect();
        let paths: Vec<&str> = report.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/r/a.py", "/r/m.py", "/r/z.py"]);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Clean.code(), 0);
        assert_eq!(ExitStatus::InvalidInput.code(), 2);
        assert_eq!(ExitStatus::ToolsUnavailable.code(), 4);
        assert_eq!(ExitStatus::NotARepository.code(), 128);
    }
}
