//! Rendering helpers for scopelint reports: terminal text and JSON.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use scopelint_types::{FileResult, Finding, Report};
use serde::Serialize;
use std::collections::BTreeMap;

/// `line L, col C: Severity: [id]: message`, leaving out absent pieces.
pub fn format_finding(finding: &Finding) -> String {
    let mut out = String::new();
    let mut position = Vec::with_capacity(2);
    if let Some(line) = finding.line {
        position.push(format!("line {line}"));
    }
    if let Some(column) = finding.column {
        position.push(format!("col {column}"));
    }
    if !position.is_empty() {
        out.push_str(&position.join(", "));
        out.push_str(": ");
    }
    if let Some(severity) = &finding.severity {
        out.push_str(&format!("{severity}: "));
    }
    if let Some(id) = &finding.message_id {
        out.push_str(&format!("[{id}]: "));
    }
    if let Some(message) = &finding.message {
        out.push_str(message);
    }
    out
}

/// The lines printed under `Processing file:` for one file.
pub fn file_lines(result: &FileResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .errors
        .iter()
        .map(|e| format!("ERROR: {e}"))
        .chain(result.skipped.iter().map(|s| format!("SKIPPED: {s}")))
        .collect();
    if result.findings.is_empty() {
        if lines.is_empty() {
            lines.push("OK".to_string());
        }
    } else {
        lines.extend(result.findings.iter().map(format_finding));
    }
    lines
}

/// Human-readable report; paths are shown relative to `cwd`.
pub fn render_text(report: &Report, cwd: &Utf8Path) -> String {
    let mut out = String::new();
    for (path, result) in report.iter() {
        out.push_str(&format!("Processing file: {}\n", relative_path(path, cwd)));
        out.push_str(&file_lines(result).join("\n"));
        out.push_str("\n\n");
    }
    out
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    #[serde(flatten)]
    finding: &'a Finding,
    formatted_message: String,
}

#[derive(Serialize)]
struct JsonFileResult<'a> {
    errors: &'a [String],
    skipped: &'a [String],
    findings: Vec<JsonFinding<'a>>,
}

/// Report as a JSON object keyed by absolute path. Every finding also
/// carries its `formatted_message`.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    let files: BTreeMap<&Utf8PathBuf, JsonFileResult<'_>> = report
        .iter()
        .map(|(path, result)| {
            let findings = result
                .findings
                .iter()
                .map(|finding| JsonFinding {
                    finding,
                    formatted_message: format_finding(finding),
                })
                .collect();
            (
                path,
                JsonFileResult {
                    errors: &result.errors,
                    skipped: &result.skipped,
                    findings,
                },
            )
        })
        .collect();
    serde_json::to_string_pretty(&files)
}

/// `path` relative to `base`, walking up with `..` where needed.
///
/// Falls back to `path` itself when the two share no root.
pub fn relative_path(path: &Utf8Path, base: &Utf8Path) -> Utf8PathBuf {
    let path_parts: Vec<Utf8Component<'_>> = path.components().collect();
    let base_parts: Vec<Utf8Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return path.to_path_buf();
    }

    let mut relative = Utf8PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_str());
    }
    if relative.as_str().is_empty() {
        relative.push(".");
    }
    relative
}
