use crate::analysis::{Issue, Severity};
use crate::refactor::FixResult;
use crate::scan::{ScanResult, ScanStats};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// JSON reporter for programmatic output
#[derive(Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, scan: &ScanResult, fix: Option<&FixResult>) -> Result<String> {
        let report = JsonReport::new(scan, fix);
        let mut json = serde_json::to_string_pretty(&report).into_diagnostic()?;
        json.push('\n');
        Ok(json)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    total_issues: usize,
    issues: Vec<JsonIssue<'a>>,
    summary: JsonSummary,
    stats: &'a ScanStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<&'a FixResult>,
}

#[derive(Serialize)]
struct JsonIssue<'a> {
    code: &'static str,
    category: &'static str,
    severity: &'static str,
    message: &'a str,
    symbol: String,
    kind: Option<&'static str>,
    package: &'a str,
    file: String,
    line: usize,
    column: usize,
    offset: usize,
    length: usize,
    fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
    fixable: usize,
}

impl<'a> JsonReport<'a> {
    fn new(scan: &'a ScanResult, fix: Option<&'a FixResult>) -> Self {
        let mut summary = JsonSummary {
            errors: 0,
            warnings: 0,
            infos: 0,
            fixable: 0,
        };
        let issues = scan
            .issues
            .iter()
            .map(|issue| {
                match issue.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
                if issue.fixable {
                    summary.fixable += 1;
                }
                JsonIssue::from(issue)
            })
            .collect();

        Self {
            version: "1.0",
            total_issues: scan.issues.len(),
            issues,
            summary,
            stats: &scan.stats,
            fix,
        }
    }
}

impl<'a> From<&'a Issue> for JsonIssue<'a> {
    fn from(issue: &'a Issue) -> Self {
        Self {
            code: issue.code(),
            category: issue.category.as_str(),
            severity: issue.severity.as_str(),
            message: &issue.message,
            symbol: issue.qualified_symbol(),
            kind: issue.kind.map(|k| k.display_name()),
            package: &issue.package,
            file: issue.location.file.to_string_lossy().to_string(),
            line: issue.location.line,
            column: issue.location.column,
            offset: issue.location.offset,
            length: issue.location.length,
            fixable: issue.fixable,
            suggestion: issue.suggestion.as_deref(),
        }
    }
}
