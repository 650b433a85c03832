use crate::analysis::{Issue, Severity};
use crate::refactor::FixResult;
use crate::scan::ScanResult;
use colored::Colorize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Colored, human-readable report grouped by file
pub struct TerminalReporter {
    /// Show the declaration signature under each issue
    show_code: bool,
    root: Option<PathBuf>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            show_code: true,
            root: None,
        }
    }

    pub fn with_code(mut self, show: bool) -> Self {
        self.show_code = show;
        self
    }

    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    pub fn render(&self, scan: &ScanResult, fix: Option<&FixResult>) -> String {
        let mut out = String::new();
        self.write_issues(&mut out, &scan.issues);
        self.write_summary(&mut out, scan);
        if let Some(fix) = fix {
            self.write_fix(&mut out, fix);
        }
        out
    }

    fn display_path(&self, path: &Path) -> String {
        self.root
            .as_ref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn write_issues(&self, out: &mut String, issues: &[Issue]) {
        if issues.is_empty() {
            let _ = writeln!(out, "{}", "No dead code found!".green().bold());
            return;
        }

        let mut by_file: BTreeMap<&Path, Vec<&Issue>> = BTreeMap::new();
        for issue in issues {
            by_file
                .entry(issue.location.file.as_path())
                .or_default()
                .push(issue);
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            format!("Found {} dead code issues:", issues.len())
                .yellow()
                .bold()
        );
        let _ = writeln!(out);

        for (file, items) in by_file {
            let _ = writeln!(out, "{}", self.display_path(file).cyan().bold());
            for item in items {
                self.write_item(out, item);
            }
            let _ = writeln!(out);
        }
    }

    fn write_item(&self, out: &mut String, item: &Issue) {
        let severity = match item.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };
        let location = format!("{}:{}", item.location.line, item.location.column);
        let fixable = if item.fixable {
            format!(" {}", "[fixable]".green())
        } else {
            String::new()
        };

        let _ = writeln!(
            out,
            "  {} {} [{}] {}{}",
            location.dimmed(),
            severity,
            item.code().dimmed(),
            item.message,
            fixable
        );
        if self.show_code {
            if let Some(snippet) = &item.snippet {
                let _ = writeln!(out, "    {} {}", "→".dimmed(), snippet.trim().white());
            }
        }
        if let Some(suggestion) = &item.suggestion {
            let _ = writeln!(out, "    {} {}", "help:".green(), suggestion);
        }
    }

    fn write_summary(&self, out: &mut String, scan: &ScanResult) {
        let mut errors = 0;
        let mut warnings = 0;
        let mut infos = 0;
        for issue in &scan.issues {
            match issue.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
                Severity::Info => infos += 1,
            }
        }

        let _ = writeln!(out, "{}", "─".repeat(60).dimmed());
        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} errors", errors).red().to_string());
        }
        if warnings > 0 {
            parts.push(format!("{} warnings", warnings).yellow().to_string());
        }
        if infos > 0 {
            parts.push(format!("{} info", infos).blue().to_string());
        }
        if !parts.is_empty() {
            let _ = writeln!(
                out,
                "Summary: {} ({} fixable)",
                parts.join(", "),
                scan.fixable_issues().count()
            );
        }

        let stats = &scan.stats;
        let _ = writeln!(
            out,
            "{}",
            format!(
                "Scanned {} files in {} packages ({} mode)",
                stats.parsed,
                stats.packages,
                stats.mode.as_str()
            )
            .dimmed()
        );
        if stats.failed > 0 {
            let _ = writeln!(
                out,
                "{}",
                format!("⚠ {} files could not be parsed and were skipped", stats.failed).yellow()
            );
        }
        if stats.unresolved > 0 {
            let _ = writeln!(
                out,
                "{}",
                format!("⚠ {} files could not be resolved", stats.unresolved).yellow()
            );
        }
    }

    fn write_fix(&self, out: &mut String, fix: &FixResult) {
        let verb = if fix.dry_run { "Would fix" } else { "Fixed" };
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            format!(
                "{} {} issues: {} files changed, {} files deleted",
                verb,
                fix.issues_applied,
                fix.files_changed.len(),
                fix.files_deleted.len()
            )
            .green()
            .bold()
        );
        for path in &fix.files_deleted {
            let _ = writeln!(out, "  {} {}", "deleted".red(), self.display_path(path));
        }

        let cascaded = fix.cascade_removed();
        if cascaded > 0 {
            let _ = writeln!(
                out,
                "  {} {} orphaned private declarations",
                if fix.dry_run { "would also remove" } else { "also removed" },
                cascaded
            );
        }
        if !fix.skipped.is_empty() {
            let _ = writeln!(out, "  {} issues skipped:", fix.skipped.len());
            for skipped in &fix.skipped {
                let _ = writeln!(
                    out,
                    "    {} {}: {}",
                    "•".dimmed(),
                    skipped.issue.qualified_symbol(),
                    skipped.reason.dimmed()
                );
            }
        }
        for error in &fix.errors {
            let _ = writeln!(out, "  {} {}", "error:".red(), error);
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
