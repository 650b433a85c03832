//! Auto-fix: delete the text of fixable issues, file by file
//!
//! Each file's batch is independent. A file that cannot be read, contains a
//! symlink, or fails to parse during the cascade only affects its own issues.

use super::cascade::{Cascade, CascadeReport};
use super::editor::{self, FixRange};
use crate::analysis::{ExclusionPolicy, Issue};
use crate::config::Config;
use crate::parser::{DartParser, DeclarationSource, ParseContext, ProviderError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum FixError {
    #[error("cannot resolve {path}: {reason}")]
    PathResolution { path: PathBuf, reason: String },
    #[error("stale range in {path}: {reason}")]
    RangeValidation { path: PathBuf, reason: String },
    #[error("failed to re-parse {path}: {source}")]
    Provider {
        path: PathBuf,
        #[source]
        source: ProviderError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An issue the fixer did not apply
#[derive(Debug, Clone, Serialize)]
pub struct SkippedIssue {
    pub issue: Issue,
    pub reason: String,
}

impl SkippedIssue {
    fn new(issue: &Issue, reason: impl ToString) -> Self {
        Self {
            issue: issue.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of a fix run
#[derive(Debug, Default, Serialize)]
pub struct FixResult {
    pub dry_run: bool,
    pub files_changed: Vec<PathBuf>,
    pub files_deleted: Vec<PathBuf>,
    pub issues_applied: usize,
    pub skipped: Vec<SkippedIssue>,
    /// Per-file cascading cleanup
    pub cascades: BTreeMap<PathBuf, CascadeReport>,
    /// Files whose batch failed as a whole
    pub errors: Vec<String>,
    #[serde(skip)]
    originals: BTreeMap<PathBuf, String>,
}

impl FixResult {
    /// Contents of every changed or deleted file before the fix
    pub fn originals(&self) -> impl Iterator<Item = (&PathBuf, &String)> {
        self.originals.iter()
    }

    /// Declarations removed by cascades, across all files
    pub fn cascade_removed(&self) -> usize {
        self.cascades.values().map(|c| c.removed.len()).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.files_changed.is_empty() && self.files_deleted.is_empty()
    }

    fn absorb(&mut self, outcome: FileOutcome) {
        match outcome.change {
            Change::None => {}
            Change::Rewritten => self.files_changed.push(outcome.path.clone()),
            Change::Deleted => self.files_deleted.push(outcome.path.clone()),
        }
        if outcome.change != Change::None {
            if let Some(original) = outcome.original {
                self.originals.insert(outcome.path.clone(), original);
            }
        }
        self.issues_applied += outcome.applied;
        self.skipped.extend(outcome.skipped);
        if let Some(cascade) = outcome.cascade {
            self.cascades.insert(outcome.path.clone(), cascade);
        }
        if let Some(error) = outcome.error {
            self.errors.push(error);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    None,
    Rewritten,
    Deleted,
}

struct FileOutcome {
    path: PathBuf,
    original: Option<String>,
    change: Change,
    applied: usize,
    skipped: Vec<SkippedIssue>,
    cascade: Option<CascadeReport>,
    error: Option<String>,
}

impl FileOutcome {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            original: None,
            change: Change::None,
            applied: 0,
            skipped: Vec::new(),
            cascade: None,
            error: None,
        }
    }

    /// Abort the whole batch for this file
    fn fail(mut self, issues: &[&Issue], error: FixError) -> Self {
        debug!("{}", error);
        self.skipped
            .extend(issues.iter().map(|i| SkippedIssue::new(i, &error)));
        self.error = Some(error.to_string());
        self
    }
}

pub struct Fixer {
    parser: Box<dyn DeclarationSource>,
    policy: ExclusionPolicy,
    dry_run: bool,
}

impl Fixer {
    pub fn new(config: &Config) -> Self {
        Self {
            parser: Box::new(DartParser::new()),
            policy: ExclusionPolicy::from_config(config),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_parser(mut self, parser: impl DeclarationSource + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Apply every fixable issue; the rest are reported as skipped
    pub fn apply<'i>(&self, issues: impl IntoIterator<Item = &'i Issue>) -> FixResult {
        let mut result = FixResult {
            dry_run: self.dry_run,
            ..FixResult::default()
        };

        let mut by_file: BTreeMap<PathBuf, Vec<&Issue>> = BTreeMap::new();
        for issue in issues {
            if issue.fixable {
                by_file
                    .entry(issue.location.file.clone())
                    .or_default()
                    .push(issue);
            } else {
                result
                    .skipped
                    .push(SkippedIssue::new(issue, "not automatically fixable"));
            }
        }

        info!(
            "Fixing {} files{}",
            by_file.len(),
            if self.dry_run { " (dry run)" } else { "" }
        );

        let outcomes: Vec<FileOutcome> = by_file
            .par_iter()
            .map(|(path, issues)| self.fix_file(path, issues))
            .collect();
        for outcome in outcomes {
            result.absorb(outcome);
        }

        info!(
            "Applied {} fixes: {} files changed, {} deleted, {} skipped, {} cascaded",
            result.issues_applied,
            result.files_changed.len(),
            result.files_deleted.len(),
            result.skipped.len(),
            result.cascade_removed()
        );
        result
    }

    fn fix_file(&self, path: &Path, issues: &[&Issue]) -> FileOutcome {
        let outcome = FileOutcome::new(path);

        match std::fs::symlink_metadata(path) {
            Err(e) => {
                return outcome.fail(
                    issues,
                    FixError::PathResolution {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    },
                )
            }
            Ok(meta) if meta.file_type().is_symlink() => {
                return outcome.fail(
                    issues,
                    FixError::PathResolution {
                        path: path.to_path_buf(),
                        reason: "symbolic link".to_string(),
                    },
                )
            }
            Ok(meta) if !meta.is_file() => {
                return outcome.fail(
                    issues,
                    FixError::PathResolution {
                        path: path.to_path_buf(),
                        reason: "not a regular file".to_string(),
                    },
                )
            }
            Ok(_) => {}
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                return outcome.fail(
                    issues,
                    FixError::PathResolution {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    },
                )
            }
        };

        self.fix_text(path, issues, text, outcome)
    }

    fn fix_text(
        &self,
        path: &Path,
        issues: &[&Issue],
        text: String,
        mut outcome: FileOutcome,
    ) -> FileOutcome {
        let mut ranges = Vec::new();
        let mut applied: Vec<&Issue> = Vec::new();
        for issue in issues {
            match validated_range(path, &text, issue) {
                Ok(range) => {
                    ranges.push(range);
                    applied.push(issue);
                }
                Err(e) => outcome.skipped.push(SkippedIssue::new(issue, e)),
            }
        }
        if ranges.is_empty() {
            return outcome;
        }

        let fixed = editor::apply(&text, &editor::plan(&text, ranges));
        if fixed == text {
            outcome.skipped.extend(
                applied
                    .iter()
                    .map(|i| SkippedIssue::new(i, "fix would not change the file")),
            );
            return outcome;
        }

        let removes_type = applied.iter().any(|i| {
            i.parent.is_none() && i.kind.map(|k| k.is_type()).unwrap_or(false)
        });
        if removes_type && editor::is_effectively_empty(&fixed) {
            if !self.dry_run {
                if let Err(source) = std::fs::remove_file(path) {
                    let error = FixError::Write {
                        path: path.to_path_buf(),
                        source,
                    };
                    warn!("{}", error);
                    return outcome.fail(&applied, error);
                }
            }
            debug!("Deleted {}", path.display());
            outcome.applied = applied.len();
            outcome.change = Change::Deleted;
            outcome.original = Some(text);
            return outcome;
        }

        if !self.dry_run {
            if let Err(error) = write_file(path, &fixed) {
                warn!("{}", error);
                return outcome.fail(&applied, error);
            }
        }
        outcome.applied = applied.len();
        outcome.change = Change::Rewritten;
        outcome.original = Some(text);

        // import bookkeeping is not re-validated without full re-resolution
        if applied.iter().any(|i| i.category.is_import()) {
            return outcome;
        }

        let package = applied
            .first()
            .map(|i| i.package.clone())
            .unwrap_or_default();
        let context = ParseContext::new(
            package,
            format!("file://{}", path.to_string_lossy().replace('\\', "/")),
        );
        let cascade = Cascade::new(self.parser.as_ref(), &self.policy, self.dry_run);
        let (_, report) = cascade.run(path, &context, fixed, |next| write_file(path, next));
        if !report.removed.is_empty() {
            debug!(
                "{}: cascade removed {} declarations ({})",
                path.display(),
                report.removed.len(),
                report.termination
            );
        }
        outcome.cascade = Some(report);
        outcome
    }
}

/// Clamped range for `issue`, rejecting ranges that no longer hold its symbol
fn validated_range(path: &Path, text: &str, issue: &Issue) -> Result<FixRange, FixError> {
    let stale = |reason: String| FixError::RangeValidation {
        path: path.to_path_buf(),
        reason,
    };
    let range = FixRange::clamp(text, issue.location.offset, issue.location.length)
        .map_err(|e| stale(e.to_string()))?;
    if !editor::contains_word(range.slice(text), &issue.symbol) {
        return Err(stale(format!("'{}' is no longer at this range", issue.symbol)));
    }
    Ok(if issue.category.is_import() {
        range.without_leading_comments()
    } else {
        range
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), FixError> {
    std::fs::write(path, contents).map_err(|source| FixError::Write {
        path: path.to_path_buf(),
        source,
    })
}
