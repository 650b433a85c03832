// Cascading cleanup: remove private declarations orphaned by a previous fix
//
// Modeled as a small state machine so the iteration count and the reason the
// loop stopped can be inspected.

use super::editor::{self, FixRange};
use super::fixer::FixError;
use crate::analysis::ExclusionPolicy;
use crate::graph::{Declaration, DeclarationKind};
use crate::parser::{DeclarationSource, DirectiveKind, ParseContext, ParsedUnit};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Upper bound on re-parse/re-detect rounds per file
pub const MAX_CASCADE_ITERATIONS: usize = 5;

/// Why the cascade stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum Termination {
    /// An iteration found nothing new
    NoOrphans,
    /// The file became effectively empty
    FileEmpty,
    IterationCap,
    /// Dry runs stop after one detection pass
    DryRun,
    /// The file has `part`/`part of` directives; private names are visible
    /// across the whole library
    LibraryParts,
    ParseError(String),
    WriteError(String),
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::NoOrphans => write!(f, "no further orphans"),
            Termination::FileEmpty => write!(f, "file became empty"),
            Termination::IterationCap => {
                write!(f, "stopped after {} iterations", MAX_CASCADE_ITERATIONS)
            }
            Termination::DryRun => write!(f, "dry run"),
            Termination::LibraryParts => write!(f, "file belongs to a multi-part library"),
            Termination::ParseError(e) => write!(f, "parse error: {}", e),
            Termination::WriteError(e) => write!(f, "write error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeState {
    Idle,
    Analyzing { iteration: usize },
    Applying { iteration: usize, orphans: Vec<Orphan> },
    Converged(Termination),
    Aborted(Termination),
}

impl CascadeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CascadeState::Converged(_) | CascadeState::Aborted(_))
    }
}

/// A declaration with no remaining reference in its file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub name: String,
    pub parent: Option<String>,
    pub line: usize,
    #[serde(skip)]
    offset: usize,
    #[serde(skip)]
    length: usize,
}

impl Orphan {
    fn from_declaration(decl: &Declaration) -> Self {
        Self {
            name: decl.name.clone(),
            parent: decl.parent.clone(),
            line: decl.location.line,
            offset: decl.location.offset,
            length: decl.location.length,
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

/// Outcome of one file's cascade
#[derive(Debug, Clone, Serialize)]
pub struct CascadeReport {
    /// Detection passes run
    pub iterations: usize,
    /// Orphans removed, or that would be removed in a dry run
    pub removed: Vec<Orphan>,
    pub termination: Termination,
}

/// Drives [`CascadeState`] for one file
pub struct Cascade<'a> {
    parser: &'a dyn DeclarationSource,
    policy: &'a ExclusionPolicy,
    dry_run: bool,
}

impl<'a> Cascade<'a> {
    pub fn new(
        parser: &'a dyn DeclarationSource,
        policy: &'a ExclusionPolicy,
        dry_run: bool,
    ) -> Self {
        Self {
            parser,
            policy,
            dry_run,
        }
    }

    /// Run to a terminal state starting from `text` (already written unless
    /// dry run). `write` persists each intermediate result.
    pub fn run(
        &self,
        path: &Path,
        context: &ParseContext,
        text: String,
        mut write: impl FnMut(&str) -> Result<(), FixError>,
    ) -> (String, CascadeReport) {
        let mut text = text;
        let mut removed = Vec::new();
        let mut iterations = 0;
        let mut state = CascadeState::Idle;

        while !state.is_terminal() {
            state = match state {
                CascadeState::Idle => CascadeState::Analyzing { iteration: 1 },
                CascadeState::Analyzing { iteration } => {
                    iterations = iteration;
                    match self.parser.parse(path, &text, context) {
                        Err(source) => {
                            let error = FixError::Provider {
                                path: path.to_path_buf(),
                                source,
                            };
                            CascadeState::Aborted(Termination::ParseError(error.to_string()))
                        }
                        Ok(unit) if has_parts(&unit) => {
                            debug!("{}: skipping cascade for multi-part library", path.display());
                            CascadeState::Converged(Termination::LibraryParts)
                        }
                        Ok(unit) => {
                            let orphans = self.find_orphans(&unit);
                            if orphans.is_empty() {
                                CascadeState::Converged(Termination::NoOrphans)
                            } else if self.dry_run {
                                removed.extend(orphans);
                                CascadeState::Converged(Termination::DryRun)
                            } else {
                                CascadeState::Applying { iteration, orphans }
                            }
                        }
                    }
                }
                CascadeState::Applying { iteration, orphans } => {
                    let ranges: Vec<FixRange> = orphans
                        .iter()
                        .filter_map(|o| FixRange::clamp(&text, o.offset, o.length).ok())
                        .collect();
                    let next = editor::apply(&text, &editor::plan(&text, ranges));
                    if next == text {
                        CascadeState::Converged(Termination::NoOrphans)
                    } else if let Err(e) = write(&next) {
                        CascadeState::Aborted(Termination::WriteError(e.to_string()))
                    } else {
                        debug!(
                            "{}: cascade iteration {} removed {} orphans",
                            path.display(),
                            iteration,
                            orphans.len()
                        );
                        removed.extend(orphans);
                        text = next;
                        if editor::is_effectively_empty(&text) {
                            CascadeState::Converged(Termination::FileEmpty)
                        } else if iteration >= MAX_CASCADE_ITERATIONS {
                            CascadeState::Converged(Termination::IterationCap)
                        } else {
                            CascadeState::Analyzing {
                                iteration: iteration + 1,
                            }
                        }
                    }
                }
                terminal => terminal,
            };
        }

        let termination = match state {
            CascadeState::Converged(t) | CascadeState::Aborted(t) => t,
            _ => Termination::NoOrphans,
        };
        (
            text,
            CascadeReport {
                iterations,
                removed,
                termination,
            },
        )
    }

    /// Private declarations whose name no longer occurs in the file
    pub fn find_orphans(&self, unit: &ParsedUnit) -> Vec<Orphan> {
        let referenced: HashSet<&str> = unit.usages.iter().map(|u| u.name.as_str()).collect();
        unit.declarations
            .iter()
            .filter(|d| is_orphan_candidate(d))
            .filter(|d| !referenced.contains(d.name.as_str()))
            .filter(|d| !self.policy.is_excluded(d))
            .map(Orphan::from_declaration)
            .collect()
    }
}

fn has_parts(unit: &ParsedUnit) -> bool {
    unit.directives
        .iter()
        .any(|d| matches!(d.kind, DirectiveKind::Part | DirectiveKind::PartOf))
}

fn is_orphan_candidate(decl: &Declaration) -> bool {
    let kind_ok = match decl.kind {
        DeclarationKind::Method
        | DeclarationKind::Getter
        | DeclarationKind::Setter
        | DeclarationKind::Function => true,
        DeclarationKind::Field | DeclarationKind::Variable => decl.single_declarator,
        _ => false,
    };
    kind_ok && decl.is_private() && decl.location.length > 0
}
