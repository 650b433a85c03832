// Usage determination engine
//
// Runs once after every file-level pass has finished: a reference in one file
// can keep a declaration in another alive.

use super::exclusions::is_test_file;
use super::{
    ExclusionPolicy, ImplementationMap, ImportChecker, InheritanceMap, Issue, IssueCategory,
};
use crate::config::Config;
use crate::di::DiUsage;
use crate::graph::{
    Declaration, DeclarationKind, ReferenceCollection, SemanticReferenceCollection,
    SymbolCollection,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything the engine consumes
pub struct EngineInput<'a> {
    pub symbols: &'a SymbolCollection,
    pub references: &'a ReferenceCollection,
    pub semantic: Option<&'a SemanticReferenceCollection>,
    pub di: &'a DiUsage,
}

/// Layered "is this declaration referenced" check
pub struct ReferencePredicate<'a> {
    references: &'a ReferenceCollection,
    semantic: Option<&'a SemanticReferenceCollection>,
    implementations: &'a ImplementationMap,
    di_types: HashSet<String>,
}

impl<'a> ReferencePredicate<'a> {
    pub fn new(
        references: &'a ReferenceCollection,
        semantic: Option<&'a SemanticReferenceCollection>,
        implementations: &'a ImplementationMap,
        di: &DiUsage,
    ) -> Self {
        Self {
            references,
            semantic,
            implementations,
            di_types: di.types(),
        }
    }

    pub fn is_referenced(&self, decl: &Declaration) -> bool {
        if self.di_types.contains(&decl.name) {
            return true;
        }

        if let Some(key) = decl.member_key() {
            // Called through the supertype
            if self
                .implementations
                .bases_of(&key)
                .any(|base| self.is_member_key_referenced(base))
            {
                return true;
            }
            // Base member kept alive by a used override
            if self
                .implementations
                .implementations_of(&key)
                .any(|implementation| self.is_member_key_referenced(implementation))
            {
                return true;
            }
        }

        if self.references.contains(&decl.name) {
            return true;
        }

        match self.semantic {
            Some(semantic) => {
                semantic.is_element_used(&decl.element_id())
                    || semantic.is_simple_name_used(&decl.name)
            }
            None => false,
        }
    }

    fn is_member_key_referenced(&self, key: &str) -> bool {
        let name = key.split_once('.').map(|(_, name)| name).unwrap_or(key);
        self.references.contains(name)
            || self
                .semantic
                .map(|s| s.is_member_key_used(key))
                .unwrap_or(false)
    }
}

/// Classifies declarations and imports into issues
pub struct UsageEngine<'c> {
    config: &'c Config,
    policy: ExclusionPolicy,
}

impl<'c> UsageEngine<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            policy: ExclusionPolicy::from_config(config),
        }
    }

    pub fn analyze(&self, input: &EngineInput) -> Vec<Issue> {
        let inheritance = InheritanceMap::build(input.symbols.declarations());
        let implementations = ImplementationMap::build(input.symbols.declarations(), &inheritance);
        debug!(
            "Built inheritance map ({} types) and implementation map ({} members)",
            inheritance.len(),
            implementations.len()
        );
        let predicate = ReferencePredicate::new(
            input.references,
            input.semantic,
            &implementations,
            input.di,
        );

        let reported: Vec<(&PathBuf, &Declaration)> = input
            .symbols
            .files()
            .filter(|(path, _)| self.config.analyze_tests || !is_test_file(path))
            .flat_map(|(path, file)| file.declarations.iter().map(move |d| (path, d)))
            .collect();

        let mut issues = Vec::new();

        // Types first, so their members can be skipped
        let mut unused_types: HashSet<(&Path, &str)> = HashSet::new();
        let top_level_types = reported
            .iter()
            .filter(|(_, d)| d.kind.is_type() && d.parent.is_none());
        for (path, decl) in top_level_types {
            if self.is_unused_type(decl, &predicate, input) {
                if let Some(issue) = self.issue(IssueCategory::UnusedClass, decl) {
                    unused_types.insert((path.as_path(), decl.name.as_str()));
                    issues.push(issue);
                }
            }
        }

        let mut unused_callables: HashSet<(&Path, String)> = HashSet::new();
        for (path, decl) in &reported {
            if decl.kind.is_type() || !reportable(decl.kind) {
                continue;
            }
            if let Some(parent) = &decl.parent {
                if unused_types.contains(&(path.as_path(), parent.as_str())) {
                    continue;
                }
            }
            if self.policy.is_excluded(decl) || predicate.is_referenced(decl) {
                continue;
            }
            let Some(category) = IssueCategory::for_kind(decl.kind) else {
                continue;
            };
            if let Some(issue) = self.issue(category, decl) {
                if decl.kind.is_callable() {
                    unused_callables.insert((path.as_path(), decl.qualified_name()));
                }
                issues.push(issue);
            }
        }

        if self.config.detection.unused_param {
            let offsets = usage_offsets(input.references);
            for (path, decl) in reported
                .iter()
                .filter(|(_, d)| d.kind == DeclarationKind::Parameter)
            {
                let owner = decl.parent.clone().unwrap_or_default();
                let owner_type_unused = owner
                    .split_once('.')
                    .map(|(ty, _)| unused_types.contains(&(path.as_path(), ty)))
                    .unwrap_or(false);
                if owner_type_unused || unused_callables.contains(&(path.as_path(), owner)) {
                    continue;
                }
                if self.is_unused_parameter(decl, &offsets) {
                    issues.push(Issue::new(IssueCategory::UnusedParameter, decl));
                }
            }
        }

        if self.config.detection.unused_import {
            issues.extend(ImportChecker::new(self.config).check(
                input.symbols,
                input.references,
                input.semantic,
            ));
        }

        let before = issues.len();
        issues.retain(|issue| issue.severity >= self.config.min_severity);
        if before != issues.len() {
            debug!(
                "Severity filter dropped {} issues below {}",
                before - issues.len(),
                self.config.min_severity
            );
        }

        issues.sort_by(|a, b| {
            (&a.location.file, a.location.line, a.location.column)
                .cmp(&(&b.location.file, b.location.line, b.location.column))
        });
        info!("Found {} issues", issues.len());
        issues
    }

    fn issue(&self, category: IssueCategory, decl: &Declaration) -> Option<Issue> {
        if self.config.detection.enabled(category) {
            Some(Issue::new(category, decl))
        } else {
            None
        }
    }

    fn is_unused_type(
        &self,
        decl: &Declaration,
        predicate: &ReferencePredicate,
        input: &EngineInput,
    ) -> bool {
        if self.policy.is_excluded(decl) || predicate.is_referenced(decl) {
            return false;
        }
        if decl.kind != DeclarationKind::Extension {
            return true;
        }

        if input
            .semantic
            .map(|s| s.is_extension_used(&decl.name))
            .unwrap_or(false)
        {
            return false;
        }
        let member_used = input
            .symbols
            .file(&decl.location.file)
            .map(|file| {
                file.declarations
                    .iter()
                    .filter(|m| m.parent.as_deref() == Some(decl.name.as_str()))
                    .any(|m| predicate.is_referenced(m))
            })
            .unwrap_or(false);
        !member_used
    }

    fn is_unused_parameter(&self, decl: &Declaration, offsets: &UsageOffsets) -> bool {
        if decl.name.chars().all(|c| c == '_') {
            return false;
        }
        if decl.is_abstract || decl.is_override || decl.parent.as_deref() == Some("main") {
            return false;
        }
        let Some(body) = decl.body else {
            return false;
        };
        if self.policy.is_excluded(decl) {
            return false;
        }

        let used = offsets
            .get(decl.location.file.as_path())
            .and_then(|names| names.get(decl.name.as_str()))
            .map(|positions| positions.iter().any(|&offset| body.contains(offset)))
            .unwrap_or(false);
        !used
    }
}

/// Declaration kinds that can be reported outside the type and parameter passes
fn reportable(kind: DeclarationKind) -> bool {
    matches!(
        kind,
        DeclarationKind::Function
            | DeclarationKind::Variable
            | DeclarationKind::Method
            | DeclarationKind::Getter
            | DeclarationKind::Setter
            | DeclarationKind::Field
    )
}

type UsageOffsets<'r> = HashMap<&'r Path, HashMap<&'r str, Vec<usize>>>;

/// file -> name -> offsets of its usages
fn usage_offsets(references: &ReferenceCollection) -> UsageOffsets<'_> {
    let mut offsets: UsageOffsets = HashMap::new();
    for reference in references.iter() {
        offsets
            .entry(reference.location.file.as_path())
            .or_default()
            .entry(reference.name.as_str())
            .or_default()
            .push(reference.location.offset);
    }
    offsets
}
