// Unused and partially used import detection

use super::{Issue, IssueCategory};
use crate::config::Config;
use crate::graph::{ReferenceCollection, SemanticReferenceCollection, SymbolCollection};
use crate::parser::DirectiveKind;
use tracing::debug;

pub struct ImportChecker<'c> {
    config: &'c Config,
}

impl<'c> ImportChecker<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn check(
        &self,
        symbols: &SymbolCollection,
        references: &ReferenceCollection,
        semantic: Option<&SemanticReferenceCollection>,
    ) -> Vec<Issue> {
        let issues = match semantic {
            Some(semantic) => self.check_semantic(symbols, semantic),
            None => self.check_names(symbols, references),
        };
        debug!("Import check produced {} issues", issues.len());
        issues
    }

    fn check_semantic(
        &self,
        symbols: &SymbolCollection,
        semantic: &SemanticReferenceCollection,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        for usage in semantic.import_usage() {
            let package = symbols
                .file(&usage.file)
                .map(|f| f.package.clone())
                .unwrap_or_default();

            if usage.is_unused() {
                issues.push(Issue::for_import(
                    IssueCategory::UnusedImport,
                    &usage.uri,
                    usage.location.clone(),
                    package,
                ));
                continue;
            }

            if !self.config.reports_partial_imports() || usage.shown.is_empty() {
                continue;
            }
            let used = usage.used_shown();
            let unused = usage.unused_shown();
            if used.is_empty() || unused.is_empty() {
                continue;
            }
            let message = format!(
                "Import '{}' shows {} but never uses it",
                usage.uri,
                unused.join(", ")
            );
            issues.push(
                Issue::for_import(
                    IssueCategory::PartialImport,
                    &usage.uri,
                    usage.location.clone(),
                    package,
                )
                .with_message(message)
                .with_suggestion(format!("show {};", used.join(", "))),
            );
        }
        issues
    }

    /// Without semantics only prefixed or `show` imports can be judged
    fn check_names(
        &self,
        symbols: &SymbolCollection,
        references: &ReferenceCollection,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (path, file) in symbols.files() {
            let names = references.names_in_file(path);
            let mentioned = |name: &str| names.map(|n| n.contains(name)).unwrap_or(false);

            for directive in file.directives.iter().filter(|d| d.kind == DirectiveKind::Import) {
                let unused = match (&directive.prefix, directive.shown.is_empty()) {
                    (Some(prefix), _) => !mentioned(prefix),
                    (None, false) => !directive.shown.iter().any(|name| mentioned(name)),
                    (None, true) => false,
                };
                if unused {
                    issues.push(Issue::for_import(
                        IssueCategory::UnusedImport,
                        &directive.uri,
                        directive.location.clone(),
                        file.package.clone(),
                    ));
                }
            }
        }
        issues
    }
}
