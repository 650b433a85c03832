// Reference resolution in name-only and semantic modes

use super::{Reference, ReferenceCollection, SemanticReferenceCollection};
use crate::parser::{ElementResolver, LibraryLookup, ParsedUnit};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How references are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Identifier names only
    NameOnly,
    /// Names plus resolved element IDs and import usage
    Semantic,
}

impl ResolutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMode::NameOnly => "name-only",
            ResolutionMode::Semantic => "semantic",
        }
    }
}

/// Output of [`ReferenceResolver::resolve`]
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub references: ReferenceCollection,
    /// Present only when semantic resolution succeeded for at least one file
    pub semantic: Option<SemanticReferenceCollection>,
    /// Files whose semantic pass failed
    pub failed: usize,
}

/// Walks usages into a [`ReferenceCollection`] and, in semantic mode, a
/// [`SemanticReferenceCollection`]
pub struct ReferenceResolver<'r> {
    resolver: &'r dyn ElementResolver,
}

impl<'r> ReferenceResolver<'r> {
    pub fn new(resolver: &'r dyn ElementResolver) -> Self {
        Self { resolver }
    }

    /// Name-based references only
    pub fn name_references(units: &[ParsedUnit]) -> ReferenceCollection {
        units
            .par_iter()
            .fold(ReferenceCollection::new, |mut acc, unit| {
                for usage in &unit.usages {
                    acc.add(
                        Reference::new(
                            usage.name.clone(),
                            usage.kind,
                            usage.location.clone(),
                            unit.package.clone(),
                        )
                        .with_qualifier(usage.qualifier.clone()),
                    );
                }
                acc
            })
            .reduce(ReferenceCollection::new, |mut a, b| {
                a.merge(b);
                a
            })
    }

    pub fn resolve(
        &self,
        units: &[ParsedUnit],
        index: &dyn LibraryLookup,
        mode: ResolutionMode,
    ) -> Resolution {
        let references = Self::name_references(units);
        debug!("Recorded {} name references", references.len());

        if mode == ResolutionMode::NameOnly || units.is_empty() {
            return Resolution {
                references,
                semantic: None,
                failed: 0,
            };
        }

        let (semantic, resolved, failed) = units
            .par_iter()
            .fold(
                || (SemanticReferenceCollection::new(), 0usize, 0usize),
                |(mut acc, ok, failed), unit| match self.resolver.resolve(unit, index) {
                    Ok(resolved) => {
                        acc.add_unit(resolved);
                        (acc, ok + 1, failed)
                    }
                    Err(e) => {
                        debug!("Resolution failed for {} (continuing): {}", unit.path.display(), e);
                        (acc, ok, failed + 1)
                    }
                },
            )
            .reduce(
                || (SemanticReferenceCollection::new(), 0, 0),
                |(mut a, a_ok, a_failed), (b, b_ok, b_failed)| {
                    a.merge(b);
                    (a, a_ok + b_ok, a_failed + b_failed)
                },
            );

        if resolved == 0 {
            warn!("Semantic resolution unavailable for every file; falling back to name-only mode");
            return Resolution {
                references,
                semantic: None,
                failed,
            };
        }

        info!(
            "Resolved {} element IDs across {} files ({} failed)",
            semantic.element_count(),
            resolved,
            failed
        );
        Resolution {
            references,
            semantic: Some(semantic),
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SymbolCollector;
    use crate::parser::{
        DartParser, DeclarationSource, LibraryIndex, ParseContext, ProviderError, ResolvedUnit,
        ScopeResolver,
    };
    use std::path::Path;

    struct Unavailable;

    impl ElementResolver for Unavailable {
        fn resolve(
            &self,
            _unit: &ParsedUnit,
            _index: &dyn LibraryLookup,
        ) -> Result<ResolvedUnit, ProviderError> {
            Err(ProviderError::Unavailable("no analyzer".to_string()))
        }
    }

    fn units() -> Vec<ParsedUnit> {
        let parser = DartParser::new();
        vec![
            parser
                .parse(
                    Path::new("lib/a.dart"),
                    "class A { void run() {} }",
                    &ParseContext::new("app", "package:app/a.dart"),
                )
                .unwrap(),
            parser
                .parse(
                    Path::new("lib/main.dart"),
                    "import 'a.dart';\nvoid main() { A().run(); }",
                    &ParseContext::new("app", "package:app/main.dart"),
                )
                .unwrap(),
        ]
    }

    #[test]
    fn test_semantic_mode_binds_elements() {
        let units = units();
        let index = SymbolCollector::new().collect(&units, 0).library_index();
        let resolver = ScopeResolver::new();
        let resolution =
            ReferenceResolver::new(&resolver).resolve(&units, &index, ResolutionMode::Semantic);

        assert!(resolution.references.contains("run"));
        let semantic = resolution.semantic.expect("semantic layer");
        assert!(semantic.is_element_used("package:app/a.dart::A"));
        assert_eq!(resolution.failed, 0);
    }

    #[test]
    fn test_unavailable_resolver_degrades_to_name_only() {
        let units = units();
        let index = LibraryIndex::new();
        let resolution = ReferenceResolver::new(&Unavailable).resolve(
            &units,
            &index,
            ResolutionMode::Semantic,
        );
        assert!(resolution.semantic.is_none());
        assert_eq!(resolution.failed, 2);
        assert!(resolution.references.contains("A"));
    }
}
