//! Scan orchestration: provider → collector/resolver/DI → engine
//!
//! Every file-level pass runs in parallel; the engine runs once all of them
//! have finished.

use crate::analysis::{EngineInput, Issue, UsageEngine};
use crate::config::Config;
use crate::di::{DiRecognizer, DiUsage};
use crate::discovery::SourceFile;
use crate::graph::{
    ReferenceCollection, ReferenceResolver, ResolutionMode, SemanticReferenceCollection,
    SymbolCollection, SymbolCollector,
};
use crate::parser::{
    DartParser, DeclarationSource, ElementResolver, ParseContext, ParsedUnit, ScopeResolver,
};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters of a scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub files: usize,
    pub parsed: usize,
    /// Files the provider rejected
    pub failed: usize,
    /// Files whose semantic resolution failed
    pub unresolved: usize,
    pub packages: usize,
    /// Mode actually used, after any degradation
    pub mode: ResolutionMode,
}

/// Everything a scan produced
#[derive(Debug)]
pub struct ScanResult {
    pub symbols: SymbolCollection,
    pub references: ReferenceCollection,
    pub semantic: Option<SemanticReferenceCollection>,
    pub di: DiUsage,
    pub issues: Vec<Issue>,
    pub stats: ScanStats,
}

impl ScanResult {
    pub fn fixable_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.fixable)
    }
}

/// One file to scan: path, package, library URI, contents
struct Source {
    path: PathBuf,
    context: ParseContext,
    contents: Option<String>,
}

pub struct Scanner<'c> {
    config: &'c Config,
    parser: Box<dyn DeclarationSource>,
    resolver: Box<dyn ElementResolver>,
    progress: Option<ProgressBar>,
}

impl<'c> Scanner<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            parser: Box::new(DartParser::new()),
            resolver: Box::new(ScopeResolver::new()),
            progress: None,
        }
    }

    pub fn with_parser(mut self, parser: impl DeclarationSource + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ElementResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Tick `progress` once per file parsed
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Scan discovered files from disk
    pub fn scan(&self, files: &[SourceFile]) -> ScanResult {
        let sources: Vec<Source> = files
            .par_iter()
            .map(|file| {
                let contents = match file.read_contents() {
                    Ok(contents) => Some(contents),
                    Err(e) => {
                        warn!("{:?}", e);
                        None
                    }
                };
                Source {
                    path: file.path.clone(),
                    context: ParseContext::new(file.package.clone(), file.library_uri.clone()),
                    contents,
                }
            })
            .collect();
        self.run(sources)
    }

    /// Scan in-memory `(path, package, contents)` triples
    pub fn scan_sources(&self, sources: &[(PathBuf, String, String)]) -> ScanResult {
        let sources = sources
            .iter()
            .map(|(path, package, contents)| Source {
                path: path.clone(),
                context: ParseContext::new(package.clone(), in_memory_uri(path, package)),
                contents: Some(contents.clone()),
            })
            .collect();
        self.run(sources)
    }

    fn run(&self, sources: Vec<Source>) -> ScanResult {
        let files = sources.len();
        info!("Parsing {} files", files);

        let parsed: Vec<Option<ParsedUnit>> = sources
            .par_iter()
            .map(|source| {
                let unit = source.contents.as_ref().and_then(|contents| {
                    match self.parser.parse(&source.path, contents, &source.context) {
                        Ok(unit) => Some(unit),
                        Err(e) => {
                            debug!("Skipping {}: {}", source.path.display(), e);
                            None
                        }
                    }
                });
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
                unit
            })
            .collect();
        let failed = parsed.iter().filter(|u| u.is_none()).count();
        if failed > 0 {
            warn!("{} files could not be parsed and were skipped", failed);
        }

        let mut by_package: BTreeMap<String, Vec<ParsedUnit>> = BTreeMap::new();
        for unit in parsed.into_iter().flatten() {
            by_package.entry(unit.package.clone()).or_default().push(unit);
        }

        let collector = SymbolCollector::new();
        let mut symbols = SymbolCollection::new();
        for units in by_package.values() {
            symbols.merge(collector.collect(units, 0));
        }
        for _ in 0..failed {
            symbols.record_failure();
        }
        info!(
            "Collected {} declarations from {} packages",
            symbols.len(),
            by_package.len()
        );

        let index = symbols.library_index();
        let requested = self.config.resolution_mode();
        let resolver = ReferenceResolver::new(self.resolver.as_ref());
        let mut references = ReferenceCollection::new();
        let mut semantic: Option<SemanticReferenceCollection> = None;
        let mut unresolved = 0;
        for (package, units) in &by_package {
            let resolution = resolver.resolve(units, &index, requested);
            debug!(
                "Package {}: {} references ({} unresolved files)",
                package,
                resolution.references.len(),
                resolution.failed
            );
            references.merge(resolution.references);
            unresolved += resolution.failed;
            if let Some(layer) = resolution.semantic {
                match semantic.as_mut() {
                    Some(existing) => existing.merge(layer),
                    None => semantic = Some(layer),
                }
            }
        }

        let mode = if semantic.is_some() {
            ResolutionMode::Semantic
        } else {
            if requested == ResolutionMode::Semantic && !by_package.is_empty() {
                warn!("Semantic resolution unavailable; continuing in name-only mode");
            }
            ResolutionMode::NameOnly
        };

        let all_units: Vec<ParsedUnit> = by_package.into_values().flatten().collect();
        let di = DiRecognizer::new(&self.config.di_frameworks).recognize_all(&all_units);
        if let Some(layer) = semantic.as_mut() {
            layer.set_di_registrations(di.registered.clone());
        }
        debug!(
            "DI: {} registrations, {} retrievals",
            di.registered.len(),
            di.retrieved.len()
        );

        let issues = UsageEngine::new(self.config).analyze(&EngineInput {
            symbols: &symbols,
            references: &references,
            semantic: semantic.as_ref(),
            di: &di,
        });

        let stats = ScanStats {
            files,
            parsed: all_units.len(),
            failed,
            unresolved,
            packages: symbols.packages().len(),
            mode,
        };
        ScanResult {
            symbols,
            references,
            semantic,
            di,
            issues,
            stats,
        }
    }
}

/// Library URI for a file that was not discovered on disk
fn in_memory_uri(path: &Path, package: &str) -> String {
    let components: Vec<Component> = path.components().collect();
    let lib = components
        .iter()
        .rposition(|c| c.as_os_str() == "lib");
    match lib {
        Some(idx) => {
            let rest: PathBuf = components[idx + 1..].iter().collect();
            format!(
                "package:{}/{}",
                package,
                rest.to_string_lossy().replace('\\', "/")
            )
        }
        None => format!("file://{}", path.to_string_lossy().replace('\\', "/")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IssueCategory;
    use crate::parser::{LibraryLookup, ProviderError, ResolvedUnit};

    fn source(path: &str, contents: &str) -> (PathBuf, String, String) {
        (PathBuf::from(path), "app".to_string(), contents.to_string())
    }

    #[test]
    fn test_in_memory_uri() {
        assert_eq!(
            in_memory_uri(Path::new("/p/app/lib/src/a.dart"), "app"),
            "package:app/src/a.dart"
        );
        assert_eq!(
            in_memory_uri(Path::new("bin/main.dart"), "app"),
            "file://bin/main.dart"
        );
    }

    #[test]
    fn test_scan_sources_end_to_end() {
        let config = Config::default();
        let result = Scanner::new(&config).scan_sources(&[
            source("lib/a.dart", "class Used {}\nclass Unused {}\n"),
            source("lib/main.dart", "import 'a.dart';\nvoid main() { Used(); }\n"),
        ]);
        assert_eq!(result.stats.parsed, 2);
        assert_eq!(result.stats.mode, ResolutionMode::Semantic);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].symbol, "Unused");
        assert_eq!(result.issues[0].category, IssueCategory::UnusedClass);
        assert_eq!(result.fixable_issues().count(), 1);
    }

    #[test]
    fn test_parse_failure_is_not_fatal() {
        let config = Config::default();
        let result = Scanner::new(&config).scan_sources(&[
            source("lib/broken.dart", "class Broken {\n"),
            source("lib/main.dart", "void main() {}\nvoid _dead() {}\n"),
        ]);
        assert_eq!(result.stats.failed, 1);
        assert_eq!(result.symbols.failed(), 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].symbol, "_dead");
    }

    struct NoAnalyzer;

    impl ElementResolver for NoAnalyzer {
        fn resolve(
            &self,
            _unit: &ParsedUnit,
            _index: &dyn LibraryLookup,
        ) -> Result<ResolvedUnit, ProviderError> {
            Err(ProviderError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_unavailable_resolver_degrades_to_name_only() {
        let config = Config::default();
        let result = Scanner::new(&config)
            .with_resolver(NoAnalyzer)
            .scan_sources(&[source(
                "lib/main.dart",
                "import 'dart:math';\nvoid main() { print(max(1, 2)); }\n",
            )]);
        assert_eq!(result.stats.mode, ResolutionMode::NameOnly);
        assert_eq!(result.stats.unresolved, 1);
        assert!(result.semantic.is_none());
        // plain imports cannot be judged without semantics
        assert!(result.issues.is_empty());
    }
}
