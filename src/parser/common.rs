//! Provider contract between the analysis core and a source-language front end
//!
//! The core only consumes [`ParsedUnit`] and [`ResolvedUnit`]; it never looks at
//! tokens or syntax trees.

use crate::graph::{Declaration, DeclarationKind, ImportUsage, Location, ReferenceKind};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single file could not be parsed or resolved
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("element resolution unavailable: {0}")]
    Unavailable(String),
}

/// Where a file sits: its package and library URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    pub package: String,
    pub library_uri: String,
}

impl ParseContext {
    pub fn new(package: impl Into<String>, library_uri: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            library_uri: library_uri.into(),
        }
    }
}

/// An import, export, part, or library directive
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Import or Export; `part`/`library` use [`DirectiveKind`]
    pub kind: DirectiveKind,
    pub uri: String,
    pub prefix: Option<String>,
    pub shown: Vec<String>,
    pub hidden: Vec<String>,
    pub deferred: bool,
    /// Whole directive including the trailing `;`
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Import,
    Export,
    Part,
    PartOf,
    Library,
}

impl DirectiveKind {
    pub fn declaration_kind(&self) -> Option<DeclarationKind> {
        match self {
            DirectiveKind::Import => Some(DeclarationKind::Import),
            DirectiveKind::Export => Some(DeclarationKind::Export),
            _ => None,
        }
    }
}

impl Directive {
    pub fn is_import(&self) -> bool {
        self.kind == DirectiveKind::Import
    }

    /// Whether `name` is visible through this directive's combinators
    pub fn exposes(&self, name: &str) -> bool {
        if !self.shown.is_empty() && !self.shown.iter().any(|s| s == name) {
            return false;
        }
        !self.hidden.iter().any(|h| h == name)
    }
}

/// A use site of a name as reported by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    pub name: String,
    /// Identifier immediately before `.`/`?.` (import prefix or receiver)
    pub qualifier: Option<String>,
    pub kind: ReferenceKind,
    pub location: Location,
    /// Innermost enclosing type, if any
    pub enclosing: Option<String>,
    /// Accessed through `.`, `?.` or a cascade
    pub is_member: bool,
}

/// Call or instantiation shape `target.name<TypeArgs>(...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Dotted receiver chain, e.g. `GetIt.I`, `context`, `ref`
    pub target: Option<String>,
    pub name: String,
    /// Simple names of the explicit type arguments
    pub type_args: Vec<String>,
    pub location: Location,
}

/// Result of parsing a single file
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub path: PathBuf,
    pub package: String,
    pub library_uri: String,
    pub declarations: Vec<Declaration>,
    pub directives: Vec<Directive>,
    pub usages: Vec<Usage>,
    pub invocations: Vec<Invocation>,
}

impl ParsedUnit {
    pub fn new(path: &Path, context: &ParseContext) -> Self {
        Self {
            path: path.to_path_buf(),
            package: context.package.clone(),
            library_uri: context.library_uri.clone(),
            declarations: Vec::new(),
            directives: Vec::new(),
            usages: Vec::new(),
            invocations: Vec::new(),
        }
    }

    pub fn imports(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| d.is_import())
    }

    pub fn import_prefixes(&self) -> BTreeSet<&str> {
        self.imports().filter_map(|d| d.prefix.as_deref()).collect()
    }
}

/// One usage bound to a stable element identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBinding {
    pub element_id: String,
    /// Enclosing chain of the bound element, outermost first
    pub enclosing: Vec<String>,
    /// Library the element is declared in
    pub library_uri: String,
}

/// Semantic facts about a single file
#[derive(Debug, Clone, Default)]
pub struct ResolvedUnit {
    pub library_uri: String,
    pub bindings: Vec<ElementBinding>,
    /// Named extensions whose members are used implicitly
    pub used_extensions: BTreeSet<String>,
    pub import_usage: Vec<ImportUsage>,
}

/// Yields declarations, directives and usages for a source file
pub trait DeclarationSource: Send + Sync {
    fn parse(
        &self,
        path: &Path,
        contents: &str,
        context: &ParseContext,
    ) -> Result<ParsedUnit, ProviderError>;
}

/// Top-level and member facts of one library, as seen by the resolver
#[derive(Debug, Clone, Default)]
pub struct LibraryInfo {
    pub uri: String,
    pub file: PathBuf,
    /// name -> kind of every top-level declaration
    pub top_level: HashMap<String, DeclarationKind>,
    /// type name -> member names
    pub members: HashMap<String, BTreeSet<String>>,
    /// type name -> direct supertypes
    pub supertypes: HashMap<String, Vec<String>>,
    /// extension name -> member names; unnamed extensions use `<on Type>`
    pub extensions: Vec<(String, BTreeSet<String>)>,
    pub exports: Vec<Directive>,
    /// Resolved URIs of `part` files
    pub parts: Vec<String>,
    /// Resolved URI of the owning library, for a `part of` file
    pub part_of: Option<String>,
}

/// Cross-file view handed to an [`ElementResolver`]
pub trait LibraryLookup: Sync {
    fn library(&self, uri: &str) -> Option<&LibraryInfo>;

    /// Library URI for an import written in `from_file`
    fn resolve_uri(&self, from_file: &Path, uri: &str) -> Option<String>;
}

/// Binds usages to element identities (semantic mode)
pub trait ElementResolver: Send + Sync {
    fn resolve(
        &self,
        unit: &ParsedUnit,
        index: &dyn LibraryLookup,
    ) -> Result<ResolvedUnit, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(shown: &[&str], hidden: &[&str]) -> Directive {
        Directive {
            kind: DirectiveKind::Import,
            uri: "a.dart".to_string(),
            prefix: None,
            shown: shown.iter().map(|s| s.to_string()).collect(),
            hidden: hidden.iter().map(|s| s.to_string()).collect(),
            deferred: false,
            location: Location::new(PathBuf::from("lib/main.dart"), 1, 1, 0, 10),
        }
    }

    #[test]
    fn test_exposes_respects_combinators() {
        assert!(directive(&[], &[]).exposes("Anything"));
        assert!(directive(&["X"], &[]).exposes("X"));
        assert!(!directive(&["X"], &[]).exposes("Y"));
        assert!(!directive(&[], &["Y"]).exposes("Y"));
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Syntax {
            message: "unbalanced braces".to_string(),
            line: 3,
            column: 7,
        };
        assert_eq!(err.to_string(), "syntax error at 3:7: unbalanced braces");
    }
}
