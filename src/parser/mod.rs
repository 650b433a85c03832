mod common;
mod dart;
mod lexer;
mod resolver;

pub use common::{
    DeclarationSource, Directive, DirectiveKind, ElementBinding, ElementResolver, Invocation,
    LibraryInfo, LibraryLookup, ParseContext, ParsedUnit, ProviderError, ResolvedUnit, Usage,
};
pub use dart::DartParser;
pub use resolver::{resolve_relative, LibraryIndex, ScopeResolver};
