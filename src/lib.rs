//! dartdeadcode - Dead code detection and removal for Dart and Flutter projects
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. **Discovery** - Find `.dart` files and the pub packages they belong to
//! 2. **Parsing** - Extract declarations, directives and usages per file
//! 3. **Collection** - Merge declarations into a [`graph::SymbolCollection`]
//! 4. **Resolution** - Resolve usages to names and, in semantic mode, element IDs
//! 5. **DI recognition** - Treat injected types as used
//! 6. **Usage determination** - Decide what is unused and emit [`Issue`]s
//! 7. **Fixing** - Delete fixable issues and cascade through orphaned private code
//! 8. **Reporting** - Terminal or JSON output

pub mod analysis;
pub mod config;
pub mod di;
pub mod discovery;
pub mod graph;
pub mod parser;
pub mod refactor;
pub mod report;
pub mod scan;

pub use analysis::{Issue, IssueCategory, Severity, UsageEngine};
pub use config::Config;
pub use di::{DiFramework, DiRecognizer};
pub use discovery::{FileFinder, SourceFile};
pub use graph::{Declaration, DeclarationKind, Location, ResolutionMode};
pub use parser::{DartParser, DeclarationSource, ElementResolver, ScopeResolver};
pub use refactor::{FixResult, Fixer, UndoScript};
pub use report::{ReportFormat, Reporter};
pub use scan::{ScanResult, ScanStats, Scanner};
