// Usage determination: issue model, inheritance maps, exclusions, engine

mod exclusions;
mod imports;
mod inheritance;
mod usage;

pub use exclusions::{is_test_file, ExclusionPolicy, ExclusionReason};
pub use imports::ImportChecker;
pub use inheritance::{ImplementationMap, InheritanceMap};
pub use usage::{EngineInput, ReferencePredicate, UsageEngine};

use crate::graph::{Declaration, DeclarationKind, Location};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity of an issue
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!(
                "unknown severity '{}' (expected info, warning or error)",
                other
            )),
        }
    }
}

/// What kind of dead code an issue describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Class, mixin, extension, extension type, enum or typedef
    UnusedClass,
    /// Top-level function
    UnusedFunction,
    /// Method, getter or setter
    UnusedMethod,
    /// Field or top-level variable
    UnusedField,
    UnusedParameter,
    UnusedImport,
    /// Some `show` names of an import are never used
    PartialImport,
}

impl IssueCategory {
    /// Category a declaration kind is reported under, if any
    pub fn for_kind(kind: DeclarationKind) -> Option<Self> {
        match kind {
            DeclarationKind::Class
            | DeclarationKind::Mixin
            | DeclarationKind::Extension
            | DeclarationKind::ExtensionType
            | DeclarationKind::Enum
            | DeclarationKind::Typedef => Some(IssueCategory::UnusedClass),
            DeclarationKind::Function => Some(IssueCategory::UnusedFunction),
            DeclarationKind::Method | DeclarationKind::Getter | DeclarationKind::Setter => {
                Some(IssueCategory::UnusedMethod)
            }
            DeclarationKind::Field | DeclarationKind::Variable => Some(IssueCategory::UnusedField),
            DeclarationKind::Parameter => Some(IssueCategory::UnusedParameter),
            DeclarationKind::Import => Some(IssueCategory::UnusedImport),
            DeclarationKind::Constructor | DeclarationKind::EnumValue | DeclarationKind::Export => {
                None
            }
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            IssueCategory::UnusedParameter | IssueCategory::PartialImport => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            IssueCategory::UnusedClass => "DC001",
            IssueCategory::UnusedFunction => "DC002",
            IssueCategory::UnusedMethod => "DC003",
            IssueCategory::UnusedField => "DC004",
            IssueCategory::UnusedParameter => "DC005",
            IssueCategory::UnusedImport => "DC006",
            IssueCategory::PartialImport => "DC007",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::UnusedClass => "unused-class",
            IssueCategory::UnusedFunction => "unused-function",
            IssueCategory::UnusedMethod => "unused-method",
            IssueCategory::UnusedField => "unused-field",
            IssueCategory::UnusedParameter => "unused-parameter",
            IssueCategory::UnusedImport => "unused-import",
            IssueCategory::PartialImport => "partial-import",
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self, IssueCategory::UnusedImport | IssueCategory::PartialImport)
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finding of the usage engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub category: IssueCategory,
    pub severity: Severity,

    /// Declared name, or the import URI for import issues
    pub symbol: String,

    /// Declaration kind (`Import` for import issues)
    pub kind: Option<DeclarationKind>,

    /// Name position; offset/length span the removable text
    pub location: Location,

    pub message: String,
    pub suggestion: Option<String>,

    /// First source line of the declaration
    pub snippet: Option<String>,

    /// Whether the fixer may delete the range
    pub fixable: bool,

    pub package: String,

    /// Owning type or function
    pub parent: Option<String>,
}

impl Issue {
    pub fn new(category: IssueCategory, decl: &Declaration) -> Self {
        Self {
            category,
            severity: category.default_severity(),
            symbol: decl.name.clone(),
            kind: Some(decl.kind),
            location: decl.location.clone(),
            message: default_message(category, decl),
            suggestion: None,
            snippet: decl.signature.clone(),
            fixable: is_fixable(category, decl),
            package: decl.package.clone(),
            parent: decl.parent.clone(),
        }
    }

    /// Issue for an import directive
    pub fn for_import(
        category: IssueCategory,
        uri: &str,
        location: Location,
        package: String,
    ) -> Self {
        let message = match category {
            IssueCategory::PartialImport => {
                format!("Import '{}' is only partially used", uri)
            }
            _ => format!("Import '{}' is never used", uri),
        };
        Self {
            category,
            severity: category.default_severity(),
            symbol: uri.to_string(),
            kind: Some(DeclarationKind::Import),
            location,
            message,
            suggestion: None,
            snippet: None,
            fixable: category == IssueCategory::UnusedImport,
            package,
            parent: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }

    pub fn code(&self) -> &'static str {
        self.category.code()
    }

    /// "Owner.name" or plain name
    pub fn qualified_symbol(&self) -> String {
        match &self.parent {
            Some(parent) if self.category != IssueCategory::UnusedParameter => {
                format!("{}.{}", parent, self.symbol)
            }
            _ => self.symbol.clone(),
        }
    }
}

fn default_message(category: IssueCategory, decl: &Declaration) -> String {
    match category {
        IssueCategory::UnusedParameter => match &decl.parent {
            Some(owner) => format!("Parameter '{}' of '{}' is never used", decl.name, owner),
            None => format!("Parameter '{}' is never used", decl.name),
        },
        _ => {
            let kind = decl.kind.display_name();
            let mut chars = kind.chars();
            let kind = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            };
            format!("{} '{}' is never used", kind, decl.qualified_name())
        }
    }
}

fn is_fixable(category: IssueCategory, decl: &Declaration) -> bool {
    match category {
        IssueCategory::UnusedClass
        | IssueCategory::UnusedFunction
        | IssueCategory::UnusedMethod => decl.location.length > 0,
        IssueCategory::UnusedField => decl.single_declarator && decl.location.length > 0,
        IssueCategory::UnusedImport => true,
        IssueCategory::UnusedParameter | IssueCategory::PartialImport => false,
    }
}
