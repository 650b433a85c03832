use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Separator between the segments of an element ID
pub const ELEMENT_SEPARATOR: &str = "::";

/// Identity of a declaration: (package, file, parent, name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationId {
    pub package: String,
    pub file: PathBuf,
    pub parent: Option<String>,
    pub name: String,
}

impl std::fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.parent {
            Some(parent) => write!(
                f,
                "{}:{}:{}.{}",
                self.package,
                self.file.display(),
                parent,
                self.name
            ),
            None => write!(f, "{}:{}:{}", self.package, self.file.display(), self.name),
        }
    }
}

/// Kind of declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    // Types
    Class,
    Mixin,
    Extension,
    ExtensionType,
    Enum,
    Typedef,

    // Top-level
    Function,
    Variable,

    // Members
    Constructor,
    Method,
    Getter,
    Setter,
    Field,
    EnumValue,
    Parameter,

    // Directives
    Import,
    Export,
}

impl DeclarationKind {
    /// Type-like declarations that can own members
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Mixin
                | DeclarationKind::Extension
                | DeclarationKind::ExtensionType
                | DeclarationKind::Enum
                | DeclarationKind::Typedef
        )
    }

    /// Types that can participate in extends/implements/with
    pub fn is_inheritable(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Mixin
                | DeclarationKind::Enum
                | DeclarationKind::ExtensionType
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Function
                | DeclarationKind::Method
                | DeclarationKind::Constructor
                | DeclarationKind::Getter
                | DeclarationKind::Setter
        )
    }

    /// Instance-or-static members living inside a type body
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Method
                | DeclarationKind::Getter
                | DeclarationKind::Setter
                | DeclarationKind::Field
                | DeclarationKind::Constructor
                | DeclarationKind::EnumValue
        )
    }

    /// Methods in the broad sense: anything that can be overridden by name
    pub fn is_method_like(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Method | DeclarationKind::Getter | DeclarationKind::Setter
        )
    }

    pub fn is_directive(&self) -> bool {
        matches!(self, DeclarationKind::Import | DeclarationKind::Export)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Mixin => "mixin",
            DeclarationKind::Extension => "extension",
            DeclarationKind::ExtensionType => "extension type",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Typedef => "typedef",
            DeclarationKind::Function => "function",
            DeclarationKind::Variable => "top-level variable",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::Method => "method",
            DeclarationKind::Getter => "getter",
            DeclarationKind::Setter => "setter",
            DeclarationKind::Field => "field",
            DeclarationKind::EnumValue => "enum value",
            DeclarationKind::Parameter => "parameter",
            DeclarationKind::Import => "import",
            DeclarationKind::Export => "export",
        }
    }
}

/// Visibility, derived from Dart's leading-underscore convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn from_name(name: &str) -> Self {
        if name.starts_with('_') {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

/// Location in source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number of the name (1-indexed)
    pub line: usize,
    /// Column number of the name (1-indexed)
    pub column: usize,
    /// Starting byte offset of the whole construct
    pub offset: usize,
    /// Byte length of the whole construct
    pub length: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset,
            length,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset < self.end()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Half-open byte range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

impl ByteSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// A declaration in the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Simple name (e.g., "UserRepository", "operator+")
    pub name: String,

    /// Kind of declaration
    pub kind: DeclarationKind,

    /// Location of the name; offset/length cover the whole declaration
    pub location: Location,

    /// Visibility derived from the name
    pub visibility: Visibility,

    pub is_static: bool,
    pub is_override: bool,
    pub is_abstract: bool,

    /// Owning package
    pub package: String,

    /// Library URI of the declaring file
    pub library: String,

    /// Owning type, or owning function for parameters
    pub parent: Option<String>,

    /// Annotation names without `@`, prefix, or arguments
    pub annotations: Vec<String>,

    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub mixins: Vec<String>,

    /// `on` clause types (mixin constraints, extension target)
    pub on_types: Vec<String>,

    /// Body of the owning function (for parameters) or of the callable itself
    pub body: Option<ByteSpan>,

    /// First source line of the declaration, for reports
    pub signature: Option<String>,

    /// False when several variables share one declaration statement
    pub single_declarator: bool,
}

impl Declaration {
    pub fn new(name: String, kind: DeclarationKind, location: Location, package: String) -> Self {
        let visibility = Visibility::from_name(&name);
        Self {
            name,
            kind,
            location,
            visibility,
            is_static: false,
            is_override: false,
            is_abstract: false,
            package,
            library: String::new(),
            parent: None,
            annotations: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            mixins: Vec::new(),
            on_types: Vec::new(),
            body: None,
            signature: None,
            single_declarator: true,
        }
    }

    pub fn id(&self) -> DeclarationId {
        DeclarationId {
            package: self.package.clone(),
            file: self.location.file.clone(),
            parent: self.parent.clone(),
            name: self.name.clone(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none() && !self.kind.is_directive()
    }

    pub fn is_operator(&self) -> bool {
        self.name.starts_with("operator")
            && self.name.len() > "operator".len()
            && !self.name["operator".len()..]
                .chars()
                .next()
                .map(|c| c.is_alphanumeric() || c == '_')
                .unwrap_or(false)
    }

    /// "Owner.name" key used by the implementation map
    pub fn member_key(&self) -> Option<String> {
        self.parent
            .as_ref()
            .filter(|_| self.kind.is_member())
            .map(|parent| format!("{}.{}", parent, self.name))
    }

    /// Stable element ID: library URI, enclosing chain, name
    pub fn element_id(&self) -> String {
        match &self.parent {
            Some(parent) if self.kind != DeclarationKind::Parameter => format!(
                "{}{sep}{}{sep}{}",
                self.library,
                parent,
                self.name,
                sep = ELEMENT_SEPARATOR
            ),
            _ => format!("{}{}{}", self.library, ELEMENT_SEPARATOR, self.name),
        }
    }

    /// All supertypes named in extends/implements/with/on clauses
    pub fn super_types(&self) -> impl Iterator<Item = &String> {
        self.superclass
            .iter()
            .chain(self.interfaces.iter())
            .chain(self.mixins.iter())
            .chain(self.on_types.iter().filter(move |_| self.kind == DeclarationKind::Mixin))
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    /// Get a display string for this declaration
    pub fn display(&self) -> String {
        format!(
            "{} {} ({})",
            self.kind.display_name(),
            self.qualified_name(),
            self.location
        )
    }

    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}
