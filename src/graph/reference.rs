use super::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Kind of reference observed at a use site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Calling a function/method/constructor
    Invocation,

    /// Type annotation, type argument, cast, `is` check
    TypeUsage,

    /// extends/implements/with/on
    Inheritance,

    /// `a.b`, `a?.b`, cascades
    PropertyAccess,

    /// Writes, including constructor initializers and `this.x` formals
    Assignment,

    /// `@Name`
    Annotation,

    /// Plain read of a name
    Read,
}

impl ReferenceKind {
    pub fn is_write(&self) -> bool {
        matches!(self, ReferenceKind::Assignment)
    }

    pub fn is_member_access(&self) -> bool {
        matches!(self, ReferenceKind::PropertyAccess | ReferenceKind::Invocation)
    }
}

/// An observed use of a name. Never owns a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Referenced identifier, or an `operator<token>` pseudo-name
    pub name: String,

    /// Identifier immediately before a `.` (import prefix or receiver)
    pub qualifier: Option<String>,

    pub kind: ReferenceKind,

    pub location: Location,

    /// Owning package
    pub package: String,
}

impl Reference {
    pub fn new(name: String, kind: ReferenceKind, location: Location, package: String) -> Self {
        Self {
            name,
            qualifier: None,
            kind,
            location,
            package,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Option<String>) -> Self {
        self.qualifier = qualifier;
        self
    }
}

/// Per-import bookkeeping in semantic mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportUsage {
    /// Importing file
    pub file: PathBuf,

    pub uri: String,

    pub prefix: Option<String>,

    /// Names listed in `show` combinators
    pub shown: Vec<String>,

    /// Names listed in `hide` combinators
    pub hidden: Vec<String>,

    /// Names actually resolved through this import
    pub used: BTreeSet<String>,

    /// Used in a way that cannot be attributed to a symbol
    pub implicitly_used: bool,

    /// Location of the directive
    pub location: Location,
}

impl ImportUsage {
    pub fn key(&self) -> ImportKey {
        ImportKey {
            file: self.file.clone(),
            uri: self.uri.clone(),
            prefix: self.prefix.clone(),
        }
    }

    pub fn is_unused(&self) -> bool {
        self.used.is_empty() && !self.implicitly_used
    }

    /// Shown names never referenced, in declaration order
    pub fn unused_shown(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter(|name| !self.used.contains(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Shown names that are referenced, in declaration order
    pub fn used_shown(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter(|name| self.used.contains(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Fold another observation of the same import into this one
    pub fn absorb(&mut self, other: &ImportUsage) {
        self.used.extend(other.used.iter().cloned());
        self.implicitly_used |= other.implicitly_used;
    }
}

/// Key of an import: file, URI and prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportKey {
    pub file: PathBuf,
    pub uri: String,
    pub prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(shown: &[&str], used: &[&str]) -> ImportUsage {
        ImportUsage {
            file: PathBuf::from("lib/main.dart"),
            uri: "a.dart".to_string(),
            prefix: None,
            shown: shown.iter().map(|s| s.to_string()).collect(),
            hidden: Vec::new(),
            used: used.iter().map(|s| s.to_string()).collect(),
            implicitly_used: false,
            location: Location::new(PathBuf::from("lib/main.dart"), 1, 1, 0, 20),
        }
    }

    #[test]
    fn test_reference_kind_is_write() {
        assert!(ReferenceKind::Assignment.is_write());
        assert!(!ReferenceKind::Read.is_write());
    }

    #[test]
    fn test_import_usage_partial() {
        let import = usage(&["X", "Y"], &["X"]);
        assert!(!import.is_unused());
        assert_eq!(import.used_shown(), vec!["X"]);
        assert_eq!(import.unused_shown(), vec!["Y"]);
    }

    #[test]
    fn test_import_usage_absorb() {
        let mut first = usage(&[], &[]);
        assert!(first.is_unused());
        let mut second = usage(&[], &["Z"]);
        second.implicitly_used = true;
        first.absorb(&second);
        assert!(first.used.contains("Z"));
        assert!(first.implicitly_used);
    }
}
