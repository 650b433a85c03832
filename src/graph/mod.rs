mod collector;
mod declaration;
pub mod reference;
mod resolver;

pub use collector::SymbolCollector;
pub use declaration::{
    ByteSpan, Declaration, DeclarationId, DeclarationKind, Location, Visibility,
    ELEMENT_SEPARATOR,
};
pub use reference::{ImportKey, ImportUsage, Reference, ReferenceKind};
pub use resolver::{ReferenceResolver, Resolution, ResolutionMode};

use crate::di::DiRegistration;
use crate::parser::{Directive, ElementBinding, LibraryIndex, ResolvedUnit};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Declarations and directives of one file
#[derive(Debug, Clone, Default)]
pub struct FileSymbols {
    pub package: String,
    pub library_uri: String,
    pub declarations: Vec<Declaration>,
    pub directives: Vec<Directive>,
}

/// All declarations of a scan, grouped by file
#[derive(Debug, Clone, Default)]
pub struct SymbolCollection {
    files: BTreeMap<PathBuf, FileSymbols>,
    failed: usize,
}

impl SymbolCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: PathBuf, symbols: FileSymbols) {
        self.files.insert(path, symbols);
    }

    /// Count a file whose provider pass failed
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Union with another collection (e.g. another package)
    pub fn merge(&mut self, other: SymbolCollection) {
        self.files.extend(other.files);
        self.failed += other.failed;
    }

    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &FileSymbols)> {
        self.files.iter()
    }

    pub fn file(&self, path: &Path) -> Option<&FileSymbols> {
        self.files.get(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.files.values().flat_map(|f| f.declarations.iter())
    }

    pub fn len(&self) -> usize {
        self.files.values().map(|f| f.declarations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn packages(&self) -> BTreeSet<&str> {
        self.files.values().map(|f| f.package.as_str()).collect()
    }

    /// Library index for the scope resolver
    pub fn library_index(&self) -> LibraryIndex {
        let mut index = LibraryIndex::new();
        for (path, file) in &self.files {
            index.add_library(path, &file.library_uri, &file.declarations, &file.directives);
        }
        index
    }
}

/// Name-based references of a scan
#[derive(Debug, Clone, Default)]
pub struct ReferenceCollection {
    references: Vec<Reference>,
    names: HashMap<String, usize>,
    by_file: HashMap<PathBuf, HashSet<String>>,
}

impl ReferenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reference: Reference) {
        *self.names.entry(reference.name.clone()).or_default() += 1;
        self.by_file
            .entry(reference.location.file.clone())
            .or_default()
            .insert(reference.name.clone());
        self.references.push(reference);
    }

    /// Concatenate another collection into this one
    pub fn merge(&mut self, other: ReferenceCollection) {
        for (name, count) in other.names {
            *self.names.entry(name).or_default() += count;
        }
        for (file, names) in other.by_file {
            self.by_file.entry(file).or_default().extend(names);
        }
        self.references.extend(other.references);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.names.get(name).copied().unwrap_or(0)
    }

    /// Names referenced from within `file`
    pub fn names_in_file(&self, file: &Path) -> Option<&HashSet<String>> {
        self.by_file.get(file)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Semantic layer: resolved element IDs, extension and import usage
#[derive(Debug, Clone, Default)]
pub struct SemanticReferenceCollection {
    used_element_ids: HashSet<String>,
    used_simple_names: HashSet<String>,
    used_member_keys: HashSet<String>,
    used_extensions: BTreeSet<String>,
    import_usage: BTreeMap<ImportKey, ImportUsage>,
    di_registrations: Vec<DiRegistration>,
}

impl SemanticReferenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binding(&mut self, binding: &ElementBinding) {
        let simple = binding
            .element_id
            .rsplit(ELEMENT_SEPARATOR)
            .next()
            .unwrap_or(&binding.element_id)
            .to_string();
        if let Some(owner) = binding.enclosing.last() {
            self.used_member_keys.insert(format!("{}.{}", owner, simple));
        }
        self.used_simple_names.insert(simple);
        self.used_element_ids.insert(binding.element_id.clone());
    }

    pub fn add_unit(&mut self, unit: ResolvedUnit) {
        for binding in &unit.bindings {
            self.add_binding(binding);
        }
        self.used_extensions.extend(unit.used_extensions);
        for usage in unit.import_usage {
            self.add_import_usage(usage);
        }
    }

    fn add_import_usage(&mut self, usage: ImportUsage) {
        match self.import_usage.get_mut(&usage.key()) {
            Some(existing) => existing.absorb(&usage),
            None => {
                self.import_usage.insert(usage.key(), usage);
            }
        }
    }

    pub fn set_di_registrations(&mut self, registrations: Vec<DiRegistration>) {
        self.di_registrations = registrations;
    }

    /// Union with another collection
    pub fn merge(&mut self, other: SemanticReferenceCollection) {
        self.used_element_ids.extend(other.used_element_ids);
        self.used_simple_names.extend(other.used_simple_names);
        self.used_member_keys.extend(other.used_member_keys);
        self.used_extensions.extend(other.used_extensions);
        for (_, usage) in other.import_usage {
            self.add_import_usage(usage);
        }
        self.di_registrations.extend(other.di_registrations);
    }

    pub fn is_element_used(&self, element_id: &str) -> bool {
        self.used_element_ids.contains(element_id)
    }

    pub fn is_simple_name_used(&self, name: &str) -> bool {
        self.used_simple_names.contains(name)
    }

    /// "Owner.member" resolved at least once
    pub fn is_member_key_used(&self, key: &str) -> bool {
        self.used_member_keys.contains(key)
    }

    pub fn is_extension_used(&self, name: &str) -> bool {
        self.used_extensions.contains(name)
    }

    pub fn import_usage(&self) -> impl Iterator<Item = &ImportUsage> {
        self.import_usage.values()
    }

    pub fn di_registrations(&self) -> &[DiRegistration] {
        &self.di_registrations
    }

    pub fn element_count(&self) -> usize {
        self.used_element_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str) -> Location {
        Location::new(PathBuf::from(file), 1, 1, 0, 1)
    }

    #[test]
    fn test_symbol_collection_merge_keeps_packages() {
        let mut a = SymbolCollection::new();
        a.add_file(
            PathBuf::from("core/lib/a.dart"),
            FileSymbols {
                package: "core".to_string(),
                ..Default::default()
            },
        );
        let mut b = SymbolCollection::new();
        b.add_file(
            PathBuf::from("app/lib/b.dart"),
            FileSymbols {
                package: "app".to_string(),
                ..Default::default()
            },
        );
        b.record_failure();
        a.merge(b);
        assert_eq!(a.file_count(), 2);
        assert_eq!(a.failed(), 1);
        assert_eq!(a.packages().into_iter().collect::<Vec<_>>(), vec!["app", "core"]);
    }

    #[test]
    fn test_reference_collection_merge_concatenates() {
        let mut a = ReferenceCollection::new();
        a.add(Reference::new("foo".into(), ReferenceKind::Read, loc("a.dart"), "app".into()));
        let mut b = ReferenceCollection::new();
        b.add(Reference::new("foo".into(), ReferenceKind::Invocation, loc("b.dart"), "app".into()));
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.count("foo"), 2);
        assert!(a.names_in_file(Path::new("b.dart")).unwrap().contains("foo"));
    }

    #[test]
    fn test_semantic_binding_derives_simple_name_and_member_key() {
        let mut semantic = SemanticReferenceCollection::new();
        semantic.add_binding(&ElementBinding {
            element_id: "package:app/a.dart::Base::m".to_string(),
            enclosing: vec!["Base".to_string()],
            library_uri: "package:app/a.dart".to_string(),
        });
        assert!(semantic.is_element_used("package:app/a.dart::Base::m"));
        assert!(semantic.is_simple_name_used("m"));
        assert!(semantic.is_member_key_used("Base.m"));
        assert!(!semantic.is_member_key_used("Impl.m"));
    }
}
