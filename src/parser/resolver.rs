//! Scope-based element resolution
//!
//! Binds each usage of a [`ParsedUnit`] to the element it denotes using the
//! library's own declarations, its parts, and its imports (following exports).
//! Names that cannot be bound stay unresolved; they are never guessed.

use super::common::{
    Directive, DirectiveKind, ElementBinding, ElementResolver, LibraryInfo, LibraryLookup,
    ParsedUnit, ProviderError, ResolvedUnit, Usage,
};
use crate::graph::{Declaration, DeclarationKind, ImportUsage, ELEMENT_SEPARATOR};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Every scanned library, keyed by URI
#[derive(Debug, Default)]
pub struct LibraryIndex {
    libraries: HashMap<String, LibraryInfo>,
    file_uris: HashMap<PathBuf, String>,
}

impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Register one file's top-level surface
    pub fn add_library(
        &mut self,
        file: &Path,
        uri: &str,
        declarations: &[Declaration],
        directives: &[Directive],
    ) {
        let mut info = LibraryInfo {
            uri: uri.to_string(),
            file: file.to_path_buf(),
            ..Default::default()
        };

        for decl in declarations {
            match (&decl.parent, decl.kind) {
                (_, DeclarationKind::Parameter) => {}
                (None, kind) if !kind.is_directive() => {
                    info.top_level.insert(decl.name.clone(), kind);
                    if kind.is_type() {
                        info.supertypes
                            .insert(decl.name.clone(), decl.super_types().cloned().collect());
                    }
                }
                (Some(parent), kind) if kind.is_member() => {
                    info.members
                        .entry(parent.clone())
                        .or_default()
                        .insert(decl.name.clone());
                }
                _ => {}
            }
        }

        for decl in declarations.iter().filter(|d| d.kind == DeclarationKind::Extension) {
            let members = info.members.get(&decl.name).cloned().unwrap_or_default();
            info.extensions.push((decl.name.clone(), members));
        }

        for directive in directives {
            match directive.kind {
                DirectiveKind::Export => info.exports.push(directive.clone()),
                DirectiveKind::Part => {
                    if let Some(part) = resolve_relative(uri, &directive.uri) {
                        info.parts.push(part);
                    }
                }
                DirectiveKind::PartOf if !directive.uri.is_empty() => {
                    info.part_of = resolve_relative(uri, &directive.uri);
                }
                _ => {}
            }
        }

        self.file_uris.insert(file.to_path_buf(), uri.to_string());
        self.libraries.insert(uri.to_string(), info);
    }
}

impl LibraryLookup for LibraryIndex {
    fn library(&self, uri: &str) -> Option<&LibraryInfo> {
        self.libraries.get(uri)
    }

    fn resolve_uri(&self, from_file: &Path, uri: &str) -> Option<String> {
        if uri.contains(':') {
            return Some(uri.to_string());
        }
        let base = self.file_uris.get(from_file)?;
        resolve_relative(base, uri)
    }
}

/// Resolve `relative` against the library URI `base`, lexically
pub fn resolve_relative(base: &str, relative: &str) -> Option<String> {
    if relative.contains(':') {
        return Some(relative.to_string());
    }
    let (scheme, path) = if let Some(rest) = base.strip_prefix("package:") {
        ("package:", rest)
    } else if let Some(rest) = base.strip_prefix("file://") {
        ("file://", rest)
    } else {
        return None;
    };

    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    Some(format!("{}{}", scheme, segments.join("/")))
}

/// Default [`ElementResolver`]
#[derive(Debug, Default)]
pub struct ScopeResolver;

impl ScopeResolver {
    pub fn new() -> Self {
        Self
    }
}

/// An import of the file being resolved
struct ImportScope<'i> {
    directive: &'i Directive,
    library: Option<&'i LibraryInfo>,
    usage: ImportUsage,
}

impl ImportScope<'_> {
    fn is_external(&self) -> bool {
        self.library.is_none()
    }
}

/// Lookup state for a single unit
struct Scope<'i> {
    index: &'i dyn LibraryLookup,
    /// The library itself, its parts, and for a part file its owner
    own: Vec<&'i LibraryInfo>,
    imports: Vec<ImportScope<'i>>,
    prefixes: BTreeSet<&'i str>,
}

impl<'i> Scope<'i> {
    fn build(unit: &'i ParsedUnit, index: &'i dyn LibraryLookup) -> Result<Self, ProviderError> {
        let library = index.library(&unit.library_uri).ok_or_else(|| {
            ProviderError::Unavailable(format!("library {} is not indexed", unit.library_uri))
        })?;

        let mut own = vec![library];
        if let Some(owner) = library.part_of.as_deref().and_then(|uri| index.library(uri)) {
            own.push(owner);
        }
        let roots = own.clone();
        for root in roots {
            for lib in root.parts.iter().filter_map(|part| index.library(part)) {
                if !own.iter().any(|l| l.uri == lib.uri) {
                    own.push(lib);
                }
            }
        }

        let imports = unit
            .imports()
            .map(|directive| {
                let resolved = index
                    .resolve_uri(&unit.path, &directive.uri)
                    .unwrap_or_else(|| directive.uri.clone());
                ImportScope {
                    directive,
                    library: index.library(&resolved),
                    usage: ImportUsage {
                        file: unit.path.clone(),
                        uri: directive.uri.clone(),
                        prefix: directive.prefix.clone(),
                        shown: directive.shown.clone(),
                        hidden: directive.hidden.clone(),
                        used: BTreeSet::new(),
                        implicitly_used: false,
                        location: directive.location.clone(),
                    },
                }
            })
            .collect();

        Ok(Self {
            index,
            own,
            imports,
            prefixes: unit.import_prefixes(),
        })
    }

    /// Library declaring top-level `name` as visible without a prefix
    fn unprefixed_library(&self, name: &str) -> Option<&'i LibraryInfo> {
        if let Some(lib) = self.own.iter().find(|l| l.top_level.contains_key(name)) {
            return Some(*lib);
        }
        self.imports
            .iter()
            .filter(|imp| imp.directive.prefix.is_none() && imp.directive.exposes(name))
            .filter_map(|imp| imp.library)
            .find_map(|lib| exported_by(self.index, lib, name, &mut HashSet::new()))
    }

    /// Member `member` of `type_name` or one of its supertypes
    fn find_member(
        &self,
        type_name: &str,
        member: &str,
        visited: &mut HashSet<String>,
    ) -> Option<(String, &'i LibraryInfo)> {
        if !visited.insert(type_name.to_string()) {
            return None;
        }
        let lib = self.unprefixed_library(type_name)?;
        if lib
            .members
            .get(type_name)
            .map(|m| m.contains(member))
            .unwrap_or(false)
        {
            return Some((type_name.to_string(), lib));
        }
        lib.supertypes
            .get(type_name)
            .into_iter()
            .flatten()
            .find_map(|parent| self.find_member(parent, member, visited))
    }
}

/// Library exporting top-level `name`, starting from `lib` and following exports
fn exported_by<'i>(
    index: &'i dyn LibraryLookup,
    lib: &'i LibraryInfo,
    name: &str,
    visited: &mut HashSet<String>,
) -> Option<&'i LibraryInfo> {
    if !visited.insert(lib.uri.clone()) {
        return None;
    }
    if lib.top_level.contains_key(name) {
        return Some(lib);
    }
    if let Some(part) = lib
        .parts
        .iter()
        .filter_map(|part| index.library(part))
        .find(|part| part.top_level.contains_key(name))
    {
        return Some(part);
    }
    for export in lib.exports.iter().filter(|e| e.exposes(name)) {
        let target = index
            .resolve_uri(&lib.file, &export.uri)
            .and_then(|uri| index.library(&uri));
        if let Some(found) = target.and_then(|t| exported_by(index, t, name, visited)) {
            return Some(found);
        }
    }
    None
}

/// `lib`, its parts, and every library it re-exports
fn reachable_libraries<'i>(
    index: &'i dyn LibraryLookup,
    lib: &'i LibraryInfo,
    visited: &mut HashSet<String>,
    out: &mut Vec<&'i LibraryInfo>,
) {
    if !visited.insert(lib.uri.clone()) {
        return;
    }
    out.push(lib);
    out.extend(lib.parts.iter().filter_map(|part| index.library(part)));
    for export in &lib.exports {
        let target = index
            .resolve_uri(&lib.file, &export.uri)
            .and_then(|uri| index.library(&uri));
        if let Some(target) = target {
            reachable_libraries(index, target, visited, out);
        }
    }
}

fn top_level_binding(lib: &LibraryInfo, name: &str) -> ElementBinding {
    ElementBinding {
        element_id: format!("{}{}{}", lib.uri, ELEMENT_SEPARATOR, name),
        enclosing: Vec::new(),
        library_uri: lib.uri.clone(),
    }
}

fn member_binding(lib: &LibraryInfo, owner: &str, name: &str) -> ElementBinding {
    ElementBinding {
        element_id: format!(
            "{}{sep}{}{sep}{}",
            lib.uri,
            owner,
            name,
            sep = ELEMENT_SEPARATOR
        ),
        enclosing: vec![owner.to_string()],
        library_uri: lib.uri.clone(),
    }
}

fn is_operator_name(name: &str) -> bool {
    name == "unary-" || (name.starts_with("operator") && name.len() > "operator".len())
}

impl ElementResolver for ScopeResolver {
    fn resolve(
        &self,
        unit: &ParsedUnit,
        index: &dyn LibraryLookup,
    ) -> Result<ResolvedUnit, ProviderError> {
        let mut scope = Scope::build(unit, index)?;
        let mut resolved = ResolvedUnit {
            library_uri: unit.library_uri.clone(),
            ..Default::default()
        };
        let mut unresolved: BTreeSet<&str> = BTreeSet::new();

        for usage in &unit.usages {
            match resolve_usage(&mut scope, usage, &mut resolved) {
                Some(binding) => resolved.bindings.push(binding),
                None => {
                    if !scope.prefixes.contains(usage.name.as_str()) && usage.qualifier.is_none() {
                        unresolved.insert(usage.name.as_str());
                    }
                }
            }
        }

        // Imports of libraries outside the scan cannot be attributed by name
        for imp in scope.imports.iter_mut().filter(|imp| imp.is_external()) {
            if imp.directive.prefix.is_some() {
                continue;
            }
            if imp.directive.shown.is_empty() {
                imp.usage.implicitly_used |= !unresolved.is_empty();
            } else {
                for name in &imp.directive.shown {
                    if unresolved.contains(name.as_str()) {
                        imp.usage.used.insert(name.clone());
                    }
                }
            }
        }

        resolved.import_usage = scope.imports.into_iter().map(|imp| imp.usage).collect();
        Ok(resolved)
    }
}

fn resolve_usage(
    scope: &mut Scope<'_>,
    usage: &Usage,
    resolved: &mut ResolvedUnit,
) -> Option<ElementBinding> {
    let name = usage.name.as_str();

    let index = scope.index;

    // prefix.name
    if let Some(prefix) = usage
        .qualifier
        .as_deref()
        .filter(|q| scope.prefixes.contains(q))
    {
        let mut binding = None;
        for imp in scope
            .imports
            .iter_mut()
            .filter(|imp| imp.directive.prefix.as_deref() == Some(prefix))
        {
            if !imp.directive.exposes(name) {
                continue;
            }
            match imp.library {
                None => {
                    imp.usage.implicitly_used = true;
                    return None;
                }
                Some(lib) => {
                    if let Some(found) = exported_by(index, lib, name, &mut HashSet::new()) {
                        imp.usage.used.insert(name.to_string());
                        binding = Some(top_level_binding(found, name));
                        break;
                    }
                }
            }
        }
        if binding.is_none() {
            // Unattributable access through the prefix keeps its imports alive
            for imp in scope
                .imports
                .iter_mut()
                .filter(|imp| imp.directive.prefix.as_deref() == Some(prefix))
            {
                imp.usage.implicitly_used = true;
            }
        }
        return binding;
    }

    if usage.qualifier.is_none() && scope.prefixes.contains(name) {
        return None;
    }

    let member_access = usage.is_member || is_operator_name(name);
    if member_access {
        mark_extensions(scope, name, resolved);

        let receiver = usage.qualifier.as_deref();
        let static_type = match receiver {
            Some("this") | Some("super") => usage.enclosing.as_deref(),
            Some(q) if q.starts_with(char::is_uppercase) => Some(q),
            _ => None,
        };
        if let Some(type_name) = static_type {
            if let Some((owner, lib)) = scope.find_member(type_name, name, &mut HashSet::new()) {
                return Some(member_binding(lib, &owner, name));
            }
        }
        // Unknown receiver type: a same-named member of the current library
        return scope.own.iter().find_map(|lib| {
            lib.members
                .iter()
                .find(|(_, members)| members.contains(name))
                .map(|(owner, _)| member_binding(lib, owner, name))
        });
    }

    // Members of the enclosing type and its supertypes
    if let Some(enclosing) = usage.enclosing.as_deref() {
        if let Some((owner, lib)) = scope.find_member(enclosing, name, &mut HashSet::new()) {
            return Some(member_binding(lib, &owner, name));
        }
    }

    if let Some(lib) = scope.own.iter().find(|l| l.top_level.contains_key(name)) {
        return Some(top_level_binding(lib, name));
    }

    let mut binding = None;
    for imp in scope
        .imports
        .iter_mut()
        .filter(|imp| imp.directive.prefix.is_none() && imp.directive.exposes(name))
    {
        let Some(lib) = imp.library else {
            continue;
        };
        if let Some(found) = exported_by(index, lib, name, &mut HashSet::new()) {
            imp.usage.used.insert(name.to_string());
            if binding.is_none() {
                binding = Some(top_level_binding(found, name));
            }
        }
    }
    binding
}

/// Extensions declaring `member` are used; so are the imports providing them
fn mark_extensions(scope: &mut Scope<'_>, member: &str, resolved: &mut ResolvedUnit) {
    for lib in &scope.own {
        for (ext, members) in &lib.extensions {
            if members.contains(member) {
                resolved.used_extensions.insert(ext.clone());
            }
        }
    }

    let index = scope.index;
    for imp in scope.imports.iter_mut() {
        let Some(lib) = imp.library else {
            continue;
        };
        let mut sources = Vec::new();
        reachable_libraries(index, lib, &mut HashSet::new(), &mut sources);
        for source in sources {
            for (ext, members) in &source.extensions {
                if members.contains(member) && imp.directive.exposes(ext) {
                    resolved.used_extensions.insert(ext.clone());
                    imp.usage.used.insert(ext.clone());
                }
            }
        }
    }
}
