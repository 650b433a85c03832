// Rules that keep a declaration out of the report regardless of usage

use crate::config::{glob_match, Config};
use crate::graph::{Declaration, DeclarationKind};
use std::collections::HashSet;
use std::path::Path;

/// Annotations whose targets are never reported, compared with the first
/// letter lowercased
const ALWAYS_EXCLUDED_ANNOTATIONS: &[&str] = &[
    "visibleForTesting",
    "visibleForOverriding",
    "protected",
    "mustCallSuper",
    "pragma",
    "jsonSerializable",
    "jsonKey",
    "jsonValue",
    "jsonEnum",
    "freezed",
    "unfreezed",
    "injectable",
    "singleton",
    "lazySingleton",
    "module",
    "riverpod",
];

/// Framework callbacks invoked by name from outside the program
const LIFECYCLE_METHODS: &[&str] = &[
    // Flutter widgets
    "initState",
    "dispose",
    "build",
    "didChangeDependencies",
    "didUpdateWidget",
    "deactivate",
    "activate",
    "reassemble",
    "createState",
    // BLoC
    "onChange",
    "onTransition",
    "onError",
    "onEvent",
    "close",
    "mapEventToState",
    // GetX
    "onInit",
    "onReady",
    "onClose",
    // Object
    "toString",
    "hashCode",
    "==",
    "operator==",
    "noSuchMethod",
];

/// Why a declaration is excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    EntryPoint,
    NamePattern(String),
    Annotation(String),
    Public,
    Private,
    Static,
    Override,
    Lifecycle,
    TestName,
    Operator,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::EntryPoint => write!(f, "entry point"),
            ExclusionReason::NamePattern(p) => write!(f, "matches pattern '{}'", p),
            ExclusionReason::Annotation(a) => write!(f, "annotated with @{}", a),
            ExclusionReason::Public => write!(f, "public declarations excluded"),
            ExclusionReason::Private => write!(f, "private declarations excluded"),
            ExclusionReason::Static => write!(f, "static members excluded"),
            ExclusionReason::Override => write!(f, "overrides excluded"),
            ExclusionReason::Lifecycle => write!(f, "framework lifecycle method"),
            ExclusionReason::TestName => write!(f, "test helper name"),
            ExclusionReason::Operator => write!(f, "operator"),
        }
    }
}

/// Static exclusion sets merged with user configuration once per scan
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    entry_points: HashSet<String>,
    patterns: Vec<String>,
    annotations: HashSet<String>,
    lifecycle: HashSet<&'static str>,
    exclude_public: bool,
    exclude_private: bool,
    exclude_static: bool,
    exclude_overrides: bool,
}

impl ExclusionPolicy {
    pub fn from_config(config: &Config) -> Self {
        let mut entry_points: HashSet<String> = config.entry_points.iter().cloned().collect();
        entry_points.insert("main".to_string());

        let annotations = ALWAYS_EXCLUDED_ANNOTATIONS
            .iter()
            .map(|a| normalize_annotation(a))
            .chain(
                config
                    .exclude_annotations
                    .iter()
                    .map(|a| normalize_annotation(a.trim_start_matches('@'))),
            )
            .collect();

        Self {
            entry_points,
            patterns: config.exclude_patterns.clone(),
            annotations,
            lifecycle: LIFECYCLE_METHODS.iter().copied().collect(),
            exclude_public: config.exclude_public,
            exclude_private: config.exclude_private,
            exclude_static: config.exclude_static,
            exclude_overrides: config.exclude_overrides,
        }
    }

    pub fn is_entry_point(&self, name: &str) -> bool {
        self.entry_points.contains(name)
    }

    pub fn is_excluded(&self, decl: &Declaration) -> bool {
        self.exclusion(decl).is_some()
    }

    /// First rule that excludes `decl`, checked in priority order
    pub fn exclusion(&self, decl: &Declaration) -> Option<ExclusionReason> {
        if decl.is_top_level() && self.is_entry_point(&decl.name) {
            return Some(ExclusionReason::EntryPoint);
        }

        let qualified = decl.qualified_name();
        if let Some(pattern) = self
            .patterns
            .iter()
            .find(|p| glob_match(p, &decl.name) || glob_match(p, &qualified))
        {
            return Some(ExclusionReason::NamePattern(pattern.clone()));
        }

        if let Some(annotation) = decl
            .annotations
            .iter()
            .find(|a| self.annotations.contains(&normalize_annotation(a)))
        {
            return Some(ExclusionReason::Annotation(annotation.clone()));
        }

        if decl.kind == DeclarationKind::Parameter {
            return None;
        }

        if decl.is_private() && self.exclude_private {
            return Some(ExclusionReason::Private);
        }
        if !decl.is_private() && self.exclude_public {
            return Some(ExclusionReason::Public);
        }
        if decl.is_static && self.exclude_static {
            return Some(ExclusionReason::Static);
        }
        if self.exclude_overrides && (decl.is_override || decl.has_annotation("override")) {
            return Some(ExclusionReason::Override);
        }

        let is_member = decl.parent.is_some();
        if is_member && self.lifecycle.contains(decl.name.as_str()) {
            return Some(ExclusionReason::Lifecycle);
        }

        if is_test_name(&decl.name) {
            return Some(ExclusionReason::TestName);
        }

        if is_member && decl.is_operator() {
            return Some(ExclusionReason::Operator);
        }

        None
    }
}

fn normalize_annotation(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Mock/fake/stub/test helpers, or `...ForTesting`
fn is_test_name(name: &str) -> bool {
    if name.ends_with("ForTesting") {
        return true;
    }
    let bare = name.trim_start_matches('_');
    let lower = bare.to_ascii_lowercase();
    if ["mock", "fake", "stub", "test"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        return true;
    }
    ["Mock", "Fake", "Stub"].iter().any(|word| bare.contains(word))
}

/// `*_test.dart`, or anything under a `test/` directory
pub fn is_test_file(path: &Path) -> bool {
    let is_test_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with("_test.dart"))
        .unwrap_or(false);
    is_test_name
        || path
            .components()
            .any(|c| c.as_os_str() == "test" || c.as_os_str() == "integration_test")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Location;
    use std::path::PathBuf;

    fn decl(name: &str, kind: DeclarationKind, parent: Option<&str>) -> Declaration {
        let mut decl = Declaration::new(
            name.to_string(),
            kind,
            Location::new(PathBuf::from("lib/a.dart"), 1, 1, 0, 1),
            "app".to_string(),
        );
        decl.parent = parent.map(str::to_string);
        decl
    }

    #[test]
    fn test_main_is_always_excluded() {
        let policy = ExclusionPolicy::from_config(&Config::default());
        assert_eq!(
            policy.exclusion(&decl("main", DeclarationKind::Function, None)),
            Some(ExclusionReason::EntryPoint)
        );
        assert!(policy
            .exclusion(&decl("main", DeclarationKind::Method, Some("App")))
            .is_none());
    }

    #[test]
    fn test_annotation_case_insensitive_first_letter() {
        let mut config = Config::default();
        config.exclude_annotations = vec!["@keepMe".to_string()];
        let policy = ExclusionPolicy::from_config(&config);

        let mut json = decl("User", DeclarationKind::Class, None);
        json.annotations = vec!["JsonSerializable".to_string()];
        assert_eq!(
            policy.exclusion(&json),
            Some(ExclusionReason::Annotation("JsonSerializable".to_string()))
        );

        let mut kept = decl("legacy", DeclarationKind::Function, None);
        kept.annotations = vec!["KeepMe".to_string()];
        assert!(policy.is_excluded(&kept));
    }

    #[test]
    fn test_pattern_precedes_annotation() {
        let mut config = Config::default();
        config.exclude_patterns = vec!["*Dto".to_string()];
        let policy = ExclusionPolicy::from_config(&config);
        let mut dto = decl("UserDto", DeclarationKind::Class, None);
        dto.annotations = vec!["freezed".to_string()];
        assert_eq!(
            policy.exclusion(&dto),
            Some(ExclusionReason::NamePattern("*Dto".to_string()))
        );
    }

    #[test]
    fn test_visibility_and_override_switches() {
        let mut config = Config::default();
        config.exclude_public = true;
        let policy = ExclusionPolicy::from_config(&config);
        assert_eq!(
            policy.exclusion(&decl("helper", DeclarationKind::Function, None)),
            Some(ExclusionReason::Public)
        );
        assert!(policy
            .exclusion(&decl("_helper", DeclarationKind::Function, None))
            .is_none());

        let policy = ExclusionPolicy::from_config(&Config::default());
        let mut overriding = decl("run", DeclarationKind::Method, Some("Impl"));
        overriding.is_override = true;
        assert_eq!(policy.exclusion(&overriding), Some(ExclusionReason::Override));
    }

    #[test]
    fn test_lifecycle_operator_and_test_names() {
        let policy = ExclusionPolicy::from_config(&Config::default());
        assert_eq!(
            policy.exclusion(&decl("initState", DeclarationKind::Method, Some("_S"))),
            Some(ExclusionReason::Lifecycle)
        );
        assert_eq!(
            policy.exclusion(&decl("operator+", DeclarationKind::Method, Some("Vec2"))),
            Some(ExclusionReason::Operator)
        );
        assert_eq!(
            policy.exclusion(&decl("MockRepository", DeclarationKind::Class, None)),
            Some(ExclusionReason::TestName)
        );
        assert_eq!(
            policy.exclusion(&decl("resetForTesting", DeclarationKind::Function, None)),
            Some(ExclusionReason::TestName)
        );
        assert!(policy
            .exclusion(&decl("latestValue", DeclarationKind::Function, None))
            .is_none());
    }

    #[test]
    fn test_test_file_detection() {
        assert!(is_test_file(Path::new("test/widget_test.dart")));
        assert!(is_test_file(Path::new("pkg/test/helpers.dart")));
        assert!(is_test_file(Path::new("lib/src/a_test.dart")));
        assert!(!is_test_file(Path::new("lib/src/testing.dart")));
    }
}
