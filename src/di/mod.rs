//! Dependency-injection pattern recognizer
//!
//! Types that are only ever obtained through a service locator, registered by
//! annotation, or constructed through a state-management provider have no
//! ordinary reference. This module finds those shapes in the invocations and
//! annotations a [`ParsedUnit`] carries.

use crate::graph::{DeclarationKind, Location};
use crate::parser::{Invocation, ParsedUnit};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Recognized DI frameworks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiFramework {
    GetIt,
    Injectable,
    Riverpod,
    Provider,
    Bloc,
}

impl DiFramework {
    pub const ALL: [DiFramework; 5] = [
        DiFramework::GetIt,
        DiFramework::Injectable,
        DiFramework::Riverpod,
        DiFramework::Provider,
        DiFramework::Bloc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiFramework::GetIt => "get_it",
            DiFramework::Injectable => "injectable",
            DiFramework::Riverpod => "riverpod",
            DiFramework::Provider => "provider",
            DiFramework::Bloc => "bloc",
        }
    }
}

impl std::fmt::Display for DiFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    Singleton,
    LazySingleton,
    Factory,
    Provider,
}

/// A type made available through a DI container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiRegistration {
    pub type_name: String,
    pub framework: DiFramework,
    pub kind: RegistrationKind,
    pub location: Location,
}

/// A type obtained from a DI container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiRetrieval {
    pub type_name: String,
    pub framework: DiFramework,
    pub location: Location,
}

/// Registrations and retrievals found in a set of files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiUsage {
    pub registered: Vec<DiRegistration>,
    pub retrieved: Vec<DiRetrieval>,
}

impl DiUsage {
    /// Every type named by a registration or retrieval
    pub fn types(&self) -> HashSet<String> {
        self.registered
            .iter()
            .map(|r| r.type_name.clone())
            .chain(self.retrieved.iter().map(|r| r.type_name.clone()))
            .collect()
    }

    pub fn merge(&mut self, other: DiUsage) {
        self.registered.extend(other.registered);
        self.retrieved.extend(other.retrieved);
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.retrieved.is_empty()
    }
}

const LOCATORS: &[&str] = &["locator", "sl", "getIt"];

const REGISTRATIONS: &[(&str, RegistrationKind)] = &[
    ("registerSingleton", RegistrationKind::Singleton),
    ("registerLazySingleton", RegistrationKind::LazySingleton),
    ("registerFactory", RegistrationKind::Factory),
    ("registerFactoryAsync", RegistrationKind::Factory),
];

const PROVIDER_TYPES: &[(&str, DiFramework)] = &[
    ("Provider", DiFramework::Provider),
    ("ChangeNotifierProvider", DiFramework::Provider),
    ("FutureProvider", DiFramework::Provider),
    ("StreamProvider", DiFramework::Provider),
    ("StateProvider", DiFramework::Riverpod),
    ("StateNotifierProvider", DiFramework::Riverpod),
    ("NotifierProvider", DiFramework::Riverpod),
    ("AsyncNotifierProvider", DiFramework::Riverpod),
    ("BlocProvider", DiFramework::Bloc),
    ("RepositoryProvider", DiFramework::Bloc),
    ("MultiBlocProvider", DiFramework::Bloc),
];

const INJECTABLE_ANNOTATIONS: &[(&str, RegistrationKind)] = &[
    ("injectable", RegistrationKind::Factory),
    ("singleton", RegistrationKind::Singleton),
    ("lazySingleton", RegistrationKind::LazySingleton),
    ("module", RegistrationKind::Factory),
];

/// `name` or the same word with its first letter capitalized
fn annotation_matches(annotation: &str, name: &str) -> bool {
    if annotation == name {
        return true;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let capitalized: String = first.to_uppercase().chain(chars).collect();
            annotation == capitalized
        }
        None => false,
    }
}

/// Finds DI registrations and retrievals
#[derive(Debug, Clone)]
pub struct DiRecognizer {
    frameworks: HashSet<DiFramework>,
}

impl Default for DiRecognizer {
    fn default() -> Self {
        Self::new(&DiFramework::ALL)
    }
}

impl DiRecognizer {
    pub fn new(frameworks: &[DiFramework]) -> Self {
        Self {
            frameworks: frameworks.iter().copied().collect(),
        }
    }

    fn enabled(&self, framework: DiFramework) -> bool {
        self.frameworks.contains(&framework)
    }

    /// Recognize DI usage across all units in parallel
    pub fn recognize_all(&self, units: &[ParsedUnit]) -> DiUsage {
        let usage = units
            .par_iter()
            .map(|unit| self.recognize(unit))
            .reduce(DiUsage::default, |mut acc, usage| {
                acc.merge(usage);
                acc
            });
        debug!(
            "DI: {} registrations, {} retrievals",
            usage.registered.len(),
            usage.retrieved.len()
        );
        usage
    }

    pub fn recognize(&self, unit: &ParsedUnit) -> DiUsage {
        let mut usage = DiUsage::default();
        for invocation in &unit.invocations {
            self.invocation(invocation, &mut usage);
        }
        self.annotations(unit, &mut usage);
        usage
    }

    fn invocation(&self, inv: &Invocation, usage: &mut DiUsage) {
        let target = inv.target.as_deref();
        let name = inv.name.as_str();

        // Service locator registration
        if let Some((_, kind)) = REGISTRATIONS.iter().find(|(n, _)| *n == name) {
            if self.enabled(DiFramework::GetIt) {
                for type_name in inv.type_args.iter().take(1) {
                    usage.registered.push(DiRegistration {
                        type_name: type_name.clone(),
                        framework: DiFramework::GetIt,
                        kind: *kind,
                        location: inv.location.clone(),
                    });
                }
            }
            return;
        }

        // Service locator retrieval
        let is_locator_target = |t: &str| {
            LOCATORS.contains(&t) || t == "GetIt.I" || t == "GetIt.instance"
        };
        let locator_call = match target {
            Some("GetIt") => name == "I" || name == "instance",
            None => LOCATORS.contains(&name),
            Some(t) => (name == "get" || name == "call") && is_locator_target(t),
        };
        if locator_call {
            if self.enabled(DiFramework::GetIt) {
                self.retrieve(inv, DiFramework::GetIt, usage);
            }
            return;
        }

        // Contextual retrieval
        let contextual = match (target, name) {
            (Some("context"), "read" | "watch" | "select") => Some(DiFramework::Provider),
            (Some("ref"), "read" | "watch" | "listen") => Some(DiFramework::Riverpod),
            _ => None,
        };
        if let Some(framework) = contextual {
            if self.enabled(framework) {
                self.retrieve(inv, framework, usage);
            }
            return;
        }

        // Provider construction; a target here can only be an import prefix
        let constructed = target.map(|t| !t.contains('.')).unwrap_or(true);
        if let Some((_, framework)) = PROVIDER_TYPES
            .iter()
            .find(|(n, _)| *n == name)
            .filter(|_| constructed)
        {
            if self.enabled(*framework) {
                for type_name in &inv.type_args {
                    usage.registered.push(DiRegistration {
                        type_name: type_name.clone(),
                        framework: *framework,
                        kind: RegistrationKind::Provider,
                        location: inv.location.clone(),
                    });
                }
            }
        }
    }

    fn retrieve(&self, inv: &Invocation, framework: DiFramework, usage: &mut DiUsage) {
        for type_name in inv.type_args.iter().take(1) {
            usage.retrieved.push(DiRetrieval {
                type_name: type_name.clone(),
                framework,
                location: inv.location.clone(),
            });
        }
    }

    fn annotations(&self, unit: &ParsedUnit, usage: &mut DiUsage) {
        for decl in &unit.declarations {
            let is_type = decl.kind.is_type() && decl.parent.is_none();
            let is_function = decl.kind == DeclarationKind::Function && decl.parent.is_none();
            if !is_type && !is_function {
                continue;
            }
            for annotation in &decl.annotations {
                if is_type && self.enabled(DiFramework::Injectable) {
                    if let Some((_, kind)) = INJECTABLE_ANNOTATIONS
                        .iter()
                        .find(|(n, _)| annotation_matches(annotation, n))
                    {
                        usage.registered.push(DiRegistration {
                            type_name: decl.name.clone(),
                            framework: DiFramework::Injectable,
                            kind: *kind,
                            location: decl.location.clone(),
                        });
                    }
                }
                if annotation_matches(annotation, "riverpod") && self.enabled(DiFramework::Riverpod)
                {
                    usage.registered.push(DiRegistration {
                        type_name: decl.name.clone(),
                        framework: DiFramework::Riverpod,
                        kind: RegistrationKind::Provider,
                        location: decl.location.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DartParser, DeclarationSource, ParseContext};
    use std::path::Path;

    fn recognize(source: &str) -> DiUsage {
        let unit = DartParser::new()
            .parse(
                Path::new("lib/di.dart"),
                source,
                &ParseContext::new("app", "package:app/di.dart"),
            )
            .unwrap();
        DiRecognizer::default().recognize(&unit)
    }

    #[test]
    fn test_get_it_registration_and_retrieval() {
        let usage = recognize(
            r#"
void setup() {
  GetIt.I.registerLazySingleton<ApiClient>(() => ApiClient());
  getIt.registerFactory<Mapper>(() => Mapper());
  final a = GetIt.I<AuthService>();
  final b = GetIt.instance<Session>();
  final c = sl<Cache>();
  final d = locator.get<Clock>();
}
"#,
        );
        let types = usage.types();
        for expected in ["ApiClient", "Mapper", "AuthService", "Session", "Cache", "Clock"] {
            assert!(types.contains(expected), "missing {}", expected);
        }
        assert_eq!(usage.registered[0].kind, RegistrationKind::LazySingleton);
        assert!(usage
            .retrieved
            .iter()
            .all(|r| r.framework == DiFramework::GetIt));
    }

    #[test]
    fn test_annotation_registration() {
        let usage = recognize(
            "@lazySingleton\nclass Repo {}\n@Injectable()\nclass Bloc1 {}\n@riverpod\nString greeting(GreetingRef ref) => 'hi';\n",
        );
        let types = usage.types();
        assert!(types.contains("Repo"));
        assert!(types.contains("Bloc1"));
        assert!(types.contains("greeting"));
    }

    #[test]
    fn test_provider_construction_and_context() {
        let usage = recognize(
            r#"
Widget build(BuildContext context) {
  return MultiBlocProvider(providers: [
    BlocProvider<CounterBloc>(create: (_) => CounterBloc()),
    ChangeNotifierProvider<CartModel>.value(value: cart),
  ], child: Text(context.watch<Theme>().name));
}
final counter = StateNotifierProvider<Counter, int>((ref) => Counter());
void read(WidgetRef ref) { ref.read<Settings>(); }
"#,
        );
        let types = usage.types();
        for expected in ["CounterBloc", "CartModel", "Theme", "Counter", "int", "Settings"] {
            assert!(types.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_framework_allowlist() {
        let unit = DartParser::new()
            .parse(
                Path::new("lib/di.dart"),
                "void f() { sl<Cache>(); context.read<Theme>(); }",
                &ParseContext::new("app", "package:app/di.dart"),
            )
            .unwrap();
        let usage = DiRecognizer::new(&[DiFramework::Provider]).recognize(&unit);
        let types = usage.types();
        assert!(!types.contains("Cache"));
        assert!(types.contains("Theme"));
    }

    #[test]
    fn test_annotation_matches_capitalized() {
        assert!(annotation_matches("Singleton", "singleton"));
        assert!(annotation_matches("lazySingleton", "lazySingleton"));
        assert!(annotation_matches("LazySingleton", "lazySingleton"));
        assert!(!annotation_matches("singletons", "singleton"));
    }
}
