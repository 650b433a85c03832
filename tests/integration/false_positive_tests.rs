//! False-positive guards
//!
//! Code that is used only through indirect mechanisms must never be reported:
//! 1. Dependency injection (get_it, injectable, riverpod, provider, bloc)
//! 2. Interface dispatch and overrides
//! 3. Operators and extensions
//! 4. Framework lifecycle callbacks
//! 5. Code generation annotations
//! 6. Test doubles and configured entry points

use dartdeadcode::{Config, Issue, Scanner};
use std::path::PathBuf;

fn scan_with(config: &Config, files: &[(&str, &str)]) -> Vec<String> {
    let sources: Vec<(PathBuf, String, String)> = files
        .iter()
        .map(|(path, contents)| (PathBuf::from(path), "app".to_string(), contents.to_string()))
        .collect();
    Scanner::new(config)
        .scan_sources(&sources)
        .issues
        .iter()
        .map(Issue::qualified_symbol)
        .collect()
}

fn scan(files: &[(&str, &str)]) -> Vec<String> {
    scan_with(&Config::default(), files)
}

mod dependency_injection {
    use super::*;

    #[test]
    fn test_get_it_registered_type_not_dead() {
        let found = scan(&[
            ("lib/auth.dart", "class AuthService {}\n"),
            (
                "lib/main.dart",
                "import 'auth.dart';\n\nvoid main() {\n  GetIt.I.registerLazySingleton<AuthService>(() => create());\n}\n\ndynamic create() => null;\n",
            ),
        ]);
        assert!(!found.contains(&"AuthService".to_string()), "{:?}", found);
    }

    #[test]
    fn test_injectable_annotation_not_dead() {
        let found = scan(&[
            ("lib/repo.dart", "@lazySingleton\nclass UserRepository {}\n"),
            ("lib/main.dart", "void main() {}\n"),
        ]);
        assert!(!found.contains(&"UserRepository".to_string()), "{:?}", found);
    }

    #[test]
    fn test_bloc_provider_type_not_dead() {
        let found = scan(&[
            ("lib/counter.dart", "class CounterBloc {}\n"),
            (
                "lib/main.dart",
                "import 'counter.dart';\n\nvoid main() {\n  runApp(BlocProvider<CounterBloc>(create: (_) => build()));\n}\n\ndynamic build() => null;\n",
            ),
        ]);
        assert!(!found.contains(&"CounterBloc".to_string()), "{:?}", found);
    }
}

mod dispatch {
    use super::*;

    #[test]
    fn test_interface_call_keeps_base_and_override() {
        let found = scan(&[(
            "lib/main.dart",
            "abstract class Base {\n  void m();\n}\n\nclass Impl extends Base {\n  @override\n  void m() {}\n}\n\nvoid main() {\n  Base x = Impl();\n  x.m();\n}\n",
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_override_used_keeps_base_with_overrides_reported() {
        let mut config = Config::default();
        config.exclude_overrides = false;
        let found = scan_with(
            &config,
            &[(
                "lib/main.dart",
                "class Platform {\n  void launch() => throw UnimplementedError();\n}\n\nclass IoPlatform extends Platform {\n  @override\n  void launch() {}\n}\n\nvoid main() {\n  IoPlatform().launch();\n}\n",
            )],
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_operator_used_only_via_syntax() {
        let found = scan(&[(
            "lib/main.dart",
            "class V {\n  final int x;\n  V(this.x);\n  V operator +(V o) => V(x + o.x);\n}\n\nvoid main() {\n  print(V(1) + V(2));\n}\n",
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_extension_method_call_keeps_extension() {
        let found = scan(&[
            (
                "lib/strings.dart",
                "extension Shout on String {\n  String shout() => toUpperCase();\n}\n",
            ),
            (
                "lib/main.dart",
                "import 'strings.dart';\n\nvoid main() {\n  print('hi'.shout());\n}\n",
            ),
        ]);
        assert!(found.is_empty(), "{:?}", found);
    }
}

mod framework_conventions {
    use super::*;

    #[test]
    fn test_flutter_lifecycle_methods_not_dead() {
        let found = scan(&[(
            "lib/main.dart",
            "class CounterPage extends StatefulWidget {\n  @override\n  State<CounterPage> createState() => _CounterState();\n}\n\nclass _CounterState extends State<CounterPage> {\n  @override\n  void initState() {\n    super.initState();\n  }\n\n  @override\n  void dispose() {\n    super.dispose();\n  }\n\n  @override\n  Widget build(BuildContext context) => Text('hi');\n}\n\nvoid main() {\n  runApp(CounterPage());\n}\n",
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_json_serializable_annotation_not_dead() {
        let found = scan(&[
            (
                "lib/dto.dart",
                "@JsonSerializable()\nclass UserDto {\n  final String id;\n  UserDto(this.id);\n}\n",
            ),
            ("lib/main.dart", "void main() {}\n"),
        ]);
        assert!(!found.contains(&"UserDto".to_string()), "{:?}", found);
    }

    #[test]
    fn test_field_formal_parameters_not_reported() {
        let found = scan(&[(
            "lib/main.dart",
            "class Point {\n  final int x;\n  final int y;\n  Point(this.x, this.y);\n}\n\nvoid main() {\n  final p = Point(1, 2);\n  print(p.x + p.y);\n}\n",
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_wildcard_parameters_not_reported() {
        let found = scan(&[(
            "lib/main.dart",
            "void onTap(int _, int __) {}\n\nvoid main() {\n  onTap(1, 2);\n}\n",
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_mock_classes_not_dead() {
        let found = scan(&[
            ("lib/fakes.dart", "class MockApi {}\nclass FakeClock {}\n"),
            ("lib/main.dart", "void main() {}\n"),
        ]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_configured_entry_points_not_dead() {
        let mut config = Config::default();
        config.entry_points = vec!["backgroundHandler".to_string()];
        let found = scan_with(
            &config,
            &[(
                "lib/main.dart",
                "void main() {}\n\nvoid backgroundHandler() {}\n",
            )],
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_custom_annotation_exclusion() {
        let mut config = Config::default();
        config.exclude_annotations = vec!["@keep".to_string()];
        let found = scan_with(
            &config,
            &[(
                "lib/main.dart",
                "void main() {}\n\n@keep\nvoid reflectiveHook() {}\n",
            )],
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_public_api_can_be_excluded() {
        let mut config = Config::default();
        config.exclude_public = true;
        let found = scan_with(
            &config,
            &[(
                "lib/api.dart",
                "class PublicWidget {}\nclass _PrivateWidget {}\n",
            )],
        );
        assert_eq!(found, vec!["_PrivateWidget"]);
    }
}
