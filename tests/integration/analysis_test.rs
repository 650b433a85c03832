//! Integration tests for the dartdeadcode analysis pipeline
//!
//! Each test lays out a small pub project on disk, discovers it and scans it.

use dartdeadcode::graph::ResolutionMode;
use dartdeadcode::{Config, FileFinder, Issue, IssueCategory, ScanResult, Scanner};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "pubspec.yaml", "name: app\n");
    for (rel, contents) in files {
        write(dir.path(), rel, contents);
    }
    dir
}

fn scan(config: &Config, root: &Path) -> ScanResult {
    let files = FileFinder::new(config)
        .find_files(root)
        .expect("Failed to discover files");
    Scanner::new(config).scan(&files)
}

fn symbols(issues: &[Issue]) -> Vec<String> {
    issues.iter().map(Issue::qualified_symbol).collect()
}

const MAIN: &str = "import 'src/models.dart';\n\nvoid main() {\n  final user = User('a');\n  print(user.name);\n}\n";

const MODELS: &str = "class User {\n  final String name;\n  User(this.name);\n}\n\nclass LegacyUser {}\n\nvoid _debugDump() {}\n";

#[test]
fn test_reports_unused_class_and_private_function() {
    let dir = project(&[("lib/main.dart", MAIN), ("lib/src/models.dart", MODELS)]);
    let result = scan(&Config::default(), dir.path());

    assert_eq!(result.stats.files, 2);
    assert_eq!(result.stats.failed, 0);
    assert_eq!(result.stats.mode, ResolutionMode::Semantic);
    assert_eq!(symbols(&result.issues), vec!["LegacyUser", "_debugDump"]);
    assert_eq!(result.issues[0].category, IssueCategory::UnusedClass);
    assert_eq!(result.issues[0].location.line, 6);
    assert_eq!(result.issues[1].category, IssueCategory::UnusedFunction);
    assert!(result.issues.iter().all(|i| i.fixable));
    assert!(result.issues.iter().all(|i| i.package == "app"));
}

#[test]
fn test_name_only_mode_finds_the_same_declarations() {
    let dir = project(&[("lib/main.dart", MAIN), ("lib/src/models.dart", MODELS)]);
    let mut config = Config::default();
    config.semantic = false;
    let result = scan(&config, dir.path());

    assert_eq!(result.stats.mode, ResolutionMode::NameOnly);
    assert!(result.semantic.is_none());
    assert_eq!(symbols(&result.issues), vec!["LegacyUser", "_debugDump"]);
}

#[test]
fn test_exclude_patterns_and_detection_flags() {
    let dir = project(&[("lib/main.dart", MAIN), ("lib/src/models.dart", MODELS)]);

    let mut config = Config::default();
    config.exclude_patterns = vec!["Legacy*".to_string()];
    assert_eq!(symbols(&scan(&config, dir.path()).issues), vec!["_debugDump"]);

    let mut config = Config::default();
    config.detection.unused_function = false;
    assert_eq!(symbols(&scan(&config, dir.path()).issues), vec!["LegacyUser"]);
}

#[test]
fn test_generated_files_are_not_scanned() {
    let dir = project(&[
        ("lib/main.dart", "void main() {}\n"),
        ("lib/user.g.dart", "class GeneratedOnly {}\n"),
        ("build/cache.dart", "class BuildOutput {}\n"),
    ]);
    let result = scan(&Config::default(), dir.path());
    assert_eq!(result.stats.files, 1);
    assert!(result.issues.is_empty());
}

#[test]
fn test_partial_import_suggests_narrowed_show() {
    let dir = project(&[
        ("lib/a.dart", "class X {}\nclass Y {}\n"),
        ("lib/main.dart", "import 'a.dart' show X, Y;\n\nvoid main() {\n  X();\n}\n"),
    ]);
    let result = scan(&Config::default(), dir.path());

    let partial = result
        .issues
        .iter()
        .find(|i| i.category == IssueCategory::PartialImport)
        .expect("partial import reported");
    assert_eq!(partial.suggestion.as_deref(), Some("show X;"));
    assert!(!partial.fixable);
    assert_eq!(partial.code(), "DC007");
    assert!(symbols(&result.issues).contains(&"Y".to_string()));
}

#[test]
fn test_partial_imports_can_be_disabled() {
    let dir = project(&[
        ("lib/a.dart", "class X {}\nclass Y {}\n"),
        ("lib/main.dart", "import 'a.dart' show X, Y;\n\nvoid main() {\n  X();\n}\n"),
    ]);
    let mut config = Config::default();
    config.imports.report_partial = false;
    let result = scan(&config, dir.path());
    assert!(result
        .issues
        .iter()
        .all(|i| i.category != IssueCategory::PartialImport));
}

#[test]
fn test_unused_import_is_fixable() {
    let dir = project(&[
        ("lib/a.dart", "class X {}\n"),
        ("lib/main.dart", "import 'a.dart';\n\nvoid main() {}\n"),
    ]);
    let result = scan(&Config::default(), dir.path());

    let import = result
        .issues
        .iter()
        .find(|i| i.category == IssueCategory::UnusedImport)
        .expect("unused import reported");
    assert_eq!(import.symbol, "a.dart");
    assert_eq!(import.location.line, 1);
    assert!(import.fixable);
}

#[test]
fn test_syntax_error_only_skips_that_file() {
    let dir = project(&[
        ("lib/broken.dart", "class Broken {\n  void f() {\n"),
        ("lib/main.dart", "void main() {}\nvoid _unused() {}\n"),
    ]);
    let result = scan(&Config::default(), dir.path());

    assert_eq!(result.stats.files, 2);
    assert_eq!(result.stats.failed, 1);
    assert_eq!(symbols(&result.issues), vec!["_unused"]);
}

#[test]
fn test_cross_package_references() {
    let dir = project(&[
        ("lib/main.dart", "import 'package:core/core.dart';\n\nvoid main() {\n  CoreApi();\n}\n"),
        ("packages/core/pubspec.yaml", "name: core\n"),
        ("packages/core/lib/core.dart", "class CoreApi {}\nclass CoreDead {}\n"),
    ]);
    let result = scan(&Config::default(), dir.path());

    assert_eq!(result.stats.packages, 2);
    let found = symbols(&result.issues);
    assert!(found.contains(&"CoreDead".to_string()));
    assert!(!found.contains(&"CoreApi".to_string()));
    let dead = result.issues.iter().find(|i| i.symbol == "CoreDead").unwrap();
    assert_eq!(dead.package, "core");
}

#[test]
fn test_config_file_is_loaded_from_project_root() {
    let dir = project(&[
        ("lib/main.dart", MAIN),
        ("lib/src/models.dart", MODELS),
        (".deadcode.yml", "exclude_private: true\nmin_severity: warning\n"),
    ]);
    let config = Config::from_default_locations(dir.path()).unwrap();
    assert!(config.exclude_private);
    assert_eq!(symbols(&scan(&config, dir.path()).issues), vec!["LegacyUser"]);
}
