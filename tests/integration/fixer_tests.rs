//! Auto-fix integration tests: scan a project on disk, fix it, scan again.

use dartdeadcode::refactor::Termination;
use dartdeadcode::{
    Config, FileFinder, FixResult, Fixer, IssueCategory, ScanResult, Scanner, UndoScript,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("pubspec.yaml"), "name: app\n").unwrap();
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn scan(root: &Path) -> ScanResult {
    let config = Config::default();
    let files = FileFinder::new(&config).find_files(root).unwrap();
    Scanner::new(&config).scan(&files)
}

fn fix(scan: &ScanResult) -> FixResult {
    Fixer::new(&Config::default()).apply(&scan.issues)
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

const HELPER_CLASS: &str = "class A {\n  void used() {}\n\n  /// Formats nothing.\n  void _helper() => used();\n}\n";
const HELPER_MAIN: &str = "import 'a.dart';\n\nvoid main() {\n  A().used();\n}\n";

#[test]
fn test_fix_removes_private_helper() {
    let dir = project(&[("lib/a.dart", HELPER_CLASS), ("lib/main.dart", HELPER_MAIN)]);
    let first = scan(dir.path());
    let symbols: Vec<_> = first.issues.iter().map(|i| i.qualified_symbol()).collect();
    assert_eq!(symbols, vec!["A._helper"]);

    let result = fix(&first);
    assert_eq!(result.issues_applied, 1);
    assert_eq!(result.files_changed.len(), 1);
    assert!(result.errors.is_empty());
    assert_eq!(read(dir.path(), "lib/a.dart"), "class A {\n  void used() {}\n\n}\n");
}

#[test]
fn test_fix_is_idempotent() {
    let dir = project(&[("lib/a.dart", HELPER_CLASS), ("lib/main.dart", HELPER_MAIN)]);
    let first = scan(dir.path());
    fix(&first);
    let after_first = read(dir.path(), "lib/a.dart");

    let second = scan(dir.path());
    assert_eq!(second.fixable_issues().count(), 0);
    let result = fix(&second);
    assert!(result.is_noop());
    assert_eq!(read(dir.path(), "lib/a.dart"), after_first);

    // re-applying the stale first-run issues changes nothing either
    let replay = fix(&first);
    assert!(replay.is_noop());
    assert_eq!(replay.issues_applied, 0);
    assert_eq!(replay.skipped.len(), 1);
    assert_eq!(read(dir.path(), "lib/a.dart"), after_first);
}

#[test]
fn test_single_line_class_stays_intact() {
    let dir = project(&[
        ("lib/a.dart", "class A { void used() {} void _helper() => used(); }\n"),
        ("lib/main.dart", HELPER_MAIN),
    ]);
    fix(&scan(dir.path()));

    let fixed = read(dir.path(), "lib/a.dart");
    assert!(!fixed.contains("_helper"));
    assert!(fixed.contains("void used() {}"));
    let rescan = scan(dir.path());
    assert_eq!(rescan.stats.failed, 0);
    assert!(rescan.issues.is_empty());
}

#[test]
fn test_directives_are_never_deleted() {
    let dir = project(&[
        (
            "lib/models.dart",
            "import 'dart:math';\n// helpers\nclass Unused {}\n\nclass Used {\n  int roll() => Random().nextInt(6);\n}\n",
        ),
        (
            "lib/main.dart",
            "import 'models.dart';\n\nvoid main() {\n  print(Used().roll());\n}\n",
        ),
    ]);
    let result = fix(&scan(dir.path()));
    assert_eq!(result.issues_applied, 1);

    let fixed = read(dir.path(), "lib/models.dart");
    assert!(fixed.starts_with("import 'dart:math';\n"));
    assert!(!fixed.contains("Unused"));
    assert!(fixed.contains("class Used {"));
}

#[test]
fn test_file_with_only_dead_class_is_deleted() {
    let dir = project(&[
        ("lib/dead.dart", "import 'package:meta/meta.dart';\n\n/// Old API.\nclass Dead {}\n"),
        ("lib/main.dart", "void main() {}\n"),
    ]);
    let result = fix(&scan(dir.path()));

    assert!(!dir.path().join("lib/dead.dart").exists());
    assert_eq!(result.files_deleted.len(), 1);
    assert!(result.files_deleted[0].ends_with("lib/dead.dart"));
    assert_eq!(read(dir.path(), "lib/main.dart"), "void main() {}\n");
}

#[test]
fn test_unused_import_and_its_library_removed() {
    let dir = project(&[
        ("lib/a.dart", "class A {}\n"),
        ("lib/b.dart", "class B {}\n"),
        (
            "lib/main.dart",
            "import 'a.dart';\nimport 'b.dart';\n\nvoid main() {\n  A();\n}\n",
        ),
    ]);
    let first = scan(dir.path());
    assert!(first
        .issues
        .iter()
        .any(|i| i.category == IssueCategory::UnusedImport && i.symbol == "b.dart"));

    let result = fix(&first);
    assert!(!dir.path().join("lib/b.dart").exists());
    assert_eq!(
        read(dir.path(), "lib/main.dart"),
        "import 'a.dart';\n\nvoid main() {\n  A();\n}\n"
    );
    // import batches do not cascade
    assert!(result
        .cascades
        .keys()
        .all(|path| !path.ends_with("lib/main.dart")));
    assert!(scan(dir.path()).issues.is_empty());
}

#[test]
fn test_cascade_removes_newly_orphaned_private_members() {
    let dir = project(&[
        (
            "lib/a.dart",
            "class A {\n  void run() {}\n\n  void unusedPublic() => _only();\n\n  void _only() {}\n}\n",
        ),
        ("lib/main.dart", "import 'a.dart';\n\nvoid main() {\n  A().run();\n}\n"),
    ]);
    let first = scan(dir.path());
    let symbols: Vec<_> = first.issues.iter().map(|i| i.qualified_symbol()).collect();
    assert_eq!(symbols, vec!["A.unusedPublic"]);

    let result = fix(&first);
    assert_eq!(result.cascade_removed(), 1);
    assert_eq!(read(dir.path(), "lib/a.dart"), "class A {\n  void run() {}\n\n}\n");
    assert!(scan(dir.path()).issues.is_empty());
}

#[test]
fn test_cascade_keeps_private_members_used_from_part_files() {
    let dir = project(&[
        (
            "lib/a.dart",
            "part 'b.dart';\n\nclass A {\n  void run() {}\n\n  void deadPublic() {}\n}\n\nvoid _shared() {}\n",
        ),
        ("lib/b.dart", "part of 'a.dart';\n\nvoid entry() => _shared();\n"),
        (
            "lib/main.dart",
            "import 'a.dart';\n\nvoid main() {\n  A().run();\n  entry();\n}\n",
        ),
    ]);
    let first = scan(dir.path());
    let symbols: Vec<_> = first.issues.iter().map(|i| i.qualified_symbol()).collect();
    assert!(symbols.contains(&"A.deadPublic".to_string()), "{:?}", symbols);
    assert!(!symbols.contains(&"_shared".to_string()), "{:?}", symbols);

    let result = fix(&first);
    let fixed = read(dir.path(), "lib/a.dart");
    assert!(!fixed.contains("deadPublic"));
    assert!(fixed.contains("void _shared() {}"));
    assert_eq!(result.cascade_removed(), 0);
    assert!(result
        .cascades
        .values()
        .any(|report| report.termination == Termination::LibraryParts));
}

#[test]
fn test_dry_run_reports_without_writing() {
    let dir = project(&[("lib/a.dart", HELPER_CLASS), ("lib/main.dart", HELPER_MAIN)]);
    let result = Fixer::new(&Config::default())
        .with_dry_run(true)
        .apply(&scan(dir.path()).issues);

    assert!(result.dry_run);
    assert_eq!(result.issues_applied, 1);
    assert_eq!(result.files_changed.len(), 1);
    assert_eq!(read(dir.path(), "lib/a.dart"), HELPER_CLASS);
}

#[test]
fn test_undo_script_holds_original_contents() {
    let dir = project(&[("lib/a.dart", HELPER_CLASS), ("lib/main.dart", HELPER_MAIN)]);
    let result = fix(&scan(dir.path()));

    let script = UndoScript::from_fix(&result);
    assert_eq!(script.file_count(), 1);
    let rendered = script.render();
    assert!(rendered.contains(HELPER_CLASS));
    assert!(rendered.contains("a.dart"));

    let script_path = dir.path().join("undo.sh");
    script.write(&script_path).unwrap();
    assert!(script_path.exists());
}
