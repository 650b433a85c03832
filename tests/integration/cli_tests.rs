//! CLI integration tests
//!
//! These tests run the `dartdeadcode` binary against temporary projects.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
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

fn sample() -> TempDir {
    project(&[
        (
            "lib/main.dart",
            "import 'models.dart';\n\nvoid main() {\n  print(User().name);\n}\n",
        ),
        (
            "lib/models.dart",
            "class User {\n  String name = 'a';\n}\n\nclass LegacyUser {}\n",
        ),
    ])
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("dartdeadcode").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fix"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dartdeadcode"));
}

#[test]
fn test_terminal_report() {
    let dir = sample();
    cli()
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("lib/models.dart"))
        .stdout(predicate::str::contains("DC001"))
        .stdout(predicate::str::contains("Class 'LegacyUser' is never used"));
}

#[test]
fn test_json_report() {
    let dir = sample();
    let output = cli()
        .arg(dir.path())
        .args(["--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_issues"], 1);
    assert_eq!(value["issues"][0]["symbol"], "LegacyUser");
    assert_eq!(value["issues"][0]["category"], "unused-class");
}

#[test]
fn test_json_report_to_file() {
    let dir = sample();
    let report = dir.path().join("report.json");
    cli()
        .arg(dir.path())
        .args(["--format", "json", "--quiet", "--output"])
        .arg(&report)
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["total_issues"], 1);
}

#[test]
fn test_retain_pattern() {
    let dir = sample();
    cli()
        .arg(dir.path())
        .args(["--retain", "Legacy*", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dead code found!"));
}

#[test]
fn test_dry_run_does_not_write() {
    let dir = sample();
    let models = dir.path().join("lib/models.dart");
    let before = fs::read_to_string(&models).unwrap();

    cli()
        .arg(dir.path())
        .args(["--dry-run", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would fix 1 issues"));
    assert_eq!(fs::read_to_string(&models).unwrap(), before);
}

#[test]
fn test_fix_with_undo_script() {
    let dir = sample();
    let models = dir.path().join("lib/models.dart");
    let undo = dir.path().join("undo.sh");

    cli()
        .arg(dir.path())
        .args(["--fix", "--yes", "--quiet", "--undo-script"])
        .arg(&undo)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed 1 issues"));

    assert_eq!(
        fs::read_to_string(&models).unwrap(),
        "class User {\n  String name = 'a';\n}\n"
    );
    let script = fs::read_to_string(&undo).unwrap();
    assert!(script.contains("class LegacyUser {}"));
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No Dart files found."));
}

#[test]
fn test_missing_path_fails() {
    cli()
        .arg("/definitely/not/a/project")
        .assert()
        .failure();
}

#[test]
fn test_invalid_format_rejected() {
    let dir = sample();
    cli()
        .arg(dir.path())
        .args(["--format", "sarif"])
        .assert()
        .failure();
}
