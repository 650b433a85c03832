use super::fixer::FixResult;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Shell script that restores files changed or deleted by a fix
pub struct UndoScript {
    /// Original file contents before the fix
    file_states: BTreeMap<PathBuf, String>,
}

impl UndoScript {
    pub fn new() -> Self {
        Self {
            file_states: BTreeMap::new(),
        }
    }

    /// Record every file a fix touched
    pub fn from_fix(result: &FixResult) -> Self {
        let mut script = Self::new();
        for (path, contents) in result.originals() {
            script.record_file_state(path, contents);
        }
        script
    }

    /// Record the state of a file before modification; the first state wins
    pub fn record_file_state(&mut self, path: &Path, contents: &str) {
        self.file_states
            .entry(path.to_path_buf())
            .or_insert_with(|| contents.to_string());
    }

    pub fn render(&self) -> String {
        let mut script = String::new();

        script.push_str("#!/bin/bash\n");
        script.push_str("# dartdeadcode undo script\n");
        script.push_str("# Run to restore files changed or deleted by --fix\n\n");
        script.push_str("set -e\n\n");

        for (file_path, contents) in &self.file_states {
            let quoted = shell_quote(&file_path.display().to_string());
            script.push_str(&format!("# {}\n", file_path.display()));
            if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                script.push_str(&format!(
                    "mkdir -p {}\n",
                    shell_quote(&parent.display().to_string())
                ));
            }
            // single-quoted payload through printf restores the bytes exactly
            script.push_str(&format!(
                "printf '%s' {} > {}\n",
                shell_quote(contents),
                quoted
            ));
            script.push_str(&format!(
                "echo {}\n\n",
                shell_quote(&format!("restored {}", file_path.display()))
            ));
        }

        script.push_str(&format!("echo 'Restored {} files'\n", self.file_states.len()));
        script
    }

    /// Write the undo script and make it executable
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write undo script {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path).into_diagnostic()?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(path, perms).into_diagnostic()?;
        }

        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.file_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_states.is_empty()
    }
}

impl Default for UndoScript {
    fn default() -> Self {
        Self::new()
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_state_wins() {
        let mut script = UndoScript::new();
        script.record_file_state(Path::new("lib/a.dart"), "class A {}\n");
        script.record_file_state(Path::new("lib/a.dart"), "");
        assert_eq!(script.file_count(), 1);
        assert!(script.render().contains("class A {}\n"));
    }

    #[test]
    fn test_paths_and_contents_are_quoted() {
        let mut script = UndoScript::new();
        script.record_file_state(Path::new("lib/it's.dart"), "final s = 'x';");
        let rendered = script.render();
        let expected = "printf '%s' 'final s = '\\''x'\\'';' > 'lib/it'\\''s.dart'\n";
        assert!(rendered.contains(expected));
        assert!(rendered.contains("mkdir -p 'lib'"));
    }

    #[cfg(unix)]
    #[test]
    fn test_restores_exact_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("lib/a.dart");
        let original = "class Live {}\nDARTDEADCODE_EOF\nfinal s = '$HOME \\n it\\'s';\nclass Dead {}";

        let mut script = UndoScript::new();
        script.record_file_state(&target, original);
        let script_path = temp_dir.path().join("restore.sh");
        script.write(&script_path).unwrap();

        let status = std::process::Command::new("sh")
            .arg(&script_path)
            .stdout(std::process::Stdio::null())
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), original);
    }

    #[test]
    fn test_write_is_executable() {
        let temp_dir = TempDir::new().unwrap();
        let script_path = temp_dir.path().join("restore.sh");

        let mut script = UndoScript::new();
        script.record_file_state(Path::new("lib/a.dart"), "class A {}\n");
        script.write(&script_path).unwrap();

        let contents = std::fs::read_to_string(&script_path).unwrap();
        assert!(contents.starts_with("#!/bin/bash\n"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&script_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }
}
