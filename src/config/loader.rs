use crate::analysis::{IssueCategory, Severity};
use crate::di::DiFramework;
use crate::graph::ResolutionMode;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a dead code scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories to analyze, relative to the project root
    pub targets: Vec<PathBuf>,

    /// Path globs excluded from discovery
    pub exclude: Vec<String>,

    /// Per-category switches
    pub detection: DetectionConfig,

    /// Name wildcards (`*`, `?`) never reported
    pub exclude_patterns: Vec<String>,

    /// Annotations (without `@`) whose targets are never reported
    pub exclude_annotations: Vec<String>,

    pub exclude_public: bool,
    pub exclude_private: bool,
    pub exclude_static: bool,
    pub exclude_overrides: bool,

    /// Issues below this severity are dropped
    pub min_severity: Severity,

    /// Resolve element IDs and import usage
    pub semantic: bool,

    /// DI frameworks whose idioms count as usage
    pub di_frameworks: Vec<DiFramework>,

    pub imports: ImportConfig,

    /// Report declarations inside test files
    pub analyze_tests: bool,

    /// Names never reported, in addition to `main`
    pub entry_points: Vec<String>,

    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub unused_class: bool,
    pub unused_function: bool,
    pub unused_method: bool,
    pub unused_field: bool,
    pub unused_param: bool,
    pub unused_import: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Track which `show` names of each import are used
    pub track_symbols: bool,

    /// Report imports whose `show` list is only partly used
    pub report_partial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,

    /// Show the declaration line under each issue
    pub show_code: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![],
            exclude: vec![
                "**/build/**".to_string(),
                "**/.dart_tool/**".to_string(),
                "*.g.dart".to_string(),
                "*.freezed.dart".to_string(),
            ],
            detection: DetectionConfig::default(),
            exclude_patterns: vec![],
            exclude_annotations: vec![],
            exclude_public: false,
            exclude_private: false,
            exclude_static: false,
            exclude_overrides: true,
            min_severity: Severity::Info,
            semantic: true,
            di_frameworks: DiFramework::ALL.to_vec(),
            imports: ImportConfig::default(),
            analyze_tests: false,
            entry_points: vec![],
            report: ReportConfig::default(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            unused_class: true,
            unused_function: true,
            unused_method: true,
            unused_field: true,
            unused_param: true,
            unused_import: true,
        }
    }
}

impl DetectionConfig {
    pub fn enabled(&self, category: IssueCategory) -> bool {
        match category {
            IssueCategory::UnusedClass => self.unused_class,
            IssueCategory::UnusedFunction => self.unused_function,
            IssueCategory::UnusedMethod => self.unused_method,
            IssueCategory::UnusedField => self.unused_field,
            IssueCategory::UnusedParameter => self.unused_param,
            IssueCategory::UnusedImport | IssueCategory::PartialImport => self.unused_import,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            track_symbols: true,
            report_partial: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
            show_code: true,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => match serde_yaml::from_str(&contents) {
                Ok(config) => Ok(config),
                Err(_) => toml::from_str(&contents)
                    .into_diagnostic()
                    .wrap_err("Failed to parse config file"),
            },
        }
    }

    /// Load the first config found in `project_root`, or defaults
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".deadcode.yml",
            ".deadcode.yaml",
            ".deadcode.toml",
            "deadcode.yml",
            "deadcode.yaml",
            "deadcode.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Whether a path matches one of the `exclude` globs
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    pub fn resolution_mode(&self) -> ResolutionMode {
        if self.semantic {
            ResolutionMode::Semantic
        } else {
            ResolutionMode::NameOnly
        }
    }

    /// Whether partial-import findings are produced
    pub fn reports_partial_imports(&self) -> bool {
        self.imports.track_symbols && self.imports.report_partial
    }
}

/// Wildcard matching for names and paths
///
/// `*` matches within one path segment, `**` across segments and `?` one
/// character. A pattern without `/` is matched against the last path segment
/// when `text` is a path, so `*.g.dart` excludes generated files anywhere.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('/') && text.contains('/') {
        let file_name = text.rsplit('/').next().unwrap_or(text);
        return wildcard(pattern.as_bytes(), file_name.as_bytes());
    }
    wildcard(pattern.as_bytes(), text.trim_start_matches("./").as_bytes())
}

fn wildcard(pattern: &[u8], text: &[u8]) -> bool {
    // matches[i][j]: pattern[i..] matches text[j..]
    let (p, t) = (pattern.len(), text.len());
    let mut matches = vec![vec![false; t + 1]; p + 1];
    matches[p][t] = true;

    for i in (0..p).rev() {
        let double = pattern[i] == b'*' && pattern.get(i + 1) == Some(&b'*');
        for j in (0..=t).rev() {
            matches[i][j] = match pattern[i] {
                b'*' if double && pattern.get(i + 2) == Some(&b'/') => {
                    // "**/" matches zero segments at a segment start
                    let at_segment = j == 0 || text[j - 1] == b'/';
                    (at_segment && matches[i + 3][j])
                        || matches[i + 2][j]
                        || (j < t && matches[i][j + 1])
                }
                b'*' if double => matches[i + 2][j] || (j < t && matches[i][j + 1]),
                b'*' if i > 0 && pattern[i - 1] == b'*' => matches[i + 1][j],
                b'*' => matches[i + 1][j] || (j < t && text[j] != b'/' && matches[i][j + 1]),
                b'?' => j < t && text[j] != b'/' && matches[i + 1][j + 1],
                c => j < t && text[j] == c && matches[i + 1][j + 1],
            };
        }
    }
    matches[0][0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_names() {
        assert!(glob_match("*Service", "UserService"));
        assert!(!glob_match("*Service", "ServiceLocator"));
        assert!(glob_match("Test*", "TestHelper"));
        assert!(glob_match("_debug?", "_debug2"));
        assert!(!glob_match("_debug?", "_debug"));
    }

    #[test]
    fn test_glob_match_paths() {
        assert!(glob_match("**/build/**", "/project/build/output.dart"));
        assert!(glob_match("**/build/**", "app/build/generated/a.dart"));
        assert!(glob_match("**/build/**", "build/a.dart"));
        assert!(!glob_match("**/build/**", "/project/lib/builder.dart"));
        assert!(glob_match("lib/**/*.dart", "lib/src/a/b.dart"));
        assert!(glob_match("lib/**/*.dart", "lib/b.dart"));
        assert!(!glob_match("lib/*.dart", "lib/src/b.dart"));
    }

    #[test]
    fn test_glob_match_file_names_anywhere() {
        assert!(glob_match("*.g.dart", "lib/models/user.g.dart"));
        assert!(glob_match("*.freezed.dart", "/abs/lib/user.freezed.dart"));
        assert!(!glob_match("*.g.dart", "lib/models/user.dart"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.detection.unused_class);
        assert!(config.exclude_overrides);
        assert!(config.semantic);
        assert_eq!(config.di_frameworks.len(), 5);
        assert_eq!(config.min_severity, Severity::Info);
        assert!(config.should_exclude(Path::new("app/.dart_tool/x.dart")));
        assert!(config.should_exclude(Path::new("lib/user.g.dart")));
        assert!(!config.should_exclude(Path::new("lib/user.dart")));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".deadcode.yml");
        std::fs::write(
            &path,
            "min_severity: warning\nsemantic: false\ndi_frameworks: [get_it, bloc]\n\
             exclude_annotations: [keep]\ndetection:\n  unused_param: false\n",
        )
        .unwrap();

        let config = Config::from_default_locations(dir.path()).unwrap();
        assert_eq!(config.min_severity, Severity::Warning);
        assert_eq!(config.resolution_mode(), ResolutionMode::NameOnly);
        assert_eq!(config.di_frameworks, vec![DiFramework::GetIt, DiFramework::Bloc]);
        assert!(!config.detection.enabled(IssueCategory::UnusedParameter));
        assert!(config.detection.enabled(IssueCategory::UnusedClass));
        assert_eq!(config.exclude_annotations, vec!["keep"]);
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deadcode.toml");
        std::fs::write(
            &path,
            "entry_points = [\"bootstrap\"]\n\n[imports]\nreport_partial = false\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.entry_points, vec!["bootstrap"]);
        assert!(!config.reports_partial_imports());
        assert!(config.imports.track_symbols);
    }
}
