// Pub package detection and library URIs

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const SKIPPED_DIRS: &[&str] = &["build", ".dart_tool", ".git", ".idea", "node_modules"];

#[derive(Debug, Deserialize)]
struct Pubspec {
    name: Option<String>,
}

/// A directory with a `pubspec.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub root: PathBuf,
}

/// All packages below a project root, deepest first
#[derive(Debug, Clone, Default)]
pub struct PackageMap {
    packages: Vec<Package>,
}

impl PackageMap {
    pub fn discover(root: &Path) -> Result<Self> {
        let mut packages = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .map(|name| SKIPPED_DIRS.contains(&name))
                        .unwrap_or(false)
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_name() != "pubspec.yaml" || !entry.file_type().is_file() {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            match read_package_name(entry.path()) {
                Ok(Some(name)) => {
                    debug!("Package '{}' at {}", name, dir.display());
                    packages.push(Package {
                        name,
                        root: dir.to_path_buf(),
                    });
                }
                Ok(None) => warn!("{} has no name field", entry.path().display()),
                Err(e) => warn!("Skipping {}: {:?}", entry.path().display(), e),
            }
        }

        packages.sort_by(|a, b| {
            b.root
                .components()
                .count()
                .cmp(&a.root.components().count())
        });
        Ok(Self { packages })
    }

    /// Nearest enclosing package of `path`
    pub fn package_for(&self, path: &Path) -> Option<&Package> {
        self.packages.iter().find(|p| path.starts_with(&p.root))
    }

    /// Package name and library URI of `path`; files outside any package
    /// belong to a package named after `root`
    pub fn locate(&self, path: &Path, root: &Path) -> (String, String) {
        match self.package_for(path) {
            Some(package) => (package.name.clone(), library_uri(package, path)),
            None => {
                let name = root
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("root")
                    .to_string();
                (name, file_uri(path))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

fn read_package_name(pubspec: &Path) -> Result<Option<String>> {
    let contents = std::fs::read_to_string(pubspec)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", pubspec.display()))?;
    let parsed: Pubspec = serde_yaml::from_str(&contents)
        .into_diagnostic()
        .wrap_err("Failed to parse pubspec.yaml")?;
    Ok(parsed.name)
}

/// `package:<name>/<path under lib>` or a `file://` URI
pub fn library_uri(package: &Package, path: &Path) -> String {
    match path.strip_prefix(package.root.join("lib")) {
        Ok(rel) => format!(
            "package:{}/{}",
            package.name,
            rel.to_string_lossy().replace('\\', "/")
        ),
        Err(_) => file_uri(path),
    }
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.to_string_lossy().replace('\\', "/"))
}
