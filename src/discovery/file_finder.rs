use super::PackageMap;
use crate::config::Config;
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A discovered Dart source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Owning pub package
    pub package: String,

    /// `package:` URI for files under `lib/`, else `file://`
    pub library_uri: String,
}

impl SourceFile {
    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))
    }
}

/// File finder for discovering Dart sources in a project
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all `.dart` files under the configured targets of `root`
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let root = root
            .canonicalize()
            .into_diagnostic()
            .wrap_err_with(|| format!("Project root not found: {}", root.display()))?;
        debug!("Scanning for files in: {}", root.display());

        let packages = PackageMap::discover(&root)?;

        let targets = if self.config.targets.is_empty() {
            vec![root.clone()]
        } else {
            self.config.targets.iter().map(|t| root.join(t)).collect()
        };

        let mut files: Vec<SourceFile> = targets
            .par_iter()
            .flat_map(|target| self.scan_directory(target))
            .map(|path| {
                let (package, library_uri) = packages.locate(&path, &root);
                SourceFile {
                    path,
                    package,
                    library_uri,
                }
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        debug!(
            "Found {} Dart files in {} packages",
            files.len(),
            packages.len().max(1)
        );
        Ok(files)
    }

    fn scan_directory(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("dart") {
                    return None;
                }
                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }
                trace!("Found: {}", path.display());
                Some(path.to_path_buf())
            })
            .collect()
    }
}
