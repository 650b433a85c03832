mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::refactor::FixResult;
use crate::scan::ScanResult;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl FromStr for ReportFormat {
    type Err = miette::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" | "text" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            other => Err(miette!("Unknown report format '{}'", other)),
        }
    }
}

/// Renders scan and fix results in the configured format
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    root: Option<PathBuf>,
    show_code: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            root: None,
            show_code: true,
        }
    }

    /// Print paths relative to `root`
    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_code(mut self, show: bool) -> Self {
        self.show_code = show;
        self
    }

    pub fn render(&self, scan: &ScanResult, fix: Option<&FixResult>) -> Result<String> {
        match self.format {
            ReportFormat::Terminal => {
                let mut reporter = TerminalReporter::new().with_code(self.show_code);
                if let Some(root) = &self.root {
                    reporter = reporter.with_root(root.clone());
                }
                Ok(reporter.render(scan, fix))
            }
            ReportFormat::Json => JsonReporter::new().render(scan, fix),
        }
    }

    /// Write the report to the output file, or stdout
    pub fn report(&self, scan: &ScanResult, fix: Option<&FixResult>) -> Result<()> {
        let rendered = self.render(scan, fix)?;
        match &self.output_path {
            Some(path) => {
                std::fs::write(path, &rendered)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to write report to {}", path.display()))?;
                eprintln!("Report written to: {}", path.display());
            }
            None => print!("{}", rendered),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!(
            "Terminal".parse::<ReportFormat>().unwrap(),
            ReportFormat::Terminal
        );
        assert!("sarif".parse::<ReportFormat>().is_err());
    }
}
