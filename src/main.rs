use clap::Parser;
use colored::Colorize;
use dartdeadcode::{
    Config, FileFinder, Fixer, FixResult, ReportFormat, Reporter, Scanner, Severity, UndoScript,
};
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// dartdeadcode - Find and remove dead code in Dart and Flutter projects
#[derive(Parser, Debug)]
#[command(name = "dartdeadcode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target directories to analyze (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Path patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Name patterns to retain - never report as dead (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum severity to report (info, warning, error)
    #[arg(long)]
    min_severity: Option<Severity>,

    /// Name-only resolution, without element IDs or import tracking
    #[arg(long)]
    no_semantic: bool,

    /// Delete fixable dead code
    #[arg(long)]
    fix: bool,

    /// Show what --fix would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Apply fixes without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Write a shell script that restores the files changed by --fix
    #[arg(long, value_name = "FILE")]
    undo_script: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("dartdeadcode v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&cli.path)?
    };

    // CLI arguments win over the file
    if !cli.target.is_empty() {
        config.targets = cli.target.clone();
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    config.exclude_patterns.extend(cli.retain.iter().cloned());
    if let Some(severity) = cli.min_severity {
        config.min_severity = severity;
    }
    if cli.no_semantic {
        config.semantic = false;
    }

    Ok(config)
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    info!("Discovering files...");
    let files = FileFinder::new(config).find_files(&cli.path)?;
    info!("Found {} Dart files", files.len());

    if files.is_empty() {
        if !cli.quiet {
            println!("{}", "No Dart files found.".yellow());
        }
        return Ok(());
    }

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .into_diagnostic()?
                .progress_chars("#>-"),
        );
        pb
    };

    let scan = Scanner::new(config).with_progress(pb.clone()).scan(&files);
    pb.finish_and_clear();
    info!(
        "Analysis finished in {:.2}s: {} issues",
        start_time.elapsed().as_secs_f64(),
        scan.issues.len()
    );

    let fix = if cli.fix || cli.dry_run {
        run_fix(config, cli, &scan)?
    } else {
        None
    };

    let format = match cli.format {
        Some(format) => format,
        None => config.report.format.parse()?,
    };
    let root = std::fs::canonicalize(&cli.path).unwrap_or_else(|_| cli.path.clone());
    Reporter::new(format, cli.output.clone())
        .with_root(root)
        .with_code(config.report.show_code)
        .report(&scan, fix.as_ref())
}

fn run_fix(
    config: &Config,
    cli: &Cli,
    scan: &dartdeadcode::ScanResult,
) -> Result<Option<FixResult>> {
    let fixable = scan.fixable_issues().count();
    if fixable == 0 {
        info!("Nothing to fix");
        return Ok(None);
    }

    if !cli.dry_run && !cli.yes && console::user_attended() {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete {} unused declarations?", fixable))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{}", "Fix cancelled.".yellow());
            return Ok(None);
        }
    }

    let result = Fixer::new(config)
        .with_dry_run(cli.dry_run)
        .apply(&scan.issues);

    if let Some(path) = &cli.undo_script {
        if !cli.dry_run && !result.is_noop() {
            let script = UndoScript::from_fix(&result);
            script.write(path)?;
            info!(
                "Undo script for {} files written to {}",
                script.file_count(),
                path.display()
            );
        }
    }

    Ok(Some(result))
}
