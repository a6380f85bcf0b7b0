//! CLI for the rewrite-batch tool.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rewrite_batch::diff::colorized_diff;
use rewrite_batch::prelude::*;
use rewrite_batch::presets;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rewrite-batch")]
#[command(author, version, about = "Idempotent batch source rewriting", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a batch to its targets
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Preview changes without writing
        #[arg(long)]
        dry_run: bool,

        /// Number of worker threads
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Dry run that fails when any target would change or fails
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of worker threads
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,
    },

    /// Print the effective batch configuration
    ShowConfig {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,
    },

    /// List built-in presets
    Presets,
}

#[derive(Args)]
struct SourceArgs {
    /// Batch configuration file (.yaml, .yml or .json)
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in preset name
    #[arg(short, long)]
    preset: Option<String>,

    /// Base directory for relative target paths (overrides the config)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

impl SourceArgs {
    fn load(&self) -> Result<BatchConfig> {
        let config = match (&self.config, &self.preset) {
            (Some(path), _) => BatchConfig::from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            (None, Some(name)) => presets::by_name(name).ok_or_else(|| {
                anyhow!(
                    "unknown preset '{}' (available: {})",
                    name,
                    presets::PRESETS.join(", ")
                )
            })?,
            (None, None) => bail!("either --config or --preset is required"),
        };

        Ok(match &self.root {
            Some(root) => config.with_root(root),
            None => config,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Yaml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Run {
            source,
            dry_run,
            jobs,
            format,
        } => cmd_run(&source, dry_run, jobs, format),
        Commands::Check { source, jobs } => cmd_check(&source, jobs),
        Commands::ShowConfig { source, format } => cmd_show_config(&source, format),
        Commands::Presets => cmd_presets(),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(source: &SourceArgs, dry_run: bool, jobs: usize, format: ReportFormat) -> Result<ExitCode> {
    let config = source.load()?;
    let (spec, targets) = config.build().context("Invalid batch configuration")?;
    let runner = BatchRunner::new(&spec).jobs(jobs).dry_run(dry_run);

    let report = match format {
        ReportFormat::Text => {
            println!("Running '{}' on {} target(s)", spec.name(), targets.len());
            runner.run_with(&targets, |result| println!("  {result}"))
        }
        ReportFormat::Json => runner.run(&targets),
    }
    .context("Batch aborted")?;

    match format {
        ReportFormat::Text => {
            if dry_run {
                for result in &report.results {
                    if let Some(preview) = &result.preview {
                        print!("{}", colorized_diff(preview));
                    }
                }
            }
            print_summary(&report);
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(exit_code(&report))
}

fn cmd_check(source: &SourceArgs, jobs: usize) -> Result<ExitCode> {
    let config = source.load()?;
    let (spec, targets) = config.build().context("Invalid batch configuration")?;
    let report = BatchRunner::new(&spec)
        .jobs(jobs)
        .dry_run(true)
        .run(&targets)
        .context("Batch aborted")?;

    let pending: Vec<&TransformResult> = report
        .results
        .iter()
        .filter(|r| r.status == TransformStatus::Applied)
        .collect();

    for result in &pending {
        println!("needs rewrite: {} ({})", result.path.display(), result.cause);
    }
    print_summary(&report);

    if report.summary.has_failures() || !pending.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_show_config(source: &SourceArgs, format: ConfigFormat) -> Result<ExitCode> {
    let config = source.load()?;
    config.spec().context("Invalid batch configuration")?;

    let rendered = match format {
        ConfigFormat::Yaml => config.to_yaml()?,
        ConfigFormat::Json => config.to_json()?,
    };
    println!("{}", rendered.trim_end());
    Ok(ExitCode::SUCCESS)
}

fn cmd_presets() -> Result<ExitCode> {
    println!("Built-in presets:");
    for name in presets::PRESETS {
        if let Some(config) = presets::by_name(name) {
            println!(
                "  {} ({} rule(s), {} target(s)){}",
                name,
                config.rules.len(),
                config.targets.len(),
                config
                    .description
                    .as_deref()
                    .map(|d| format!(": {d}"))
                    .unwrap_or_default()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &BatchReport) {
    println!("\n{}", report.summary);
    if report.summary.diff.files_changed > 0 {
        println!("{}", report.summary.diff);
    }
    if report.summary.has_failures() {
        println!("\nFailures:");
        for failure in &report.summary.failures {
            println!("  {}: {}", failure.path.display(), failure.reason);
        }
    }
}

fn exit_code(report: &BatchReport) -> ExitCode {
    if report.summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
