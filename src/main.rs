//! cholera-validate: CLI entry point.
//!
//! Validates simulated cholera outbreaks against observed governorate data.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use cholera_validate::config::ValidationConfig;
use cholera_validate::routines;
use cholera_validate::types::{Routine, RoutineOutcome, RunReport};

#[derive(Parser)]
#[command(name = "cholera-validate")]
#[command(about = "Validate cholera simulation outputs against observed governorate data")]
#[command(version)]
struct Cli {
    /// Routines to run (default: all).
    #[arg(value_enum)]
    routines: Vec<Routine>,

    /// Path to a YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the simulation CSVs (overrides the config).
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory figures are written to (overrides the config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write a JSON report of all outcomes to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable debug diagnostics.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ValidationConfig::load(path)?,
        None => ValidationConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let selected = if cli.routines.is_empty() {
        Routine::ALL.to_vec()
    } else {
        cli.routines
    };

    println!("{}", "cholera-validate".bold());
    println!("  Data: {}", config.data_dir.display());
    println!("  Figures: {}", config.output_dir.display());
    println!("  Confidence: {:.0}%", config.confidence * 100.0);
    println!();

    let start = Instant::now();
    let mut outcomes = Vec::new();

    println!("{}", "Running routines...".cyan());

    for routine in selected {
        tracing::debug!(routine = routine.name(), "starting routine");
        let outcome = routines::run(routine, &config);
        print_outcome(&outcome);
        outcomes.push(outcome);
    }

    let elapsed = start.elapsed();
    let report = RunReport::new(&outcomes, elapsed.as_secs_f64());

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    // Summary
    println!();
    println!("{}", "=".repeat(60));

    if report.failed == 0 {
        println!(
            "  {} {} rendered, {} skipped in {:.2}s",
            "OK".green(),
            report.rendered.to_string().green(),
            report.skipped,
            elapsed.as_secs_f64()
        );
    } else {
        println!(
            "  {} {} rendered, {} failed, {} skipped in {:.2}s",
            "FAIL".red(),
            report.rendered,
            report.failed.to_string().red(),
            report.skipped,
            elapsed.as_secs_f64()
        );
    }

    println!("{}", "=".repeat(60));

    if report.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "cholera_validate=debug"
    } else {
        "cholera_validate=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &RoutineOutcome) {
    match outcome {
        RoutineOutcome::Rendered {
            name,
            figure,
            details,
            ..
        } => {
            println!("  {} {} -> {}", "✓".green(), name, figure.dimmed());
            println!("      {details}");
        }
        RoutineOutcome::Error { name, error } => {
            println!("  {} {} (error)", "✗".red(), name.red());
            println!("      {error}");
        }
        RoutineOutcome::Skip { name, reason } => {
            println!("  {} {} ({})", "○".yellow(), name.dimmed(), reason.dimmed());
        }
    }
}
