//! Wayfare CLI binary.
//!
//! Runs the feature pipeline from the raw user and session files to the
//! processed and encoded checkpoints.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wayfare::{PipelineConfig, run};

#[derive(Parser)]
#[command(name = "wayfare")]
#[command(about = "Wayfare: user and session feature pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding train_users.csv, test_users.csv and sessions.csv
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Directory the checkpoint files are written to
    #[arg(long)]
    processed_dir: Option<PathBuf>,

    /// Aggregation workers (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = PipelineConfig::default();
    if let Some(dir) = cli.raw_dir {
        config.raw_dir = dir;
    }
    if let Some(dir) = cli.processed_dir {
        config.processed_dir = dir;
    }
    config.threads = cli.threads;

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▓░"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let report = run(&config, Some(&pb))?;
    pb.finish_and_clear();

    for manifest in [&report.processed, &report.encoded] {
        info!(
            stage = %manifest.stage,
            train = ?(manifest.train_rows, manifest.train_columns.len()),
            test = ?(manifest.test_rows, manifest.test_columns.len()),
            "table shapes"
        );
    }
    println!(
        "Wrote {} users ({} with sessions) to {}",
        report.users,
        report.session_users,
        config.processed_dir.display()
    );
    Ok(())
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;
    Ok(())
}
