//! Shared-bus simulator CLI.
//!
//! This binary runs a complete bus system and reports what happened. It performs:
//! 1. **Setup:** Load a JSON configuration, or use the built-in test bench.
//! 2. **Run:** Step masters and bus for the requested number of ticks.
//! 3. **Report:** Print bus statistics as text or JSON.

mod stats;

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use simbus_core::Config;
use simbus_core::Simulator;
use simbus_core::common::SimError;

use crate::stats::StatsCollector;

#[derive(Parser, Debug)]
#[command(
    name = "simbus",
    author,
    version,
    about = "Shared bus simulator with prioritized, lockable arbitration",
    long_about = "Run a bus system with several masters and memory slaves.\n\nWithout --config the reference test bench is used: a fast and a slow memory, a blocking burst master, a non-blocking master and a direct debug master.\n\nExamples:\n  simbus\n  simbus --ticks 2000 --verbose\n  simbus --config system.json --json"
)]
struct Cli {
    /// JSON configuration file (defaults to the built-in test bench).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticks to simulate (overrides `bus.max_ticks`).
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Log every submission, arbitration and completion.
    #[arg(short, long)]
    verbose: bool,

    /// Print statistics as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("[!] simulation failed: {e}");
        process::exit(1);
    }
}

/// Installs the log subscriber; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Builds the system, runs it and prints the report.
///
/// # Arguments
///
/// * `cli` - Parsed command line.
///
/// # Errors
///
/// Configuration errors, or the first bus contract violation.
fn run(cli: &Cli) -> Result<(), SimError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let ticks = cli.ticks.unwrap_or(config.bus.max_ticks);

    let mut sim = Simulator::from_config(&config)?;
    let collector = StatsCollector::new();
    sim.bus.set_observer(Box::new(collector.clone()));

    if !cli.json {
        println!(
            "[*] {} slaves, {} masters, {} ticks",
            sim.bus.directory().len(),
            sim.master_count(),
            ticks
        );
    }
    sim.run(ticks)?;

    let stats = collector.snapshot();
    if cli.json {
        match serde_json::to_string_pretty(&stats) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("[!] cannot encode statistics: {e}"),
        }
    } else {
        stats.print();
    }
    Ok(())
}
