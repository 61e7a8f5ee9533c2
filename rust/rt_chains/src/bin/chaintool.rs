//! chaintool — Inspect chain-generation rules, benchmark catalogs and results.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rt_chains::rules::SEED_ENV;
use rt_chains::{read_traces, Benchmarks, Rules, SystemKey};

/// Inspect chain-generation rules, benchmark catalogs and results files.
#[derive(Parser)]
#[command(name = "chaintool")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes
    /// precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate a rules document.
    Rules {
        path: PathBuf,

        /// Override the random seed. Falls back to RT_CHAINS_SEED.
        #[arg(long, env = SEED_ENV)]
        seed: Option<i64>,
    },
    /// List the benchmarks of a catalog.
    Catalog { path: PathBuf },
    /// Parse a results file and check its traces.
    Traces {
        path: PathBuf,

        /// Fail if any trace violates BCRT <= ACRT <= WCRT.
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Rules { path, seed } => show_rules(path, *seed),
        Command::Catalog { path } => show_catalog(path),
        Command::Traces { path, strict } => check_traces(path, *strict),
    }
}

fn show_rules(path: &Path, seed: Option<i64>) -> Result<()> {
    let mut rules = Rules::load(path)?;

    if let Some(seed) = seed {
        info!(seed, "overriding seed (--seed or {SEED_ENV})");
        rules = rules.with_seed(seed);
    }

    println!("name:              {}", rules.name());
    println!("directory:         {}", rules.directory().display());
    println!(
        "chains:            {} (avg len {}, variance {})",
        rules.chain_count(),
        rules.chain_avg_len(),
        rules.chain_variance()
    );
    println!(
        "merge/sync p:      {} / {}",
        rules.chain_merge_p(),
        rules.chain_sync_p()
    );
    println!("utilisation:       {}", rules.util_total());
    println!(
        "periods:           {}..={}us step {}us",
        rules.min_period_us(),
        rules.max_period_us(),
        rules.period_step_us()
    );
    println!("horizon:           {}us", rules.simulation_horizon_us());
    println!(
        "executors:         {} (ppe {})",
        rules.executor_count(),
        rules.ppe()
    );
    println!("seed:              {}", rules.random_seed());
    println!("logging:           {:?}", rules.logging_mode());
    Ok(())
}

fn show_catalog(path: &Path) -> Result<()> {
    let catalog = Benchmarks::load(path)?;
    for b in &catalog {
        println!("{} {}", b.name, b.execution_time_us);
    }
    Ok(())
}

fn check_traces(path: &Path, strict: bool) -> Result<()> {
    let traces = read_traces(path)?;
    let systems: BTreeSet<SystemKey> = traces.iter().map(|t| t.system_params().key()).collect();
    let violations: Vec<i64> = traces
        .iter()
        .filter(|t| !t.response_times_ordered())
        .map(|t| t.id)
        .collect();

    println!(
        "{} traces from {} systems, {} with unordered response times",
        traces.len(),
        systems.len(),
        violations.len()
    );

    if strict && !violations.is_empty() {
        bail!(
            "{}: traces with BCRT <= ACRT <= WCRT violated: {:?}",
            path.display(),
            violations
        );
    }
    Ok(())
}
