//! Lookback CLI - fixed-strike lookback pricing by time-grid scanning
//!
//! # Commands
//!
//! - `lookback price -c run.toml` - Print the lookback value, its interval and day
//! - `lookback scan -c run.toml` - Print every scanned day (`--sequential` forces
//!   one-at-a-time pricing even when the run file asks for parallel)
//! - `lookback check -c run.toml` - Validate a run file without pricing
//!
//! Settings resolve as CLI flags > `LOOKBACK_*` environment variables > run
//! file > defaults. `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use error::{CliError, Result};

use config::{build_config, CliOverrides, LogLevel, OracleKind};
use lookback_engine::FailurePolicy;
use output::OutputFormat;

/// Fixed-strike lookback pricing by per-day vanilla scanning
#[derive(Parser)]
#[command(name = "lookback")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run file path
    #[arg(short, long, global = true, default_value = "lookback.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Pricing oracle (sampling, resolution-bounded, analytic)
    #[arg(long)]
    oracle: Option<OracleKind>,

    /// Number of Monte Carlo paths
    #[arg(long)]
    paths: Option<usize>,

    /// Base seed
    #[arg(long)]
    seed: Option<u64>,

    /// Failure policy (fail-fast, skip)
    #[arg(long)]
    policy: Option<FailurePolicy>,

    /// Price days in parallel
    #[arg(long)]
    parallel: bool,

    /// Price days one after another, overriding the run file and environment
    #[arg(long, conflicts_with = "parallel")]
    sequential: bool,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Price the lookback and print the selected day
    Price(RunArgs),

    /// Price the lookback and print every scanned day
    Scan(RunArgs),

    /// Validate the run file and print the resolved settings
    Check {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            log_level: self.log_level,
            ..Default::default()
        };
        if let Commands::Price(args) | Commands::Scan(args) = &self.command {
            overrides.oracle = args.oracle;
            overrides.paths = args.paths;
            overrides.seed = args.seed;
            overrides.policy = args.policy;
            overrides.parallel = match (args.parallel, args.sequential) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
        }
        overrides
    }
}

fn init_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = build_config(&cli.config, &cli.overrides())
        .with_context(|| format!("loading run file {}", cli.config.display()))?;
    init_tracing(config.log_level);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Price(args) => commands::price::run(&config, args.format, &mut out),
        Commands::Scan(args) => commands::scan::run(&config, args.format, &mut out),
        Commands::Check { format } => commands::check::run(&config, *format, &mut out),
    }
    .context("lookback run failed")?;

    Ok(())
}
