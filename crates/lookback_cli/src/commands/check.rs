//! Check command implementation
//!
//! Validates a run file and prints the resolved settings without pricing.

use std::io::Write;
use tracing::info;

use crate::config::{OracleKind, RunConfig};
use crate::output::OutputFormat;
use crate::Result;

/// Run the check command
pub fn run<W: Write>(config: &RunConfig, format: OutputFormat, out: &mut W) -> Result<()> {
    let request = config.to_request()?;
    info!("Configuration is valid");

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, config)?;
            writeln!(out)?;
        }
        OutputFormat::Table | OutputFormat::Csv => {
            let maturities = request.grid.maturities();
            let first = maturities.first().copied().unwrap_or_default();
            let last = maturities.last().copied().unwrap_or_default();
            let market = &config.market;

            writeln!(out, "Configuration OK")?;
            writeln!(
                out,
                "  market     : S={} σ={} r={} q={}",
                market.spot, market.volatility, market.rate, market.dividend
            )?;
            writeln!(
                out,
                "  option     : {:?} K={}",
                config.option.kind, config.option.strike
            )?;
            writeln!(
                out,
                "  grid       : {} steps, τ ∈ [{:.6}, {:.6}]",
                request.grid.len(),
                first,
                last
            )?;
            for (step, over) in request.overrides.iter() {
                writeln!(
                    out,
                    "  override   : day {} -> {:?}",
                    step + 1,
                    over.apply(market)
                )?;
            }
            writeln!(
                out,
                "  oracle     : {} (resolution {})",
                config.oracle.kind, config.oracle.resolution
            )?;
            match config.oracle.kind {
                OracleKind::Sampling => writeln!(
                    out,
                    "  budget     : {} paths, {} steps, alpha {}",
                    config.oracle.n_paths, config.oracle.n_steps, config.oracle.alpha
                )?,
                OracleKind::ResolutionBounded => writeln!(
                    out,
                    "  budget     : epsilon {}, {} shots, {} rounds max, alpha {}",
                    config.oracle.epsilon,
                    config.oracle.shots,
                    config.oracle.max_iterations,
                    config.oracle.alpha
                )?,
                OracleKind::Analytic => {}
            }
            writeln!(
                out,
                "  scan       : seed {} ({:?}), {}, {}",
                config.scan.seed,
                config.scan.seed_scheme,
                config.scan.failure_policy,
                if config.scan.parallel { "parallel" } else { "sequential" }
            )?;
            writeln!(out, "  log level  : {}", config.log_level)?;
        }
    }
    Ok(())
}
