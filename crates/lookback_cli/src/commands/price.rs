//! Price command implementation
//!
//! Runs the full scan and prints the selected lookback value.

use std::io::Write;
use tracing::info;

use crate::config::RunConfig;
use crate::output::{write_estimate, OutputFormat};
use crate::Result;

/// Run the price command
pub fn run<W: Write>(config: &RunConfig, format: OutputFormat, out: &mut W) -> Result<()> {
    let request = config.to_request()?;
    info!(
        oracle = %config.oracle.kind,
        steps = request.grid.len(),
        overrides = request.overrides.len(),
        seed = config.scan.seed,
        "Starting lookback pricing"
    );

    let report = lookback_engine::price_lookback(&request)?;
    write_estimate(out, &report, format)?;

    info!("Pricing complete");
    Ok(())
}
