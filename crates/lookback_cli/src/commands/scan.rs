//! Scan command implementation
//!
//! Prints every step of the scan alongside the selected day.

use std::io::Write;
use tracing::info;

use crate::config::RunConfig;
use crate::output::{write_scan, OutputFormat};
use crate::Result;

/// Run the scan command
pub fn run<W: Write>(config: &RunConfig, format: OutputFormat, out: &mut W) -> Result<()> {
    let request = config.to_request()?;
    info!(
        oracle = %config.oracle.kind,
        steps = request.grid.len(),
        policy = %config.scan.failure_policy,
        "Starting scan"
    );

    let report = lookback_engine::price_lookback(&request)?;
    let skipped = report.scan.skipped().count();
    if skipped > 0 {
        info!(skipped, "Some days were skipped");
    }
    write_scan(out, &report, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_lists_every_day() {
        let config = RunConfig::from_toml_str(
            r#"
            [market]
            spot = 2.0
            volatility = 0.4
            rate = 0.0

            [grid]
            days = 5

            [option]
            kind = "call"
            strike = 1.9

            [[overrides]]
            step = 1
            volatility = 0.9

            [oracle]
            kind = "analytic"
            "#,
        )
        .unwrap();

        let mut out = Vec::new();
        run(&config, OutputFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("2,"));
        assert!(lines[2].contains(",0.9,"));
    }
}
