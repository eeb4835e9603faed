//! Result rendering: table, JSON and CSV.

use crate::error::{CliError, Result};
use lookback_core::OptionKind;
use lookback_engine::scan::ScanEntry;
use lookback_engine::LookbackReport;
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Box-drawn table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// CSV with a header row.
    Csv,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CliError::InvalidArgument(format!(
                "Unknown format: {}. Supported: json, csv, table",
                other
            ))),
        }
    }
}

/// The reported `(value, interval, day)` triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateRow {
    /// One-based day of the maximum.
    pub day: usize,
    /// Maturity of that day in years.
    pub maturity: f64,
    /// Lookback value.
    pub value: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
    /// Option kind.
    pub kind: OptionKind,
    /// Oracle name.
    pub oracle: &'static str,
}

impl EstimateRow {
    /// Flattens a report's estimate.
    pub fn from_report(report: &LookbackReport) -> Self {
        let estimate = &report.estimate;
        Self {
            day: estimate.day,
            maturity: estimate.maturity,
            value: estimate.value,
            lower: estimate.confidence_interval.lower,
            upper: estimate.confidence_interval.upper,
            kind: estimate.kind,
            oracle: report.oracle,
        }
    }
}

/// One scanned day. Pricing columns are empty for skipped days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRow {
    /// One-based day.
    pub day: usize,
    /// Maturity in years.
    pub maturity: f64,
    /// Effective volatility after overrides.
    pub volatility: f64,
    /// `priced` or `skipped`.
    pub status: &'static str,
    /// Discounted expected payoff.
    pub estimate: Option<f64>,
    /// Lower interval bound.
    pub lower: Option<f64>,
    /// Upper interval bound.
    pub upper: Option<f64>,
    /// Samples or shots spent.
    pub evaluations: Option<u64>,
    /// Skip reason.
    pub error: Option<String>,
}

impl StepRow {
    /// Flattens one scan entry.
    pub fn from_entry(entry: &ScanEntry) -> Self {
        let result = entry.result();
        Self {
            day: entry.day,
            maturity: entry.maturity,
            volatility: entry.market.volatility,
            status: if entry.is_priced() { "priced" } else { "skipped" },
            estimate: result.map(|r| r.expected_payoff),
            lower: result.map(|r| r.confidence_interval.lower),
            upper: result.map(|r| r.confidence_interval.upper),
            evaluations: result.map(|r| r.evaluations),
            error: entry.error().map(|e| e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ScanDocument<'a> {
    selected: &'a EstimateRow,
    steps: &'a [StepRow],
}

/// Writes the selected estimate.
pub fn write_estimate<W: Write>(
    out: &mut W,
    report: &LookbackReport,
    format: OutputFormat,
) -> Result<()> {
    let row = EstimateRow::from_report(report);
    match format {
        OutputFormat::Table => {
            writeln!(out, "┌────────┬────────────┬──────────────────────────┬───────────┐")?;
            writeln!(out, "│ Day    │ Value      │ Interval                 │ Oracle    │")?;
            writeln!(out, "├────────┼────────────┼──────────────────────────┼───────────┤")?;
            writeln!(
                out,
                "│ {:<6} │ {:<10.6} │ [{:<10.6}, {:<10.6}] │ {:<9} │",
                row.day, row.value, row.lower, row.upper, short_name(row.oracle)
            )?;
            writeln!(out, "└────────┴────────────┴──────────────────────────┴───────────┘")?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &row)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            writer.serialize(&row)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Writes every scanned day, marking the selected one.
pub fn write_scan<W: Write>(
    out: &mut W,
    report: &LookbackReport,
    format: OutputFormat,
) -> Result<()> {
    let selected = EstimateRow::from_report(report);
    let rows: Vec<StepRow> = report.scan.entries().iter().map(StepRow::from_entry).collect();

    match format {
        OutputFormat::Table => {
            writeln!(out, "┌──────┬──────────┬────────┬────────────┬──────────────────────────┬─────────┐")?;
            writeln!(out, "│ Day  │ Maturity │ Vol    │ Estimate   │ Interval                 │ Status  │")?;
            writeln!(out, "├──────┼──────────┼────────┼────────────┼──────────────────────────┼─────────┤")?;
            for row in &rows {
                let marker = if row.day == selected.day { '*' } else { ' ' };
                match (row.estimate, row.lower, row.upper) {
                    (Some(estimate), Some(lower), Some(upper)) => writeln!(
                        out,
                        "│ {:<4}{}│ {:<8.5} │ {:<6.3} │ {:<10.6} │ [{:<10.6}, {:<10.6}] │ {:<7} │",
                        row.day, marker, row.maturity, row.volatility, estimate, lower, upper, row.status
                    )?,
                    _ => writeln!(
                        out,
                        "│ {:<4} │ {:<8.5} │ {:<6.3} │ {:<10} │ {:<24} │ {:<7} │",
                        row.day, row.maturity, row.volatility, "-", "-", row.status
                    )?,
                }
            }
            writeln!(out, "└──────┴──────────┴────────┴────────────┴──────────────────────────┴─────────┘")?;
            writeln!(
                out,
                "* max {:.6} on day {} [{:.6}, {:.6}] ({})",
                selected.value, selected.day, selected.lower, selected.upper, selected.oracle
            )?;
        }
        OutputFormat::Json => {
            let document = ScanDocument {
                selected: &selected,
                steps: &rows,
            };
            serde_json::to_writer_pretty(&mut *out, &document)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn short_name(oracle: &str) -> &str {
    match oracle {
        "resolution-bounded" => "resolution",
        other => other,
    }
}
