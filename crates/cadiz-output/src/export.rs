//! Export functionality for backtest results.
//!
//! This module provides CSV and JSON export of weight history, realised
//! returns and performance summaries, in long format so every strategy fits
//! one file.

use cadiz_backtest::{BacktestRecord, BacktestReport, PerformanceSummary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested strategy is not in the report.
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize rows as CSV with a header, or as a JSON array.
fn export_rows<T: Serialize>(rows: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for row in rows {
                wtr.serialize(row)?;
            }
            let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
            String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
        }
        ExportFormat::Json => Ok(serde_json::to_string(rows)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(rows)?),
    }
}

fn record<'a>(report: &'a BacktestReport, name: &str) -> Result<&'a BacktestRecord, ExportError> {
    report
        .get(name)
        .ok_or_else(|| ExportError::UnknownStrategy(name.to_string()))
}

/// One asset's weight chosen by one strategy at one rebalance date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightRow {
    /// Strategy name.
    pub strategy: String,

    /// Rebalance date.
    pub date: NaiveDate,

    /// Asset name.
    pub asset: String,

    /// Weight, empty when the strategy failed at this date.
    pub weight: Option<f64>,

    /// Failure message.
    pub error: Option<String>,
}

/// Weight history in long format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightHistoryExport {
    /// Rows ordered by strategy, date, asset.
    pub rows: Vec<WeightRow>,
}

impl WeightHistoryExport {
    /// Weight history of every strategy in the report.
    pub fn from_report(report: &BacktestReport) -> Self {
        Self::build(report, report.strategies.values())
    }

    /// Weight history of a single strategy.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStrategy` when `strategy` is not in the report.
    pub fn for_strategy(report: &BacktestReport, strategy: &str) -> Result<Self, ExportError> {
        Ok(Self::build(report, [record(report, strategy)?]))
    }

    fn build<'a>(
        report: &BacktestReport,
        records: impl IntoIterator<Item = &'a BacktestRecord>,
    ) -> Self {
        let mut rows = Vec::new();
        for record in records {
            for snapshot in &record.weight_history {
                for (i, asset) in report.assets.iter().enumerate() {
                    rows.push(WeightRow {
                        strategy: record.name.clone(),
                        date: snapshot.date,
                        asset: asset.clone(),
                        weight: snapshot.weights.as_ref().and_then(|w| w.get(i).copied()),
                        error: snapshot.error.clone(),
                    });
                }
            }
        }
        Self { rows }
    }
}

impl Exporter for WeightHistoryExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_rows(&self.rows, format)
    }
}

/// Realised return of one strategy in one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnRow {
    /// Strategy name.
    pub strategy: String,

    /// Period date.
    pub date: NaiveDate,

    /// Period return, empty inside a failed block.
    pub period_return: Option<f64>,

    /// Compounded return to date.
    pub cumulative_return: f64,
}

/// Period and cumulative returns in long format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnsExport {
    /// Rows ordered by strategy, date.
    pub rows: Vec<ReturnRow>,
}

impl ReturnsExport {
    /// Returns of every strategy in the report.
    pub fn from_report(report: &BacktestReport) -> Self {
        Self::build(report.strategies.values())
    }

    /// Returns of a single strategy.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStrategy` when `strategy` is not in the report.
    pub fn for_strategy(report: &BacktestReport, strategy: &str) -> Result<Self, ExportError> {
        Ok(Self::build([record(report, strategy)?]))
    }

    fn build<'a>(records: impl IntoIterator<Item = &'a BacktestRecord>) -> Self {
        let rows = records
            .into_iter()
            .flat_map(|record| {
                record
                    .dates
                    .iter()
                    .zip(&record.period_returns)
                    .zip(&record.cumulative_returns)
                    .map(|((date, period_return), cumulative_return)| ReturnRow {
                        strategy: record.name.clone(),
                        date: *date,
                        period_return: *period_return,
                        cumulative_return: *cumulative_return,
                    })
            })
            .collect();
        Self { rows }
    }
}

impl Exporter for ReturnsExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_rows(&self.rows, format)
    }
}

/// Performance summary of one strategy, flattened for CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    /// Strategy name.
    pub strategy: String,

    /// Observed periods.
    pub periods: usize,

    /// Periods missing because the strategy failed.
    pub missing_periods: usize,

    /// Compounded total return.
    pub total_return: f64,

    /// Geometric annualised return.
    pub annualized_return: f64,

    /// Annualised volatility.
    pub annualized_volatility: f64,

    /// Sharpe ratio, empty when undefined.
    pub sharpe_ratio: Option<f64>,

    /// Maximum drawdown.
    pub max_drawdown: f64,
}

impl SummaryRow {
    /// Flatten a summary.
    pub fn new(strategy: String, missing_periods: usize, summary: &PerformanceSummary) -> Self {
        Self {
            strategy,
            periods: summary.periods,
            missing_periods,
            total_return: summary.total_return,
            annualized_return: summary.annualized_return,
            annualized_volatility: summary.annualized_volatility,
            sharpe_ratio: summary.sharpe_ratio,
            max_drawdown: summary.max_drawdown,
        }
    }
}

/// Performance summary of every strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryExport {
    /// One row per strategy, by name.
    pub rows: Vec<SummaryRow>,
}

impl SummaryExport {
    /// Summarise every strategy in the report.
    pub fn from_report(report: &BacktestReport, periods_per_year: f64) -> Self {
        let rows = report
            .strategies
            .values()
            .map(|record| {
                SummaryRow::new(
                    record.name.clone(),
                    record.missing_periods(),
                    &record.summary(periods_per_year),
                )
            })
            .collect();
        Self { rows }
    }
}

impl Exporter for SummaryExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_rows(&self.rows, format)
    }
}

/// Write `weights`, `returns` and `summary` files for a report into `dir`.
///
/// The directory is created if missing. Returns the written paths.
///
/// # Errors
///
/// Returns an error if serialization or file writing fails.
pub fn export_report(
    report: &BacktestReport,
    dir: &Path,
    format: ExportFormat,
    periods_per_year: f64,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = |stem: &str| dir.join(format!("{stem}.{}", format.extension()));

    let weights = path("weights");
    WeightHistoryExport::from_report(report).export_to_file(&weights, format)?;
    let returns = path("returns");
    ReturnsExport::from_report(report).export_to_file(&returns, format)?;
    let summary = path("summary");
    SummaryExport::from_report(report, periods_per_year).export_to_file(&summary, format)?;

    Ok(vec![weights, returns, summary])
}
