//! Loading an aligned return history from CSV.
//!
//! Expected layout: a header row `date,<asset>,<asset>,...` followed by one
//! row per period with an ISO date and one already-computed return per asset.

use cadiz::backtest::{BacktestError, ReturnMatrix};
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading returns.
#[derive(Debug, Error)]
pub(crate) enum InputError {
    /// CSV could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header has no asset columns.
    #[error("Header must be `date,<asset>,...` with at least one asset")]
    MissingAssets,

    /// Unparseable date.
    #[error("Line {line}: invalid date '{value}'")]
    Date {
        /// 1-based line number
        line: u64,
        /// Raw field
        value: String,
    },

    /// Unparseable or missing return.
    #[error("Line {line}: invalid return '{value}' for {asset}")]
    Value {
        /// 1-based line number
        line: u64,
        /// Column name
        asset: String,
        /// Raw field
        value: String,
    },

    /// Parsed data violates the return matrix invariants.
    #[error(transparent)]
    Returns(#[from] BacktestError),
}

/// Read a return CSV from disk.
pub(crate) fn load_returns(path: &Path) -> Result<ReturnMatrix, InputError> {
    let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    parse_returns(reader)
}

/// Parse a return CSV from any reader.
pub(crate) fn parse_returns<R: Read>(mut reader: csv::Reader<R>) -> Result<ReturnMatrix, InputError> {
    let assets: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();
    if assets.is_empty() {
        return Err(InputError::MissingAssets);
    }

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| InputError::Date {
            line,
            value: raw_date.to_string(),
        })?;

        let row = assets
            .iter()
            .enumerate()
            .map(|(i, asset)| {
                let raw = record.get(i + 1).unwrap_or_default();
                raw.parse::<f64>().map_err(|_| InputError::Value {
                    line,
                    asset: asset.clone(),
                    value: raw.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        dates.push(date);
        rows.push(row);
    }

    Ok(ReturnMatrix::from_rows(dates, assets, rows)?)
}
