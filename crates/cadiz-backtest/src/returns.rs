//! Date-indexed matrix of per-asset period returns

use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, s};
use std::collections::HashSet;

/// Aligned return history: one row per period, one column per asset
///
/// Construction validates the invariants the backtester relies on: dates
/// strictly increasing, one date per row, one unique name per column, at
/// least one asset, and no missing or non-finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Build from a T×N array of returns
    ///
    /// # Errors
    /// `InvalidReturns` when any of the invariants above is violated.
    pub fn new(dates: Vec<NaiveDate>, assets: Vec<String>, values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if dates.len() != rows {
            return Err(BacktestError::InvalidReturns(format!(
                "{} dates for {rows} rows",
                dates.len()
            )));
        }
        if assets.len() != cols {
            return Err(BacktestError::InvalidReturns(format!(
                "{} asset names for {cols} columns",
                assets.len()
            )));
        }
        if cols == 0 {
            return Err(BacktestError::InvalidReturns("no assets".to_string()));
        }

        let mut seen = HashSet::with_capacity(cols);
        if let Some(dup) = assets.iter().find(|a| !seen.insert(a.as_str())) {
            return Err(BacktestError::InvalidReturns(format!(
                "duplicate asset '{dup}'"
            )));
        }

        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(BacktestError::InvalidReturns(format!(
                "dates must be strictly increasing, {} is followed by {}",
                w[0], w[1]
            )));
        }

        if let Some(((row, col), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(BacktestError::InvalidReturns(format!(
                "{v} at {} for '{}'",
                dates[row], assets[col]
            )));
        }

        Ok(Self {
            dates,
            assets,
            values,
        })
    }

    /// Build from row vectors
    ///
    /// # Errors
    /// `InvalidReturns` when rows are ragged or [`ReturnMatrix::new`] rejects
    /// the result.
    pub fn from_rows(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let n_assets = assets.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_assets) {
            return Err(BacktestError::InvalidReturns(format!(
                "row {i} has {} values, expected {n_assets}",
                row.len()
            )));
        }
        let n_rows = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n_rows, n_assets), flat)
            .map_err(|e| BacktestError::InvalidReturns(e.to_string()))?;
        Self::new(dates, assets, values)
    }

    /// Number of periods T
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when there are no periods
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of assets N
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Period labels
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset names in column order
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Full T×N return array
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Returns of every asset in period `index`
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Rows `start..end`
    pub fn window(&self, start: usize, end: usize) -> ArrayView2<'_, f64> {
        self.values.slice(s![start..end, ..])
    }
}
