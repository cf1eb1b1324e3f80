//! Backtest output: per-strategy return series and weight history

use crate::metrics::PerformanceSummary;
use crate::returns::ReturnMatrix;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Weights chosen by one strategy at one rebalance date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    /// Rebalance date (first period the weights apply to)
    pub date: NaiveDate,
    /// Weights in asset order, `None` when the strategy failed
    pub weights: Option<Vec<f64>>,
    /// Failure message when `weights` is `None`
    pub error: Option<String>,
}

/// Realised performance of one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    /// Strategy name
    pub name: String,
    /// Every backtested period
    pub dates: Vec<NaiveDate>,
    /// Portfolio return per period, `None` inside a failed block
    pub period_returns: Vec<Option<f64>>,
    /// Compounded return up to and including each period; missing periods
    /// count as zero return
    pub cumulative_returns: Vec<f64>,
    /// One snapshot per rebalance date
    pub weight_history: Vec<WeightSnapshot>,
}

impl BacktestRecord {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dates: Vec::new(),
            period_returns: Vec::new(),
            cumulative_returns: Vec::new(),
            weight_history: Vec::new(),
        }
    }

    /// Apply `allocation` unchanged to every row of `rows`
    pub(crate) fn record_block(
        &mut self,
        returns: &ReturnMatrix,
        rows: Range<usize>,
        allocation: &Result<Vec<f64>, String>,
    ) {
        let rebalance_date = returns.dates()[rows.start];
        let (weights, error) = match allocation {
            Ok(w) => (Some(w.clone()), None),
            Err(e) => (None, Some(e.clone())),
        };

        let mut cumulative = self.cumulative_returns.last().copied().unwrap_or(0.0);
        for row in rows {
            let period_return = weights.as_ref().map(|w| {
                w.iter()
                    .zip(returns.row(row).iter())
                    .map(|(wi, ri)| wi * ri)
                    .sum::<f64>()
            });
            if let Some(r) = period_return {
                cumulative = (1.0 + cumulative) * (1.0 + r) - 1.0;
            }
            self.dates.push(returns.dates()[row]);
            self.period_returns.push(period_return);
            self.cumulative_returns.push(cumulative);
        }

        self.weight_history.push(WeightSnapshot {
            date: rebalance_date,
            weights,
            error,
        });
    }

    /// Returns of the periods that have weights
    pub fn observed_returns(&self) -> Vec<f64> {
        self.period_returns.iter().flatten().copied().collect()
    }

    /// Periods with no return because the strategy failed
    pub fn missing_periods(&self) -> usize {
        self.period_returns.iter().filter(|r| r.is_none()).count()
    }

    /// Rebalance dates at which the strategy failed
    pub fn failures(&self) -> impl Iterator<Item = &WeightSnapshot> {
        self.weight_history.iter().filter(|s| s.weights.is_none())
    }

    /// Performance over the observed periods
    pub fn summary(&self, periods_per_year: f64) -> PerformanceSummary {
        PerformanceSummary::from_returns(&self.observed_returns(), periods_per_year)
    }
}

/// Result of a walk-forward run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Asset names, the order of every weight vector
    pub assets: Vec<String>,
    /// Records keyed by strategy name
    pub strategies: BTreeMap<String, BacktestRecord>,
}

impl BacktestReport {
    /// Record of one strategy
    pub fn get(&self, name: &str) -> Option<&BacktestRecord> {
        self.strategies.get(name)
    }

    /// Number of backtested periods (identical for every strategy)
    pub fn periods(&self) -> usize {
        self.strategies
            .values()
            .next()
            .map_or(0, |r| r.dates.len())
    }

    /// Performance summary of every strategy, by name
    pub fn summaries(&self, periods_per_year: f64) -> Vec<(String, PerformanceSummary)> {
        self.strategies
            .iter()
            .map(|(name, record)| (name.clone(), record.summary(periods_per_year)))
            .collect()
    }
}
