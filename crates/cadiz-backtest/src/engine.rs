//! Walk-forward backtest engine
//!
//! At each rebalance row t with at least L earlier rows, the covariance of
//! rows [t-L, t-1] is estimated once and handed to every strategy. The
//! resulting weights are held unchanged until the next rebalance row. Blocks
//! that start before row L are left out of the backtest entirely.
//!
//! A strategy failing at one date leaves a gap in its own record and nothing
//! else; the run carries on.

use crate::error::{BacktestError, Result};
use crate::report::{BacktestRecord, BacktestReport};
use crate::returns::ReturnMatrix;
use crate::schedule::RebalanceRule;
use crate::strategy::Strategy;
use cadiz_risk::{CovarianceEstimator, SampleCovarianceEstimator};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Walk-forward configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Trailing window length L in periods (default: 60)
    pub window_length: usize,
    /// When weights are recomputed (default: monthly)
    pub rebalance: RebalanceRule,
    /// Sampling frequency used to annualise statistics (default: 252)
    pub periods_per_year: f64,
    /// Evaluate rebalance dates on the rayon thread pool (default: false)
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window_length: 60,
            rebalance: RebalanceRule::Monthly,
            periods_per_year: 252.0,
            parallel: false,
        }
    }
}

/// Weights or failure message of one strategy at one date
type Allocation = std::result::Result<Vec<f64>, String>;

/// Walk-forward backtester generic over the covariance estimator
#[derive(Debug, Clone)]
pub struct WalkForwardBacktester<E> {
    estimator: E,
    config: BacktestConfig,
}

impl<E: CovarianceEstimator + Sync> WalkForwardBacktester<E> {
    /// Create a backtester
    pub const fn new(estimator: E, config: BacktestConfig) -> Self {
        Self { estimator, config }
    }

    /// Backtest configuration
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Covariance estimator
    pub const fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Covariance of the L rows preceding `row`
    ///
    /// # Errors
    /// * `InsufficientHistory` when fewer than L rows precede `row`
    /// * `Covariance` when the estimator rejects the window
    pub fn covariance_at(&self, returns: &ReturnMatrix, row: usize) -> Result<Array2<f64>> {
        let length = self.config.window_length;
        if row < length || row > returns.len() {
            return Err(BacktestError::InsufficientHistory {
                row,
                window_length: length,
            });
        }
        Ok(self.estimator.estimate(returns.window(row - length, row))?)
    }

    /// Run every strategy over `returns`
    ///
    /// # Errors
    /// * `NoStrategies` / `DuplicateStrategy` for an unusable strategy list
    /// * `InvalidWindow` when L is shorter than the estimator's minimum
    /// * `InvalidRebalance` for an unusable rebalance rule
    ///
    /// Per-date failures of a strategy never surface here.
    pub fn run(&self, returns: &ReturnMatrix, strategies: &[Strategy]) -> Result<BacktestReport> {
        check_strategies(strategies)?;

        let min_observations = self.estimator.min_observations().max(2);
        if self.config.window_length < min_observations {
            return Err(BacktestError::InvalidWindow {
                window_length: self.config.window_length,
                min_observations,
            });
        }

        let blocks = self.blocks(returns)?;
        info!(
            rebalances = blocks.len(),
            strategies = strategies.len(),
            window = self.config.window_length,
            rebalance = %self.config.rebalance,
            "running walk-forward backtest"
        );

        let outcomes: Vec<Vec<Allocation>> = if self.config.parallel {
            blocks
                .par_iter()
                .map(|block| self.evaluate(returns, block.start, strategies))
                .collect()
        } else {
            blocks
                .iter()
                .map(|block| self.evaluate(returns, block.start, strategies))
                .collect()
        };

        let mut records: Vec<BacktestRecord> = strategies
            .iter()
            .map(|s| BacktestRecord::new(s.name()))
            .collect();
        for (block, allocations) in blocks.iter().zip(&outcomes) {
            for (record, allocation) in records.iter_mut().zip(allocations) {
                record.record_block(returns, block.clone(), allocation);
            }
        }

        Ok(BacktestReport {
            assets: returns.assets().to_vec(),
            strategies: records
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect::<BTreeMap<_, _>>(),
        })
    }

    /// Row ranges held at fixed weights, excluding those without a full window
    fn blocks(&self, returns: &ReturnMatrix) -> Result<Vec<Range<usize>>> {
        let points = self.config.rebalance.rebalance_points(returns.dates())?;
        let ends = points.iter().skip(1).copied().chain([returns.len()]);
        Ok(points
            .iter()
            .copied()
            .zip(ends)
            .filter(|(start, _)| *start >= self.config.window_length)
            .map(|(start, end)| start..end)
            .collect())
    }

    /// Weights of every strategy at rebalance row `row`
    fn evaluate(
        &self,
        returns: &ReturnMatrix,
        row: usize,
        strategies: &[Strategy],
    ) -> Vec<Allocation> {
        let date = returns.dates()[row];
        debug!(
            %date,
            window_start = %returns.dates()[row - self.config.window_length],
            window_end = %returns.dates()[row - 1],
            "rebalancing"
        );

        let covariance = match self.covariance_at(returns, row) {
            Ok(covariance) => covariance,
            Err(e) => {
                warn!(%date, error = %e, "covariance estimation failed, skipping all strategies");
                return vec![Err(e.to_string()); strategies.len()];
            }
        };

        strategies
            .iter()
            .map(|strategy| {
                let allocation = strategy
                    .allocator()
                    .allocate(&covariance)
                    .map_err(|e| e.to_string())
                    .and_then(|w| check_weights(w.to_vec(), returns.n_assets()));
                if let Err(e) = &allocation {
                    warn!(strategy = strategy.name(), %date, error = %e, "strategy failed");
                }
                allocation
            })
            .collect()
    }
}

fn check_strategies(strategies: &[Strategy]) -> Result<()> {
    if strategies.is_empty() {
        return Err(BacktestError::NoStrategies);
    }
    let mut seen = HashSet::with_capacity(strategies.len());
    for strategy in strategies {
        if !seen.insert(strategy.name()) {
            return Err(BacktestError::DuplicateStrategy(strategy.name().to_string()));
        }
    }
    Ok(())
}

fn check_weights(weights: Vec<f64>, n_assets: usize) -> Allocation {
    if weights.len() != n_assets {
        return Err(format!(
            "{} weights returned for {n_assets} assets",
            weights.len()
        ));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err("non-finite weight returned".to_string());
    }
    Ok(weights)
}

/// Walk-forward backtest with the sample covariance estimator
///
/// Rebalances every period; everything else uses the default configuration.
///
/// # Errors
/// See [`WalkForwardBacktester::run`].
pub fn walk_forward_backtest(
    returns: &ReturnMatrix,
    window_length: usize,
    strategies: &[Strategy],
) -> Result<BacktestReport> {
    let config = BacktestConfig {
        window_length,
        rebalance: RebalanceRule::EveryPeriod,
        ..Default::default()
    };
    WalkForwardBacktester::new(SampleCovarianceEstimator::default(), config).run(returns, strategies)
}
