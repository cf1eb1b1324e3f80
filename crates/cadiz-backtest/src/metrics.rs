//! Performance statistics for a strategy's realised returns.

use serde::{Deserialize, Serialize};

/// Summary of a period-return series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Number of observed periods
    pub periods: usize,
    /// Compounded return over the whole series
    pub total_return: f64,
    /// Geometric return per year
    pub annualized_return: f64,
    /// Sample standard deviation scaled by √(periods per year)
    pub annualized_volatility: f64,
    /// Annualised mean over annualised volatility, zero risk-free rate
    pub sharpe_ratio: Option<f64>,
    /// Largest peak-to-trough loss of the compounded equity curve, as a
    /// positive fraction
    pub max_drawdown: f64,
}

impl PerformanceSummary {
    /// Compute the summary of `returns` sampled `periods_per_year` times a year
    ///
    /// An empty series gives zeros throughout. The Sharpe ratio is `None` with
    /// fewer than two periods or zero volatility.
    pub fn from_returns(returns: &[f64], periods_per_year: f64) -> Self {
        let periods = returns.len();
        if periods == 0 {
            return Self {
                periods,
                total_return: 0.0,
                annualized_return: 0.0,
                annualized_volatility: 0.0,
                sharpe_ratio: None,
                max_drawdown: 0.0,
            };
        }

        let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
        let total_return = growth - 1.0;
        let annualized_return = if growth > 0.0 {
            growth.powf(periods_per_year / periods as f64) - 1.0
        } else {
            -1.0
        };

        let mean = returns.iter().sum::<f64>() / periods as f64;
        let std = if periods > 1 {
            let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
                / (periods - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };
        let scale = periods_per_year.sqrt();
        let sharpe_ratio = (std > 0.0).then(|| mean / std * scale);

        Self {
            periods,
            total_return,
            annualized_return,
            annualized_volatility: std * scale,
            sharpe_ratio,
            max_drawdown: max_drawdown(returns),
        }
    }
}

/// Maximum drawdown of the equity curve Π(1 + rₜ) starting from 1
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut equity = 1.0;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        peak = peak.max(equity);
        worst = worst.max(1.0 - equity / peak);
    }
    worst
}
