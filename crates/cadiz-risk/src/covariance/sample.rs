//! Unbiased sample covariance
//!
//! S = (1 / (T - 1)) * (X - x̄)^T (X - x̄)
//!
//! This is the estimator the walk-forward backtest uses by default.

use super::{CovarianceError, CovarianceEstimator, validate_window};
use crate::linalg::symmetrize;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Sample covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SampleCovarianceConfig {
    /// Minimum number of observations required (default: 2, never lower)
    pub min_observations: usize,
}

impl Default for SampleCovarianceConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
        }
    }
}

/// Unbiased sample covariance estimator
#[derive(Debug, Clone, Default)]
pub struct SampleCovarianceEstimator {
    config: SampleCovarianceConfig,
}

impl SampleCovarianceEstimator {
    /// Create a new sample estimator with the given configuration
    pub const fn new(config: SampleCovarianceConfig) -> Self {
        Self { config }
    }
}

impl CovarianceEstimator for SampleCovarianceEstimator {
    fn estimate(&self, returns: ArrayView2<'_, f64>) -> Result<Array2<f64>, CovarianceError> {
        validate_window(returns, self.config.min_observations)?;
        let n_periods = returns.nrows();

        let means = returns
            .mean_axis(Axis(0))
            .ok_or(CovarianceError::InsufficientData {
                required: 2,
                actual: n_periods,
            })?;
        let centered = &returns - &means.insert_axis(Axis(0));

        let cov = centered.t().dot(&centered) / (n_periods - 1) as f64;

        Ok(symmetrize(&cov))
    }

    fn min_observations(&self) -> usize {
        self.config.min_observations.max(2)
    }
}
