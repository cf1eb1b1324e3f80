//! Exponentially Weighted Moving Average (EWMA) Covariance Estimator
//!
//! Row t of a window with T rows receives weight λ^(T-1-t), normalised so
//! the weights sum to one. The most recent period therefore carries the
//! largest weight:
//!
//! Σ = Σ_t w_t (r_t - μ)(r_t - μ)^T,  μ = Σ_t w_t r_t
//!
//! λ is typically 0.94 - 0.97 for daily data.

use super::{CovarianceError, CovarianceEstimator, validate_window};
use crate::linalg::symmetrize;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// EWMA covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EwmaConfig {
    /// Decay factor λ in (0, 1) (default: 0.94)
    pub decay: f64,

    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,
}

impl Default for EwmaConfig {
    fn default() -> Self {
        Self {
            decay: 0.94,
            min_observations: 2,
        }
    }
}

/// EWMA covariance estimator
#[derive(Debug, Clone)]
pub struct EwmaCovarianceEstimator {
    config: EwmaConfig,
}

impl EwmaCovarianceEstimator {
    /// Create a new EWMA estimator with the given configuration
    pub fn new(config: EwmaConfig) -> Result<Self, CovarianceError> {
        if !(config.decay > 0.0 && config.decay < 1.0) {
            return Err(CovarianceError::InvalidDecay(config.decay));
        }
        Ok(Self { config })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not happen).
    pub fn try_default() -> Result<Self, CovarianceError> {
        Self::new(EwmaConfig::default())
    }

    /// Half-life of the weighting scheme in periods: ln(0.5) / ln(λ)
    pub fn half_life(&self) -> f64 {
        0.5_f64.ln() / self.config.decay.ln()
    }

    /// Normalised observation weights, oldest first
    fn weights(&self, n_periods: usize) -> Array1<f64> {
        let lambda = self.config.decay;
        let raw = Array1::from_shape_fn(n_periods, |t| lambda.powi((n_periods - 1 - t) as i32));
        let total = raw.sum();
        raw / total
    }
}

impl CovarianceEstimator for EwmaCovarianceEstimator {
    fn estimate(&self, returns: ArrayView2<'_, f64>) -> Result<Array2<f64>, CovarianceError> {
        validate_window(returns, self.config.min_observations)?;
        let n_periods = returns.nrows();

        let weights = self.weights(n_periods);
        let means = returns.t().dot(&weights);
        let centered = &returns - &means.insert_axis(Axis(0));

        // Scale each row by its weight before forming X^T W X
        let weighted = &centered * &weights.view().insert_axis(Axis(1));
        let cov = weighted.t().dot(&centered);

        Ok(symmetrize(&cov))
    }

    fn min_observations(&self) -> usize {
        self.config.min_observations.max(2)
    }
}
