//! Asset covariance estimation
//!
//! Turns a window of asset returns (rows are periods, columns are assets) into
//! an N x N covariance matrix. Every estimator here is a pure function of its
//! input window, so one estimator value can be shared across rebalance dates.

pub mod ewma;
pub mod ledoit_wolf;
pub mod sample;

pub use ewma::{EwmaConfig, EwmaCovarianceEstimator};
pub use ledoit_wolf::{LedoitWolfConfig, LedoitWolfEstimator, ShrinkageTarget};
pub use sample::{SampleCovarianceConfig, SampleCovarianceEstimator};

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Matrix is not positive definite
    #[error("Covariance matrix is not positive definite")]
    NotPositiveDefinite,

    /// Invalid decay parameter
    #[error("Invalid decay parameter: {0} (must be between 0 and 1)")]
    InvalidDecay(f64),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a time period and each column is an asset
    ///
    /// # Returns
    /// * Symmetric covariance matrix (N x N where N is the number of assets)
    fn estimate(&self, returns: ArrayView2<'_, f64>) -> Result<Array2<f64>, CovarianceError>;

    /// Minimum number of rows `estimate` accepts
    fn min_observations(&self) -> usize;
}

impl<E: CovarianceEstimator + ?Sized> CovarianceEstimator for Box<E> {
    fn estimate(&self, returns: ArrayView2<'_, f64>) -> Result<Array2<f64>, CovarianceError> {
        (**self).estimate(returns)
    }

    fn min_observations(&self) -> usize {
        (**self).min_observations()
    }
}

/// Shared input checks for every estimator: enough rows, at least one
/// column, and only finite values.
pub(crate) fn validate_window(
    returns: ArrayView2<'_, f64>,
    min_observations: usize,
) -> Result<(), CovarianceError> {
    let (n_periods, n_assets) = returns.dim();
    let required = min_observations.max(2);
    if n_periods < required {
        return Err(CovarianceError::InsufficientData {
            required,
            actual: n_periods,
        });
    }
    if n_assets == 0 {
        return Err(CovarianceError::InvalidParameter(
            "return window has no assets".to_string(),
        ));
    }
    if let Some(bad) = returns.iter().find(|v| !v.is_finite()) {
        return Err(CovarianceError::InvalidParameter(format!(
            "return window contains non-finite value {bad}"
        )));
    }
    Ok(())
}
