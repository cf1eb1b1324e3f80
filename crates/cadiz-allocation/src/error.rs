//! Error types for allocation.

use cadiz_risk::CovarianceError;
use thiserror::Error;

/// Result type for allocation operations.
pub type Result<T> = std::result::Result<T, AllocationError>;

/// Errors that can occur while computing portfolio weights.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// Vector or matrix sizes do not line up, or there are no assets
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    /// Covariance matrix cannot be inverted for minimum variance
    #[error("Covariance matrix is singular (condition number {condition_number:e})")]
    SingularCovariance {
        /// Estimated condition number (infinite when not invertible at all)
        condition_number: f64,
    },

    /// An asset has (near) zero variance, which breaks the per-asset quadratic
    #[error("Asset {index} has degenerate variance {variance:e}")]
    DegenerateAsset {
        /// Column of the offending asset
        index: usize,
        /// Its diagonal covariance entry
        variance: f64,
    },

    /// Covariance matrix holds a NaN or infinite entry
    #[error("Covariance entry ({row}, {col}) is not finite")]
    NonFiniteCovariance {
        /// Row of the first offending entry
        row: usize,
        /// Column of the first offending entry
        col: usize,
    },

    /// Malformed risk budget
    #[error("Invalid risk budget: {0}")]
    InvalidBudget(String),

    /// Covariance matrix rejected before risk-parity iteration
    #[error("Covariance matrix is not positive definite")]
    NotPositiveDefinite,

    /// Risk parity hit its iteration cap and the caller required convergence
    #[error("Risk parity did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged {
        /// Sweeps performed
        iterations: usize,
        /// Final max |xᵢ(Σx)ᵢ - bᵢ|
        residual: f64,
    },

    /// Underlying covariance / linear algebra error
    #[error("Covariance error: {0}")]
    Covariance(#[from] CovarianceError),
}

/// Check that `covariance` is square, finite and has at least one asset;
/// returns N.
pub(crate) fn check_covariance(covariance: &ndarray::Array2<f64>) -> Result<usize> {
    let (rows, cols) = covariance.dim();
    if rows != cols {
        return Err(AllocationError::InvalidDimension(format!(
            "covariance matrix must be square, got {rows}x{cols}"
        )));
    }
    if rows == 0 {
        return Err(AllocationError::InvalidDimension(
            "covariance matrix has no assets".to_string(),
        ));
    }
    if let Some(((row, col), _)) = covariance.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(AllocationError::NonFiniteCovariance { row, col });
    }
    Ok(rows)
}
