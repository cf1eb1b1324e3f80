//! Minimum variance portfolio
//!
//! Minimises ½ wᵗΣw subject to 𝟙ᵗw = 1. The Lagrangian gives
//!
//! w = Σ⁻¹𝟙 / (𝟙ᵗΣ⁻¹𝟙)
//!
//! There is no non-negativity constraint, so weights may be negative. Σ⁻¹𝟙 is
//! obtained from a Cholesky solve, never an explicit inverse.

use crate::allocator::Allocator;
use crate::error::{AllocationError, Result, check_covariance};
use cadiz_risk::linalg::{cholesky, condition_number, solve_with_cholesky};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Minimum variance configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MinimumVarianceConfig {
    /// Largest eigenvalue ratio accepted before the matrix is treated as
    /// singular (default: 1e12)
    pub max_condition_number: f64,
}

impl Default for MinimumVarianceConfig {
    fn default() -> Self {
        Self {
            max_condition_number: 1e12,
        }
    }
}

/// Closed-form minimum variance allocator
#[derive(Debug, Clone, Default)]
pub struct MinimumVariance {
    config: MinimumVarianceConfig,
}

impl MinimumVariance {
    /// Create a new minimum variance allocator
    pub const fn new(config: MinimumVarianceConfig) -> Self {
        Self { config }
    }

    /// Compute minimum variance weights
    ///
    /// # Errors
    /// * `InvalidDimension` for a non-square or empty matrix
    /// * `SingularCovariance` when Σ has no Cholesky factor or its condition
    ///   number exceeds `max_condition_number`
    pub fn weights(&self, covariance: &Array2<f64>) -> Result<Array1<f64>> {
        let n = check_covariance(covariance)?;

        let factor = cholesky(covariance).map_err(|_| AllocationError::SingularCovariance {
            condition_number: condition_number(covariance),
        })?;

        let cond = condition_number(covariance);
        if cond.is_nan() || cond > self.config.max_condition_number {
            return Err(AllocationError::SingularCovariance {
                condition_number: cond,
            });
        }

        let inv_ones = solve_with_cholesky(&factor, &Array1::ones(n))?;
        let denom = inv_ones.sum();
        if !denom.is_finite() || denom <= 0.0 {
            return Err(AllocationError::SingularCovariance {
                condition_number: cond,
            });
        }

        Ok(inv_ones / denom)
    }
}

impl Allocator for MinimumVariance {
    fn name(&self) -> &'static str {
        "min_variance"
    }

    fn allocate(&self, covariance: &Array2<f64>) -> Result<Array1<f64>> {
        self.weights(covariance)
    }
}

/// Minimum variance weights with the default conditioning threshold
pub fn min_variance_weights(covariance: &Array2<f64>) -> Result<Array1<f64>> {
    MinimumVariance::default().weights(covariance)
}
