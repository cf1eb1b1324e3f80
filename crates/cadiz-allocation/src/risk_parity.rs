//! Risk parity (risk budgeting) solver
//!
//! Finds long-only weights whose risk contributions match a budget b. Work in
//! an unnormalised vector x and solve the coupled system
//!
//! xᵢ (Σx)ᵢ = bᵢ   for every i
//!
//! by cyclic coordinate descent (Gauss-Seidel). Writing zᵢ = (Σx)ᵢ - Σᵢᵢxᵢ for
//! the contribution of the other assets, equation i is the quadratic
//!
//! Σᵢᵢ xᵢ² + zᵢ xᵢ - bᵢ = 0
//!
//! whose non-negative root is (-zᵢ + √(zᵢ² + 4Σᵢᵢbᵢ)) / (2Σᵢᵢ). Σx is updated
//! right after each coordinate so the next coordinate sees the new value.
//! At a fixed point RCᵢ(w)/σ(w) = bᵢ for w = x / Σx.
//!
//! The positive root is only the right choice for a positive definite Σ and
//! a non-negative budget; both are checked before iterating.

use crate::allocator::Allocator;
use crate::budget::RiskBudget;
use crate::error::{AllocationError, Result, check_covariance};
use cadiz_risk::linalg::is_positive_definite;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Variances at or below this are treated as zero
const DEGENERATE_VARIANCE: f64 = 1e-14;

/// Risk parity solver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskParityConfig {
    /// Stop once max |xᵢ(Σx)ᵢ - bᵢ| falls below this (default: 1e-8)
    pub tolerance: f64,

    /// Maximum number of full sweeps (default: 100)
    pub max_iterations: usize,

    /// Allowed |Σb - 1| for caller-supplied budgets (default: 1e-6)
    pub budget_tolerance: f64,

    /// Reject non positive definite Σ before iterating (default: true)
    pub validate_positive_definite: bool,

    /// Make the `Allocator` impl fail instead of returning an unconverged
    /// iterate (default: false)
    pub require_convergence: bool,
}

impl Default for RiskParityConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
            budget_tolerance: RiskBudget::DEFAULT_TOLERANCE,
            validate_positive_definite: true,
            require_convergence: false,
        }
    }
}

/// Result of a risk parity solve
#[derive(Debug, Clone, PartialEq)]
pub struct RiskParitySolution {
    /// Long-only weights summing to 1
    pub weights: Array1<f64>,
    /// Whether the residual dropped below the tolerance
    pub converged: bool,
    /// Full sweeps performed
    pub iterations: usize,
    /// Final max |xᵢ(Σx)ᵢ - bᵢ|
    pub residual: f64,
}

/// Gauss-Seidel risk parity solver
#[derive(Debug, Clone, Default)]
pub struct RiskParitySolver {
    config: RiskParityConfig,
}

impl RiskParitySolver {
    /// Create a solver with the given configuration
    pub const fn new(config: RiskParityConfig) -> Self {
        Self { config }
    }

    /// Solver configuration
    pub const fn config(&self) -> &RiskParityConfig {
        &self.config
    }

    /// Solve for weights matching `budget` (uniform 1/N when `None`)
    ///
    /// Running out of sweeps is not an error: the last iterate is returned
    /// with `converged = false`. With `max_iterations = 0` the starting point
    /// is returned and `converged` reports whether it already meets the
    /// tolerance.
    ///
    /// # Errors
    /// * `InvalidDimension` for a non-square or empty matrix
    /// * `InvalidBudget` when the budget length differs from N
    /// * `DegenerateAsset` when some Σᵢᵢ is zero, negative or not finite
    /// * `NotPositiveDefinite` when validation is enabled and Σ fails it
    pub fn solve(
        &self,
        covariance: &Array2<f64>,
        budget: Option<&RiskBudget>,
    ) -> Result<RiskParitySolution> {
        let n = check_covariance(covariance)?;

        let budget = match budget {
            Some(b) if b.len() != n => {
                return Err(AllocationError::InvalidBudget(format!(
                    "budget has {} entries for {n} assets",
                    b.len()
                )));
            }
            Some(b) => b.as_array().clone(),
            None => RiskBudget::uniform(n)?.as_array().clone(),
        };

        for i in 0..n {
            let variance = covariance[[i, i]];
            if !variance.is_finite() || variance <= DEGENERATE_VARIANCE {
                return Err(AllocationError::DegenerateAsset { index: i, variance });
            }
        }

        if self.config.validate_positive_definite && !is_positive_definite(covariance) {
            return Err(AllocationError::NotPositiveDefinite);
        }

        // 𝟙ᵗΣ𝟙 > 0 for any positive definite Σ
        let total = covariance.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(AllocationError::NotPositiveDefinite);
        }

        let mut x = Array1::from_elem(n, 1.0 / total.sqrt());
        let mut sigma_x = covariance.dot(&x);
        let mut residual = budget_residual(&x, &sigma_x, &budget);
        let mut converged = residual < self.config.tolerance;
        let mut iterations = 0;

        for sweep in 1..=self.config.max_iterations {
            for i in 0..n {
                let variance = covariance[[i, i]];
                let z = sigma_x[i] - variance * x[i];
                let updated =
                    (-z + (z * z + 4.0 * variance * budget[i]).sqrt()) / (2.0 * variance);
                let step = updated - x[i];
                x[i] = updated;
                sigma_x.scaled_add(step, &covariance.column(i));
            }

            // Refresh Σx exactly so incremental updates never drift
            sigma_x = covariance.dot(&x);
            iterations = sweep;
            residual = budget_residual(&x, &sigma_x, &budget);
            converged = residual < self.config.tolerance;
            if converged {
                break;
            }
        }

        debug!(
            assets = n,
            iterations, residual, converged, "risk parity solve finished"
        );

        let weights = &x / x.sum();
        Ok(RiskParitySolution {
            weights,
            converged,
            iterations,
            residual,
        })
    }
}

/// max |xᵢ(Σx)ᵢ - bᵢ|
fn budget_residual(x: &Array1<f64>, sigma_x: &Array1<f64>, budget: &Array1<f64>) -> f64 {
    x.iter()
        .zip(sigma_x.iter())
        .zip(budget.iter())
        .map(|((xi, sxi), bi)| (xi * sxi - bi).abs())
        .fold(0.0, f64::max)
}

/// Risk parity weights for `covariance`
///
/// `budget` defaults to uniform 1/N; a supplied budget is validated with the
/// default sum tolerance.
pub fn risk_parity_weights(
    covariance: &Array2<f64>,
    budget: Option<&[f64]>,
    tolerance: f64,
    max_iterations: usize,
) -> Result<RiskParitySolution> {
    let config = RiskParityConfig {
        tolerance,
        max_iterations,
        ..Default::default()
    };
    let budget = budget
        .map(|b| RiskBudget::new(b.to_vec(), config.budget_tolerance))
        .transpose()?;
    RiskParitySolver::new(config).solve(covariance, budget.as_ref())
}

/// Risk parity allocator for the backtester
#[derive(Debug, Clone, Default)]
pub struct RiskParity {
    solver: RiskParitySolver,
    budget: Option<RiskBudget>,
}

impl RiskParity {
    /// Equal risk contribution allocator
    pub const fn new(config: RiskParityConfig) -> Self {
        Self {
            solver: RiskParitySolver::new(config),
            budget: None,
        }
    }

    /// Allocator targeting a fixed risk budget
    pub const fn with_budget(config: RiskParityConfig, budget: RiskBudget) -> Self {
        Self {
            solver: RiskParitySolver::new(config),
            budget: Some(budget),
        }
    }
}

impl Allocator for RiskParity {
    fn name(&self) -> &'static str {
        "risk_parity"
    }

    fn allocate(&self, covariance: &Array2<f64>) -> Result<Array1<f64>> {
        let solution = self.solver.solve(covariance, self.budget.as_ref())?;
        if !solution.converged {
            if self.solver.config().require_convergence {
                return Err(AllocationError::NotConverged {
                    iterations: solution.iterations,
                    residual: solution.residual,
                });
            }
            warn!(
                iterations = solution.iterations,
                residual = solution.residual,
                "risk parity stopped at iteration cap, using last iterate"
            );
        }
        Ok(solution.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::min_variance::MinimumVariance;
    use crate::risk_contribution::risk_contributions;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    fn two_asset() -> Array2<f64> {
        array![[0.04, 0.01], [0.01, 0.09]]
    }

    #[test]
    fn test_two_asset_equal_risk() {
        let cov = two_asset();
        let solution = risk_parity_weights(&cov, None, 1e-8, 100).unwrap();
        assert!(solution.converged);
        assert!(solution.iterations <= 100);
        assert!(solution.residual < 1e-8);

        let rc = risk_contributions(&solution.weights, &cov).unwrap();
        assert_abs_diff_eq!(rc.contributions[0], rc.contributions[1], epsilon = 1e-8);
        assert_abs_diff_eq!(solution.weights.sum(), 1.0, epsilon = 1e-12);
        // The fixed point for this matrix is (0.6, 0.4)
        assert_abs_diff_eq!(solution.weights[0], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let solution = risk_parity_weights(&two_asset(), None, 1e-12, 1).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
        assert!(solution.residual >= 1e-12);
        assert_abs_diff_eq!(solution.weights.sum(), 1.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1, 0.5)]
    #[case(3, 0.04)]
    #[case(6, 2.0)]
    fn test_scaled_identity_is_equal_weight(#[case] n: usize, #[case] k: f64) {
        let cov = Array2::<f64>::eye(n) * k;
        let solution = RiskParitySolver::default().solve(&cov, None).unwrap();
        assert!(solution.converged);
        for &w in &solution.weights {
            assert_abs_diff_eq!(w, 1.0 / n as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_custom_budget() {
        let cov = two_asset();
        let budget = RiskBudget::new(vec![0.3, 0.7], 1e-9).unwrap();
        let solution = RiskParitySolver::default()
            .solve(&cov, Some(&budget))
            .unwrap();
        assert!(solution.converged);
        let rel = risk_contributions(&solution.weights, &cov)
            .unwrap()
            .relative();
        assert_abs_diff_eq!(rel[0], 0.3, epsilon = 1e-7);
        assert_abs_diff_eq!(rel[1], 0.7, epsilon = 1e-7);
    }

    #[test]
    fn test_zero_budget_entry_gets_zero_weight() {
        let cov = array![[0.04, 0.0, 0.0], [0.0, 0.09, 0.0], [0.0, 0.0, 0.01]];
        let solution = risk_parity_weights(&cov, Some(&[0.5, 0.5, 0.0]), 1e-10, 200).unwrap();
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.weights[2], 0.0, epsilon = 1e-12);
        assert!(solution.weights.iter().all(|w| *w >= 0.0));
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        let cov = array![[0.04, 0.0], [0.0, 0.0]];
        let err = risk_parity_weights(&cov, None, 1e-8, 100).unwrap_err();
        assert_eq!(
            err,
            AllocationError::DegenerateAsset {
                index: 1,
                variance: 0.0
            }
        );
    }

    #[test]
    fn test_degenerate_check_precedes_validation_switch() {
        let solver = RiskParitySolver::new(RiskParityConfig {
            validate_positive_definite: false,
            ..Default::default()
        });
        let cov = array![[0.0, 0.0], [0.0, 0.09]];
        assert!(matches!(
            solver.solve(&cov, None),
            Err(AllocationError::DegenerateAsset { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_nan_outside_the_factored_triangle() {
        // Cholesky reads only the lower triangle, so this would pass validation
        let cov = array![[0.04, f64::NAN], [0.01, 0.09]];
        assert_eq!(
            RiskParitySolver::default().solve(&cov, None),
            Err(AllocationError::NonFiniteCovariance { row: 0, col: 1 })
        );
        assert!(matches!(
            MinimumVariance::default().weights(&cov),
            Err(AllocationError::NonFiniteCovariance { row: 0, col: 1 })
        ));
    }

    #[test]
    fn test_rejects_indefinite_matrix() {
        // Positive diagonal but eigenvalues 0.14 and -0.06
        let cov = array![[0.04, 0.1], [0.1, 0.04]];
        assert_eq!(
            RiskParitySolver::default().solve(&cov, None),
            Err(AllocationError::NotPositiveDefinite)
        );
    }

    #[test]
    fn test_budget_length_mismatch() {
        let budget = RiskBudget::uniform(3).unwrap();
        assert!(matches!(
            RiskParitySolver::default().solve(&two_asset(), Some(&budget)),
            Err(AllocationError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_malformed_budget_slice() {
        assert!(matches!(
            risk_parity_weights(&two_asset(), Some(&[0.7, 0.7]), 1e-8, 100),
            Err(AllocationError::InvalidBudget(_))
        ));
        assert!(matches!(
            risk_parity_weights(&two_asset(), Some(&[1.5, -0.5]), 1e-8, 100),
            Err(AllocationError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_zero_iterations_returns_start() {
        let solution = risk_parity_weights(&two_asset(), None, 1e-8, 0).unwrap();
        assert_eq!(solution.iterations, 0);
        assert!(!solution.converged);
        assert_abs_diff_eq!(solution.weights[0], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_allocator_require_convergence() {
        let strict = RiskParity::new(RiskParityConfig {
            tolerance: 1e-12,
            max_iterations: 1,
            require_convergence: true,
            ..Default::default()
        });
        assert!(matches!(
            strict.allocate(&two_asset()),
            Err(AllocationError::NotConverged { iterations: 1, .. })
        ));

        let lenient = RiskParity::new(RiskParityConfig {
            tolerance: 1e-12,
            max_iterations: 1,
            ..Default::default()
        });
        let w = lenient.allocate(&two_asset()).unwrap();
        assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_allocator_with_budget() {
        let budget = RiskBudget::new(vec![0.3, 0.7], 1e-9).unwrap();
        let allocator = RiskParity::with_budget(RiskParityConfig::default(), budget);
        let w = allocator.allocate(&two_asset()).unwrap();
        let rel = risk_contributions(&w, &two_asset()).unwrap().relative();
        assert_abs_diff_eq!(rel[0], 0.3, epsilon = 1e-7);
        assert_eq!(allocator.name(), "risk_parity");
    }
}
