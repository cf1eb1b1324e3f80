//! Risk contribution analytics
//!
//! For weights w and covariance Σ with σ = √(wᵗΣw):
//!
//! - marginal contribution MCᵢ = (Σw)ᵢ / σ
//! - risk contribution    RCᵢ = wᵢ · MCᵢ
//!
//! By Euler's theorem Σᵢ RCᵢ = σ for any w. This is the oracle the risk
//! parity solver is tested against.

use crate::error::{AllocationError, Result, check_covariance};
use ndarray::{Array1, Array2};

/// Per-asset risk decomposition of a portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct RiskContributions {
    /// (Σw)ᵢ / σ
    pub marginal: Array1<f64>,
    /// wᵢ (Σw)ᵢ / σ
    pub contributions: Array1<f64>,
    /// √(wᵗΣw)
    pub total_volatility: f64,
}

impl RiskContributions {
    /// Sum of the contributions; equals `total_volatility` up to rounding
    pub fn total(&self) -> f64 {
        self.contributions.sum()
    }

    /// Contributions as fractions of total volatility (RCᵢ / σ)
    ///
    /// All zeros for a zero-volatility portfolio.
    pub fn relative(&self) -> Array1<f64> {
        if self.total_volatility > 0.0 {
            &self.contributions / self.total_volatility
        } else {
            Array1::zeros(self.contributions.len())
        }
    }
}

fn check_weights(weights: &Array1<f64>, covariance: &Array2<f64>) -> Result<()> {
    let n = check_covariance(covariance)?;
    if weights.len() != n {
        return Err(AllocationError::InvalidDimension(format!(
            "{} weights for a {n}x{n} covariance matrix",
            weights.len()
        )));
    }
    Ok(())
}

/// Portfolio variance wᵗΣw
pub fn portfolio_variance(weights: &Array1<f64>, covariance: &Array2<f64>) -> Result<f64> {
    check_weights(weights, covariance)?;
    Ok(weights.dot(&covariance.dot(weights)))
}

/// Decompose portfolio volatility into per-asset risk contributions
///
/// A portfolio with zero variance (all-zero weights, say) gets zero marginal
/// and total contributions rather than a division by zero. Slightly negative
/// variances from rounding are clamped to zero.
///
/// # Errors
/// `InvalidDimension` when weights and covariance disagree in size.
pub fn risk_contributions(
    weights: &Array1<f64>,
    covariance: &Array2<f64>,
) -> Result<RiskContributions> {
    check_weights(weights, covariance)?;

    let sigma_w = covariance.dot(weights);
    let variance = weights.dot(&sigma_w).max(0.0);
    let total_volatility = variance.sqrt();

    let marginal = if total_volatility > 0.0 {
        sigma_w / total_volatility
    } else {
        Array1::zeros(weights.len())
    };
    let contributions = weights * &marginal;

    Ok(RiskContributions {
        marginal,
        contributions,
        total_volatility,
    })
}
