//! Risk budgets: target fractions of total portfolio risk per asset

use crate::error::{AllocationError, Result};
use ndarray::Array1;

/// Validated risk budget b: entries ≥ 0, finite, summing to 1
#[derive(Debug, Clone, PartialEq)]
pub struct RiskBudget(Array1<f64>);

impl RiskBudget {
    /// Tolerance on |Σb - 1| used when none is configured
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;

    /// Uniform budget 1/N
    ///
    /// # Errors
    /// `InvalidBudget` when `n_assets` is zero.
    pub fn uniform(n_assets: usize) -> Result<Self> {
        if n_assets == 0 {
            return Err(AllocationError::InvalidBudget(
                "budget needs at least one asset".to_string(),
            ));
        }
        Ok(Self(Array1::from_elem(n_assets, 1.0 / n_assets as f64)))
    }

    /// Validate a caller-supplied budget
    ///
    /// # Errors
    /// `InvalidBudget` when the budget is empty, has a negative or non-finite
    /// entry, or does not sum to 1 within `tolerance`.
    pub fn new(values: impl Into<Array1<f64>>, tolerance: f64) -> Result<Self> {
        let values = values.into();
        if values.is_empty() {
            return Err(AllocationError::InvalidBudget(
                "budget is empty".to_string(),
            ));
        }
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(AllocationError::InvalidBudget(format!(
                "entry {i} is {v}, entries must be finite and non-negative"
            )));
        }
        let total = values.sum();
        if (total - 1.0).abs() > tolerance {
            return Err(AllocationError::InvalidBudget(format!(
                "entries sum to {total}, expected 1"
            )));
        }
        Ok(Self(values))
    }

    /// Number of assets covered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a validated budget
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Budget entries
    pub const fn as_array(&self) -> &Array1<f64> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_uniform() {
        let b = RiskBudget::uniform(4).unwrap();
        assert_eq!(b.len(), 4);
        assert_eq!(b.as_array().to_vec(), vec![0.25; 4]);
        assert!(RiskBudget::uniform(0).is_err());
    }

    #[test]
    fn test_valid_custom_budget() {
        let b = RiskBudget::new(vec![0.2, 0.3, 0.5], RiskBudget::DEFAULT_TOLERANCE).unwrap();
        assert_eq!(b.len(), 3);
        // Zero entries are allowed
        assert!(RiskBudget::new(vec![0.0, 1.0], RiskBudget::DEFAULT_TOLERANCE).is_ok());
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![0.6, 0.6])]
    #[case(vec![1.2, -0.2])]
    #[case(vec![0.5, f64::NAN])]
    #[case(vec![0.3, 0.3])]
    fn test_invalid_budget(#[case] values: Vec<f64>) {
        assert!(matches!(
            RiskBudget::new(values, RiskBudget::DEFAULT_TOLERANCE),
            Err(AllocationError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_tolerance_is_respected() {
        assert!(RiskBudget::new(vec![0.5, 0.5001], 1e-3).is_ok());
        assert!(RiskBudget::new(vec![0.5, 0.5001], 1e-6).is_err());
    }
}
