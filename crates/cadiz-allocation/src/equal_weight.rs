//! Equal weight (1/N) baseline

use crate::allocator::Allocator;
use crate::error::{AllocationError, Result, check_covariance};
use ndarray::{Array1, Array2};

/// Uniform weights 1/N for `n_assets` assets
///
/// # Errors
/// `InvalidDimension` when `n_assets` is zero.
///
/// # Examples
///
/// ```
/// let w = cadiz_allocation::equal_weights(4).unwrap();
/// assert_eq!(w.to_vec(), vec![0.25; 4]);
/// ```
pub fn equal_weights(n_assets: usize) -> Result<Array1<f64>> {
    if n_assets == 0 {
        return Err(AllocationError::InvalidDimension(
            "equal weights need at least one asset".to_string(),
        ));
    }
    Ok(Array1::from_elem(n_assets, 1.0 / n_assets as f64))
}

/// Equal weight allocator; ignores everything in the covariance but its size
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeight;

impl Allocator for EqualWeight {
    fn name(&self) -> &'static str {
        "equal_weight"
    }

    fn allocate(&self, covariance: &Array2<f64>) -> Result<Array1<f64>> {
        equal_weights(check_covariance(covariance)?)
    }
}
