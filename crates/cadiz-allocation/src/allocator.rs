//! Allocator seam
//!
//! An allocator maps a covariance matrix to a weight vector. The backtester
//! estimates one covariance per rebalance date and hands the same matrix to
//! every allocator, so implementations must be pure and shareable across
//! threads.

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::fmt::Debug;

/// Maps a covariance matrix to portfolio weights
pub trait Allocator: Debug + Send + Sync {
    /// Default label used when the allocator is registered as a strategy
    fn name(&self) -> &'static str;

    /// Compute weights for the N assets of `covariance`
    fn allocate(&self, covariance: &Array2<f64>) -> Result<Array1<f64>>;
}

impl<A: Allocator + ?Sized> Allocator for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn allocate(&self, covariance: &Array2<f64>) -> Result<Array1<f64>> {
        (**self).allocate(covariance)
    }
}
