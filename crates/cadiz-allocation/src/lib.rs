#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cadiz/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod budget;
pub mod equal_weight;
pub mod error;
pub mod min_variance;
pub mod risk_contribution;
pub mod risk_parity;

pub use allocator::Allocator;
pub use budget::RiskBudget;
pub use equal_weight::{EqualWeight, equal_weights};
pub use error::{AllocationError, Result};
pub use min_variance::{MinimumVariance, MinimumVarianceConfig, min_variance_weights};
pub use risk_contribution::{RiskContributions, portfolio_variance, risk_contributions};
pub use risk_parity::{
    RiskParity, RiskParityConfig, RiskParitySolution, RiskParitySolver, risk_parity_weights,
};
