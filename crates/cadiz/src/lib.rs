#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cadiz/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use cadiz_allocation as allocation;
pub use cadiz_backtest as backtest;
pub use cadiz_output as output;
pub use cadiz_risk as risk;

// Re-export the core entry points
pub use cadiz_allocation::{
    equal_weights, min_variance_weights, risk_contributions, risk_parity_weights,
};
pub use cadiz_backtest::{WalkForwardBacktester, walk_forward_backtest};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
