//! Error types for backtesting.

use cadiz_risk::CovarianceError;
use thiserror::Error;

/// Result type for backtest operations.
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Errors that stop a backtest before it runs.
///
/// A strategy failing at a single rebalance date is not one of these; it is
/// recorded as a gap in that strategy's record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    /// Return history is malformed
    #[error("Invalid returns: {0}")]
    InvalidReturns(String),

    /// Trailing window is too short for the covariance estimator
    #[error("Window length {window_length} is below the {min_observations} observations the estimator needs")]
    InvalidWindow {
        /// Requested window length
        window_length: usize,
        /// Minimum the estimator accepts
        min_observations: usize,
    },

    /// Fewer than L periods precede the requested rebalance row
    #[error("Row {row} has fewer than {window_length} preceding periods")]
    InsufficientHistory {
        /// Requested rebalance row
        row: usize,
        /// Trailing window length L
        window_length: usize,
    },

    /// Unusable rebalance rule
    #[error("Invalid rebalance rule: {0}")]
    InvalidRebalance(String),

    /// No strategies were supplied
    #[error("No strategies to backtest")]
    NoStrategies,

    /// Two strategies share a name
    #[error("Duplicate strategy name: {0}")]
    DuplicateStrategy(String),

    /// Covariance estimation failed
    #[error("Covariance error: {0}")]
    Covariance(#[from] CovarianceError),
}
