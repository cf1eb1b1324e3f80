#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cadiz/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;
pub mod returns;
pub mod schedule;
pub mod strategy;

pub use engine::{BacktestConfig, WalkForwardBacktester, walk_forward_backtest};
pub use error::{BacktestError, Result};
pub use metrics::{PerformanceSummary, max_drawdown};
pub use report::{BacktestRecord, BacktestReport, WeightSnapshot};
pub use returns::ReturnMatrix;
pub use schedule::RebalanceRule;
pub use strategy::{Strategy, configured_strategies, default_strategies};
