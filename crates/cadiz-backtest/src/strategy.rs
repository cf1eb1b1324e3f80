//! Named allocators driven by the backtester.

use cadiz_allocation::{
    Allocator, EqualWeight, MinimumVariance, MinimumVarianceConfig, RiskParity, RiskParityConfig,
};

/// A backtest strategy: an allocator under a unique name
#[derive(Debug)]
pub struct Strategy {
    name: String,
    allocator: Box<dyn Allocator>,
}

impl Strategy {
    /// Register `allocator` under an explicit name
    pub fn new(name: impl Into<String>, allocator: impl Allocator + 'static) -> Self {
        Self {
            name: name.into(),
            allocator: Box::new(allocator),
        }
    }

    /// Register `allocator` under its own default name
    pub fn from_allocator(allocator: impl Allocator + 'static) -> Self {
        Self::new(allocator.name(), allocator)
    }

    /// Strategy name used as the key of its record
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying allocator
    pub fn allocator(&self) -> &dyn Allocator {
        self.allocator.as_ref()
    }
}

/// Equal weight, minimum variance and risk parity with default settings
pub fn default_strategies() -> Vec<Strategy> {
    configured_strategies(MinimumVarianceConfig::default(), RiskParityConfig::default())
}

/// The three baseline strategies with explicit configurations
pub fn configured_strategies(
    min_variance: MinimumVarianceConfig,
    risk_parity: RiskParityConfig,
) -> Vec<Strategy> {
    vec![
        Strategy::from_allocator(EqualWeight),
        Strategy::from_allocator(MinimumVariance::new(min_variance)),
        Strategy::from_allocator(RiskParity::new(risk_parity)),
    ]
}
