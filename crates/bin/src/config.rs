//! Application configuration loaded from an optional JSON file.

use cadiz::allocation::{MinimumVarianceConfig, RiskParityConfig};
use cadiz::backtest::BacktestConfig;
use cadiz::risk::{
    CovarianceError, CovarianceEstimator, EwmaConfig, EwmaCovarianceEstimator, LedoitWolfConfig,
    LedoitWolfEstimator, SampleCovarianceConfig, SampleCovarianceEstimator,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for [`AppConfig`].
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Covariance estimator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum EstimatorKind {
    /// Unbiased sample covariance
    #[default]
    Sample,
    /// Ledoit-Wolf shrinkage
    LedoitWolf,
    /// Exponentially weighted covariance
    Ewma,
}

/// Estimator settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CovarianceSettings {
    pub(crate) estimator: EstimatorKind,
    pub(crate) sample: SampleCovarianceConfig,
    pub(crate) ledoit_wolf: LedoitWolfConfig,
    pub(crate) ewma: EwmaConfig,
}

/// Estimator shared across rebalance dates.
pub(crate) type SharedEstimator = Box<dyn CovarianceEstimator + Send + Sync>;

impl CovarianceSettings {
    /// Build the selected estimator.
    pub(crate) fn build(&self) -> Result<SharedEstimator, CovarianceError> {
        Ok(match self.estimator {
            EstimatorKind::Sample => {
                Box::new(SampleCovarianceEstimator::new(self.sample.clone()))
            }
            EstimatorKind::LedoitWolf => {
                Box::new(LedoitWolfEstimator::new(self.ledoit_wolf.clone()))
            }
            EstimatorKind::Ewma => Box::new(EwmaCovarianceEstimator::new(self.ewma.clone())?),
        })
    }
}

/// Full application configuration; every section falls back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) covariance: CovarianceSettings,
    pub(crate) min_variance: MinimumVarianceConfig,
    pub(crate) risk_parity: RiskParityConfig,
    pub(crate) backtest: BacktestConfig,
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    pub(crate) fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
