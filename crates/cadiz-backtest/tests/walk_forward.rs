//! End-to-end walk-forward runs over small hand-built histories.

use approx::assert_abs_diff_eq;
use cadiz_allocation::risk_contributions;
use cadiz_backtest::{
    BacktestConfig, RebalanceRule, ReturnMatrix, WalkForwardBacktester, default_strategies,
    walk_forward_backtest,
};
use cadiz_risk::{EwmaCovarianceEstimator, LedoitWolfEstimator, SampleCovarianceEstimator};
use chrono::NaiveDate;
use ndarray::Array1;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn assets() -> Vec<String> {
    vec!["A".to_string(), "B".to_string()]
}

fn six_periods() -> ReturnMatrix {
    let dates = (1..=6).map(|d| date(2024, 2, d)).collect();
    ReturnMatrix::from_rows(
        dates,
        assets(),
        vec![
            vec![0.01, 0.02],
            vec![-0.02, 0.01],
            vec![0.015, -0.01],
            vec![0.005, 0.012],
            vec![-0.01, -0.004],
            vec![0.02, 0.006],
        ],
    )
    .unwrap()
}

fn every_period(window_length: usize) -> BacktestConfig {
    BacktestConfig {
        window_length,
        rebalance: RebalanceRule::EveryPeriod,
        ..Default::default()
    }
}

#[test]
fn test_six_periods_window_three() {
    let returns = six_periods();
    let backtester = WalkForwardBacktester::new(SampleCovarianceEstimator::default(), every_period(3));
    let report = backtester.run(&returns, &default_strategies()).unwrap();

    assert_eq!(report.strategies.len(), 3);
    for record in report.strategies.values() {
        let history_dates: Vec<_> = record.weight_history.iter().map(|s| s.date).collect();
        assert_eq!(history_dates, returns.dates()[3..].to_vec(), "{}", record.name);
        assert_eq!(record.dates, returns.dates()[3..].to_vec());
        assert_eq!(record.missing_periods(), 0, "{}", record.name);

        for snapshot in &record.weight_history {
            let weights = snapshot.weights.as_ref().unwrap();
            assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_entry_point_rebalances_every_period() {
    let returns = six_periods();
    let report = walk_forward_backtest(&returns, 3, &default_strategies()).unwrap();

    assert_eq!(report.strategies.len(), 3);
    for record in report.strategies.values() {
        let history_dates: Vec<_> = record.weight_history.iter().map(|s| s.date).collect();
        assert_eq!(history_dates, returns.dates()[3..].to_vec(), "{}", record.name);
        assert_eq!(record.missing_periods(), 0, "{}", record.name);
    }
}

#[test]
fn test_realised_returns_use_held_weights() {
    let returns = six_periods();
    let report = WalkForwardBacktester::new(SampleCovarianceEstimator::default(), every_period(3))
        .run(&returns, &default_strategies())
        .unwrap();

    let ew = report.get("equal_weight").unwrap();
    // Period 4: 0.5 * 0.005 + 0.5 * 0.012
    assert_abs_diff_eq!(ew.period_returns[0].unwrap(), 0.0085, epsilon = 1e-14);

    let growth: f64 = ew.observed_returns().iter().map(|r| 1.0 + r).product();
    assert_abs_diff_eq!(*ew.cumulative_returns.last().unwrap(), growth - 1.0, epsilon = 1e-12);
}

#[test]
fn test_risk_parity_weights_equalise_window_risk() {
    let returns = six_periods();
    let backtester = WalkForwardBacktester::new(SampleCovarianceEstimator::default(), every_period(3));
    let report = backtester.run(&returns, &default_strategies()).unwrap();
    let rp = report.get("risk_parity").unwrap();

    for snapshot in &rp.weight_history {
        let row = returns.dates().iter().position(|d| *d == snapshot.date).unwrap();
        let covariance = backtester.covariance_at(&returns, row).unwrap();
        let weights = Array1::from(snapshot.weights.clone().unwrap());
        let rc = risk_contributions(&weights, &covariance).unwrap();
        assert_abs_diff_eq!(rc.contributions[0], rc.contributions[1], epsilon = 1e-6);
    }
}

#[test]
fn test_zero_variance_window_leaves_gaps() {
    let dates = (1..=5).map(|d| date(2024, 4, d)).collect();
    let returns = ReturnMatrix::from_rows(
        dates,
        assets(),
        vec![
            vec![0.01, 0.0],
            vec![-0.02, 0.0],
            vec![0.015, 0.0],
            vec![0.005, 0.012],
            vec![-0.01, 0.004],
        ],
    )
    .unwrap();
    let report = WalkForwardBacktester::new(SampleCovarianceEstimator::default(), every_period(3))
        .run(&returns, &default_strategies())
        .unwrap();

    assert_eq!(report.get("equal_weight").unwrap().missing_periods(), 0);

    for name in ["min_variance", "risk_parity"] {
        let record = report.get(name).unwrap();
        assert_eq!(record.period_returns.len(), 2);
        assert!(record.period_returns[0].is_none(), "{name}");
        assert!(record.period_returns[1].is_some(), "{name}");
        assert_eq!(record.cumulative_returns[0], 0.0);

        assert!(record.weight_history[0].error.is_some());
        assert!(record.weight_history[1].weights.is_some());
        assert_eq!(record.failures().count(), 1);
    }
}

#[test]
fn test_monthly_blocks() {
    let returns = ReturnMatrix::from_rows(
        vec![
            date(2024, 1, 29),
            date(2024, 1, 30),
            date(2024, 1, 31),
            date(2024, 2, 1),
            date(2024, 2, 2),
            date(2024, 2, 5),
            date(2024, 3, 1),
            date(2024, 3, 4),
        ],
        assets(),
        vec![
            vec![0.01, 0.02],
            vec![-0.02, 0.01],
            vec![0.015, -0.01],
            vec![0.005, 0.012],
            vec![-0.01, -0.004],
            vec![0.02, 0.006],
            vec![0.003, -0.002],
            vec![-0.004, 0.009],
        ],
    )
    .unwrap();

    let monthly = |window_length| {
        WalkForwardBacktester::new(
            SampleCovarianceEstimator::default(),
            BacktestConfig {
                window_length,
                rebalance: RebalanceRule::Monthly,
                ..Default::default()
            },
        )
        .run(&returns, &default_strategies())
        .unwrap()
    };

    let report = monthly(3);
    let ew = report.get("equal_weight").unwrap();
    assert_eq!(ew.dates, returns.dates()[3..].to_vec());
    let rebalances: Vec<_> = ew.weight_history.iter().map(|s| s.date).collect();
    assert_eq!(rebalances, vec![date(2024, 2, 1), date(2024, 3, 1)]);

    // With L = 4 the February block starts too early and is dropped whole
    let report = monthly(4);
    let ew = report.get("equal_weight").unwrap();
    assert_eq!(ew.dates, returns.dates()[6..].to_vec());
    assert_eq!(ew.weight_history.len(), 1);
}

#[test]
fn test_alternative_estimators_run() {
    let returns = six_periods();
    let ledoit_wolf = WalkForwardBacktester::new(LedoitWolfEstimator::default(), every_period(3))
        .run(&returns, &default_strategies())
        .unwrap();
    let ewma = WalkForwardBacktester::new(
        EwmaCovarianceEstimator::try_default().unwrap(),
        every_period(3),
    )
    .run(&returns, &default_strategies())
    .unwrap();

    for report in [ledoit_wolf, ewma] {
        assert_eq!(report.periods(), 3);
        let ew = report.get("equal_weight").unwrap();
        assert_eq!(ew.missing_periods(), 0);
    }
}
