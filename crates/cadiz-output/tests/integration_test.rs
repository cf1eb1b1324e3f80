//! Integration tests for exporting a real backtest run.

use cadiz_backtest::{
    BacktestConfig, RebalanceRule, ReturnMatrix, WalkForwardBacktester, default_strategies,
};
use cadiz_output::{
    ExportFormat, Exporter, ReturnsExport, SummaryExport, WeightHistoryExport, summary_table,
};
use cadiz_risk::SampleCovarianceEstimator;
use chrono::{Days, NaiveDate};
use ndarray::Array2;

fn run() -> cadiz_backtest::BacktestReport {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates = (0..30).map(|i| start + Days::new(i)).collect();
    let values = Array2::from_shape_fn((30, 3), |(t, j)| {
        0.01 * ((t * (j + 2)) as f64 * 0.9).sin() + 0.001 * j as f64
    });
    let returns = ReturnMatrix::new(
        dates,
        vec!["SPY".to_string(), "TLT".to_string(), "GLD".to_string()],
        values,
    )
    .unwrap();

    let config = BacktestConfig {
        window_length: 10,
        rebalance: RebalanceRule::Every(5),
        ..Default::default()
    };
    WalkForwardBacktester::new(SampleCovarianceEstimator::default(), config)
        .run(&returns, &default_strategies())
        .unwrap()
}

#[test]
fn test_full_export_workflow() {
    let report = run();

    // Rebalances at rows 10, 15, 20, 25; three strategies, three assets
    let weights = WeightHistoryExport::from_report(&report);
    assert_eq!(weights.rows.len(), 4 * 3 * 3);

    let returns = ReturnsExport::from_report(&report);
    assert_eq!(returns.rows.len(), 20 * 3);

    let csv = weights.export_to_string(ExportFormat::Csv).unwrap();
    assert!(csv.starts_with("strategy,date,asset,weight,error"));
    assert!(csv.contains("risk_parity,2024-01-11,GLD,"));

    let json = returns.export_to_string(ExportFormat::Json).unwrap();
    assert!(json.contains("\"cumulative_return\""));
}

#[test]
fn test_summary_outputs() {
    let report = run();
    let summaries = report.summaries(252.0);
    let rows: Vec<_> = summaries
        .iter()
        .map(|(name, s)| (name.as_str(), s.clone()))
        .collect();

    let table = summary_table(&rows);
    for name in ["equal_weight", "min_variance", "risk_parity"] {
        assert!(table.contains(name));
    }

    let export = SummaryExport::from_report(&report, 252.0);
    let path = std::env::temp_dir().join(format!("cadiz_summary_integration_{}.csv", std::process::id()));
    export.export_to_file(&path, ExportFormat::Csv).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 4);
    std::fs::remove_file(&path).ok();
}
