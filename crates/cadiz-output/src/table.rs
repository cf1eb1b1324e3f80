//! Plain-text tables for terminal output.

use cadiz_backtest::PerformanceSummary;

/// Render performance summaries as an ASCII table
pub fn summary_table(rows: &[(&str, PerformanceSummary)]) -> String {
    let mut output = String::new();

    output.push_str("\nBacktest Performance\n");
    output.push_str(&"=".repeat(80));
    output.push('\n');

    output.push_str(&format!(
        "{:<16} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "Strategy", "Periods", "Total", "Ann. Ret", "Ann. Vol", "Sharpe", "Max DD"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for (name, s) in rows {
        let sharpe = s
            .sharpe_ratio
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        output.push_str(&format!(
            "{:<16} {:>8} {:>9.2}% {:>9.2}% {:>9.2}% {:>10} {:>9.2}%\n",
            name,
            s.periods,
            s.total_return * 100.0,
            s.annualized_return * 100.0,
            s.annualized_volatility * 100.0,
            sharpe,
            s.max_drawdown * 100.0
        ));
    }

    output.push_str(&"=".repeat(80));
    output.push('\n');
    output
}

/// Weights and risk shares of one strategy at one date
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    /// Strategy name
    pub strategy: String,
    /// Weight per asset
    pub weights: Vec<f64>,
    /// Share of portfolio volatility per asset (RCᵢ / σ)
    pub risk_shares: Vec<f64>,
    /// Portfolio volatility per period
    pub volatility: f64,
}

/// Render weights next to risk shares, one block per strategy
pub fn allocation_table(assets: &[String], rows: &[AllocationRow]) -> String {
    let mut output = String::new();

    for row in rows {
        output.push_str(&format!(
            "\n{} (volatility {:.4}%)\n",
            row.strategy,
            row.volatility * 100.0
        ));
        output.push_str(&format!(
            "{:<20} {:>12} {:>12}\n",
            "Asset", "Weight", "Risk Share"
        ));
        output.push_str(&"-".repeat(46));
        output.push('\n');
        for ((asset, w), rc) in assets.iter().zip(&row.weights).zip(&row.risk_shares) {
            output.push_str(&format!(
                "{:<20} {:>11.2}% {:>11.2}%\n",
                asset,
                w * 100.0,
                rc * 100.0
            ));
        }
    }

    output
}
