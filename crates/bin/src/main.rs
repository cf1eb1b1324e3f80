//! Cadiz CLI binary.
//!
//! Runs walk-forward backtests and single-date allocations over a return
//! history loaded from CSV.

mod config;
mod input;

use cadiz::allocation::{Allocator, RiskBudget, RiskParity, RiskParitySolver, risk_contributions};
use cadiz::backtest::{RebalanceRule, Strategy, WalkForwardBacktester, configured_strategies};
use cadiz::output::{AllocationRow, ExportFormat, allocation_table, export_report, summary_table};
use cadiz::risk::CovarianceEstimator;
use clap::{ArgAction, Parser, Subcommand};
use config::{AppConfig, EstimatorKind};
use input::load_returns;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadiz")]
#[command(about = "Cadiz: risk parity allocation and walk-forward backtesting", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk-forward backtest of equal weight, minimum variance and risk parity
    Backtest {
        /// Return CSV (`date,<asset>,...`)
        #[arg(long)]
        returns: PathBuf,

        /// Trailing window length in periods
        #[arg(long)]
        window: Option<usize>,

        /// Rebalance rule: every, weekly, monthly, or a period count
        #[arg(long)]
        rebalance: Option<RebalanceRule>,

        /// Covariance estimator
        #[arg(long, value_enum)]
        estimator: Option<EstimatorKind>,

        /// Evaluate rebalance dates in parallel
        #[arg(long)]
        parallel: bool,

        /// Directory to write weights, returns and summary files into
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Export format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Weights of every strategy from the most recent window
    Weights {
        /// Return CSV (`date,<asset>,...`)
        #[arg(long)]
        returns: PathBuf,

        /// Trailing window length in periods
        #[arg(long)]
        window: Option<usize>,

        /// Covariance estimator
        #[arg(long, value_enum)]
        estimator: Option<EstimatorKind>,

        /// Risk budget for risk parity, comma separated, summing to 1
        #[arg(long, value_delimiter = ',')]
        budget: Option<Vec<f64>>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Backtest {
            returns,
            window,
            rebalance,
            estimator,
            parallel,
            export_dir,
            format,
        } => {
            if let Some(window) = window {
                config.backtest.window_length = window;
            }
            if let Some(rebalance) = rebalance {
                config.backtest.rebalance = rebalance;
            }
            if let Some(estimator) = estimator {
                config.covariance.estimator = estimator;
            }
            config.backtest.parallel |= parallel;
            run_backtest(&config, &returns, export_dir.as_deref(), format)?;
        }
        Commands::Weights {
            returns,
            window,
            estimator,
            budget,
        } => {
            if let Some(window) = window {
                config.backtest.window_length = window;
            }
            if let Some(estimator) = estimator {
                config.covariance.estimator = estimator;
            }
            run_weights(&config, &returns, budget)?;
        }
    }

    Ok(())
}

fn run_backtest(
    config: &AppConfig,
    path: &Path,
    export_dir: Option<&Path>,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let returns = load_returns(path)?;
    info!(
        periods = returns.len(),
        assets = returns.n_assets(),
        "loaded returns"
    );

    let estimator = config.covariance.build()?;
    let backtester = WalkForwardBacktester::new(estimator, config.backtest.clone());
    let strategies =
        configured_strategies(config.min_variance.clone(), config.risk_parity.clone());
    let report = backtester.run(&returns, &strategies)?;

    let periods_per_year = config.backtest.periods_per_year;
    println!(
        "\n{} assets, {} periods, window {}, rebalance {}, {:?} covariance",
        returns.n_assets(),
        report.periods(),
        config.backtest.window_length,
        config.backtest.rebalance,
        config.covariance.estimator
    );

    let summaries = report.summaries(periods_per_year);
    let rows: Vec<_> = summaries
        .iter()
        .map(|(name, s)| (name.as_str(), s.clone()))
        .collect();
    print!("{}", summary_table(&rows));

    for record in report.strategies.values() {
        let failures = record.failures().count();
        if failures > 0 {
            println!(
                "{}: {} of {} rebalances failed, {} periods missing",
                record.name,
                failures,
                record.weight_history.len(),
                record.missing_periods()
            );
        }
    }

    if let Some(dir) = export_dir {
        for written in export_report(&report, dir, format, periods_per_year)? {
            println!("Wrote {}", written.display());
        }
    }

    Ok(())
}

fn run_weights(
    config: &AppConfig,
    path: &Path,
    budget: Option<Vec<f64>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let returns = load_returns(path)?;
    let window = config.backtest.window_length;
    if returns.len() < window {
        return Err(format!(
            "{} periods of returns, window needs {}",
            returns.len(),
            window
        )
        .into());
    }

    let estimator = config.covariance.build()?;
    let covariance = estimator.estimate(returns.window(returns.len() - window, returns.len()))?;

    let budget = budget
        .map(|b| RiskBudget::new(b, config.risk_parity.budget_tolerance))
        .transpose()?;

    let mut strategies = configured_strategies(config.min_variance.clone(), config.risk_parity.clone());
    if let Some(budget) = &budget {
        strategies.retain(|s| s.name() != "risk_parity");
        strategies.push(Strategy::from_allocator(RiskParity::with_budget(
            config.risk_parity.clone(),
            budget.clone(),
        )));
    }

    let first = returns.dates()[returns.len() - window];
    let last = returns.dates()[returns.len() - 1];
    println!("\nCovariance window: {} to {} ({} periods)", first, last, window);

    let mut rows = Vec::new();
    for strategy in &strategies {
        match strategy.allocator().allocate(&covariance) {
            Ok(weights) => {
                let rc = risk_contributions(&weights, &covariance)?;
                rows.push(AllocationRow {
                    strategy: strategy.name().to_string(),
                    weights: weights.to_vec(),
                    risk_shares: rc.relative().to_vec(),
                    volatility: rc.total_volatility,
                });
            }
            Err(e) => println!("{}: failed: {}", strategy.name(), e),
        }
    }
    print!("{}", allocation_table(returns.assets(), &rows));

    let solver = RiskParitySolver::new(config.risk_parity.clone());
    if let Ok(s) = solver.solve(&covariance, budget.as_ref()) {
        let status = if s.converged {
            "converged"
        } else {
            "stopped without converging"
        };
        println!(
            "\nRisk parity {} after {} sweeps (residual {:.2e})",
            status, s.iterations, s.residual
        );
    }

    Ok(())
}
