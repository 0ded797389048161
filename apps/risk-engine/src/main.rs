//! Risk Engine Binary
//!
//! Runs one engine computation over strategies stored as JSON and prints the
//! result as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! risk-engine --config engine.yaml payoff --strategy iron_condor.json
//! risk-engine --config engine.yaml monte-carlo --strategy straddle.json -n 10000 --seed 42
//! risk-engine --config engine.yaml hedges --strategy a.json --strategy b.json --budget 50000
//! risk-engine --config engine.yaml capital --strategy iron_condor.json --max-loss 25000
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (overrides `observability.logging.level`)
//! - Any `${VAR}` referenced from the config file

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use risk_engine::config::{EngineConfig, load_config};
use risk_engine::payoff::{PayoffCurveBuilder, compute_key_levels, refine_key_levels};
use risk_engine::portfolio::{detect_conflicts, recommend};
use risk_engine::risk::{
    RiskScorer, aggregate, capital_at_risk, classify, recommendations, safety_checklist,
    validate_max_loss,
};
use risk_engine::simulation::{
    DecayPoint, MonteCarloRequest, MonteCarloSimulator, Scenario, WhatIfEngine, all_presets,
    project_decay,
};
use risk_engine::telemetry::init_telemetry;
use risk_engine::{Cancellation, Strategy};

/// Options risk and simulation engine
#[derive(Parser)]
#[command(name = "risk-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Payoff curve with max profit, max loss and breakevens
    Payoff {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,

        /// Half-width of the price grid as a fraction of spot
        #[arg(long)]
        range: Option<Decimal>,

        /// Number of grid intervals
        #[arg(long)]
        steps: Option<u32>,

        /// Also evaluate at every strike for exact key levels
        #[arg(long)]
        refine: bool,
    },

    /// Portfolio Greeks and their exposure levels
    Greeks {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,
    },

    /// Composite risk score
    Score {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,
    },

    /// Apply a spot/IV/time shock, or every preset
    WhatIf {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,

        /// Spot change in percent
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        spot_change: Decimal,

        /// IV change in percent of current IV
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        iv_change: Decimal,

        /// Days elapsed
        #[arg(long, default_value = "0")]
        days: u32,

        /// Run the built-in presets instead of a single shock
        #[arg(long, conflicts_with_all = ["spot_change", "iv_change", "days"])]
        presets: bool,
    },

    /// Pre-trade safety checklist
    Safety {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,
    },

    /// Capital at risk, optionally checked against a loss limit
    Capital {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,

        /// Largest acceptable loss
        #[arg(long)]
        max_loss: Option<Decimal>,
    },

    /// Day-by-day theta decay projection
    Decay {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,

        /// Horizon in days (defaults to the strategy's days to expiry)
        #[arg(long)]
        horizon: Option<u32>,
    },

    /// Monte Carlo P&L distribution
    MonteCarlo {
        /// Strategy JSON file
        #[arg(short, long)]
        strategy: PathBuf,

        /// Number of draws
        #[arg(short = 'n', long, default_value = "10000")]
        simulations: usize,

        /// Base seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Flat IV shift in volatility points
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        iv_shift: Decimal,

        /// Elapsed days applied through theta
        #[arg(long, default_value = "0")]
        elapsed_days: u32,

        /// Abort after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Cross-strategy conflicts
    Conflicts {
        /// Strategy JSON files
        #[arg(short, long = "strategy", required = true)]
        strategies: Vec<PathBuf>,

        /// Correlation matrix JSON file (N x N); identity when omitted
        #[arg(long)]
        correlation: Option<PathBuf>,
    },

    /// Hedge recommendations for detected conflicts
    Hedges {
        /// Strategy JSON files
        #[arg(short, long = "strategy", required = true)]
        strategies: Vec<PathBuf>,

        /// Correlation matrix JSON file (N x N); identity when omitted
        #[arg(long)]
        correlation: Option<PathBuf>,

        /// Maximum cost per hedge
        #[arg(long)]
        budget: Decimal,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(Some(&cli.config))
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    init_telemetry(&config.observability);

    info!(config = %cli.config, "Starting risk engine");

    match cli.command {
        Commands::Payoff {
            strategy,
            range,
            steps,
            refine,
        } => {
            let strategy = read_strategy(&strategy)?;
            let mut builder = PayoffCurveBuilder::from_config(&strategy, &config.payoff);
            if let Some(range) = range {
                builder = builder.price_range_fraction(range);
            }
            if let Some(steps) = steps {
                builder = builder.steps(steps);
            }
            let curve = builder.build()?;
            let key_levels = if refine {
                refine_key_levels(&strategy, &curve)?
            } else {
                compute_key_levels(&curve)
            };
            print_json(&json!({ "curve": curve, "key_levels": key_levels }))
        }

        Commands::Greeks { strategy } => {
            let strategy = read_strategy(&strategy)?;
            let aggregation = aggregate(&strategy.legs);
            let exposure = classify(&aggregation.greeks, config.greek_limits()?)?;
            print_json(&json!({ "aggregation": aggregation, "exposure": exposure }))
        }

        Commands::Score { strategy } => {
            let strategy = read_strategy(&strategy)?;
            let greeks = complete_greeks(&strategy)?;
            let score = scorer(&config)?.score(&strategy, &greeks, strategy.margin_used_pct())?;
            print_json(&json!({
                "score": score,
                "recommendations": recommendations(score.band),
            }))
        }

        Commands::WhatIf {
            strategy,
            spot_change,
            iv_change,
            days,
            presets,
        } => {
            let strategy = read_strategy(&strategy)?;
            let engine = WhatIfEngine::new(config.what_if.clone(), scorer(&config)?)?;
            if presets {
                print_json(&engine.run_scenarios(&strategy, &all_presets())?)
            } else {
                let scenario = Scenario::new(spot_change, iv_change, days);
                print_json(&engine.apply_scenario(&strategy, &scenario)?)
            }
        }

        Commands::Safety { strategy } => {
            let strategy = read_strategy(&strategy)?;
            let checklist = safety_checklist(&strategy, config.safety()?)?;
            print_json(&json!({
                "checklist": checklist,
                "pending_acknowledgments": checklist.pending(&[]).len(),
            }))
        }

        Commands::Capital { strategy, max_loss } => {
            let strategy = read_strategy(&strategy)?;
            let capital = config.capital()?;
            let analysis = capital_at_risk(&strategy, &config.payoff, capital)?;
            let check = max_loss
                .map(|limit| validate_max_loss(&strategy, limit, &config.payoff, capital))
                .transpose()?;
            print_json(&json!({ "capital_at_risk": analysis, "max_loss_check": check }))
        }

        Commands::Decay { strategy, horizon } => {
            let strategy = read_strategy(&strategy)?;
            let horizon = horizon.unwrap_or(strategy.days_to_expiry);
            let projection = project_decay(&strategy, horizon, &config.theta)?;
            let breakeven_day = projection.breakeven_day();
            let critical_days: Vec<u32> =
                projection.critical_days().iter().map(|p| p.day).collect();
            let points: Vec<DecayPoint> = projection.collect();
            print_json(&json!({
                "points": points,
                "breakeven_day": breakeven_day,
                "critical_days": critical_days,
            }))
        }

        Commands::MonteCarlo {
            strategy,
            simulations,
            seed,
            iv_shift,
            elapsed_days,
            timeout_secs,
        } => {
            let strategy = read_strategy(&strategy)?;
            let simulator = MonteCarloSimulator::new(config.monte_carlo.clone())?;
            let request = MonteCarloRequest::new(simulations, seed)
                .with_iv_shift(iv_shift)
                .with_elapsed_days(elapsed_days);
            let cancel = timeout_secs
                .map(|secs| Cancellation::with_timeout(std::time::Duration::from_secs(secs)));
            let report = simulator.run_request(&strategy, &request, cancel.as_ref())?;
            print_json(&report)
        }

        Commands::Conflicts {
            strategies,
            correlation,
        } => {
            let strategies = read_strategies(&strategies)?;
            let matrix = read_matrix(correlation.as_deref(), strategies.len())?;
            let conflicts = detect_conflicts(&strategies, &matrix, config.conflict_thresholds()?)?;
            print_json(&conflicts)
        }

        Commands::Hedges {
            strategies,
            correlation,
            budget,
        } => {
            let strategies = read_strategies(&strategies)?;
            let matrix = read_matrix(correlation.as_deref(), strategies.len())?;
            let conflicts = detect_conflicts(&strategies, &matrix, config.conflict_thresholds()?)?;
            let hedges = recommend(&strategies, &conflicts, budget, config.hedging()?)?;
            print_json(&json!({ "conflicts": conflicts, "hedges": hedges }))
        }
    }
}

fn scorer(config: &EngineConfig) -> Result<RiskScorer> {
    Ok(RiskScorer::new(config.risk_scoring()?.clone())?)
}

/// Portfolio Greeks, failing on the first rejected leg.
fn complete_greeks(strategy: &Strategy) -> Result<risk_engine::Greeks> {
    let aggregation = aggregate(&strategy.legs);
    if let Some(rejected) = aggregation.rejected_legs.first() {
        return Err(rejected.to_error().into());
    }
    Ok(aggregation.greeks)
}

fn read_strategy(path: &Path) -> Result<Strategy> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing strategy {}", path.display()))
}

fn read_strategies(paths: &[PathBuf]) -> Result<Vec<Strategy>> {
    paths.iter().map(|p| read_strategy(p)).collect()
}

fn read_matrix(path: Option<&Path>, n: usize) -> Result<Vec<Vec<Decimal>>> {
    let Some(path) = path else {
        return Ok((0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { Decimal::ONE } else { Decimal::ZERO })
                    .collect()
            })
            .collect());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing correlation matrix {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
